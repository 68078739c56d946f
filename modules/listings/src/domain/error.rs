use thiserror::Error;
use uuid::Uuid;

use crate::contract::model::{MAX_RATING, MIN_RATING};

/// Failures the listings service can report. Each maps to one HTTP status.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Listing not found")]
    ListingNotFound { id: Uuid },

    #[error("Review not found")]
    ReviewNotFound { id: Uuid },

    #[error("User not found")]
    UserNotFound { id: Uuid },

    #[error("Username already exists")]
    UsernameTaken { username: String },

    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Missing, malformed or expired bearer token. `reason` is for logs only.
    #[error("Not authorized to access this route")]
    Unauthenticated { reason: String },

    #[error("Google authentication failed")]
    IdentityRejected { reason: String },

    #[error("{message}")]
    Forbidden { message: String },

    #[error("Rating must be between {} and {}", MIN_RATING, MAX_RATING)]
    RatingOutOfRange { rating: i32 },

    #[error("{message}")]
    Validation { field: String, message: String },

    #[error("Upstream {service} error: {message}")]
    Upstream { service: String, message: String },

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn listing_not_found(id: Uuid) -> Self {
        Self::ListingNotFound { id }
    }

    pub fn review_not_found(id: Uuid) -> Self {
        Self::ReviewNotFound { id }
    }

    pub fn user_not_found(id: Uuid) -> Self {
        Self::UserNotFound { id }
    }

    pub fn username_taken(username: impl Into<String>) -> Self {
        Self::UsernameTaken {
            username: username.into(),
        }
    }

    pub fn unauthenticated(reason: impl Into<String>) -> Self {
        Self::Unauthenticated {
            reason: reason.into(),
        }
    }

    pub fn identity_rejected(reason: impl Into<String>) -> Self {
        Self::IdentityRejected {
            reason: reason.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn rating_out_of_range(rating: i32) -> Self {
        Self::RatingOutOfRange { rating }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn upstream(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
