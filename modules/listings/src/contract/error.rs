use thiserror::Error;

/// Errors that are safe to expose to other modules
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ListingsError {
    #[error("{message}")]
    Validation { message: String },

    #[error("{message}")]
    Unauthorized { message: String },

    #[error("{message}")]
    Forbidden { message: String },

    #[error("{message}")]
    NotFound { message: String },

    #[error("{message}")]
    Conflict { message: String },

    #[error("Internal error")]
    Internal,
}

impl ListingsError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn internal() -> Self {
        Self::Internal
    }
}

impl From<crate::domain::error::DomainError> for ListingsError {
    fn from(domain_error: crate::domain::error::DomainError) -> Self {
        use crate::domain::error::DomainError::*;
        let message = domain_error.to_string();
        match domain_error {
            ListingNotFound { .. } | ReviewNotFound { .. } | UserNotFound { .. } => {
                Self::not_found(message)
            }
            UsernameTaken { .. } => Self::conflict(message),
            InvalidCredentials | Unauthenticated { .. } | IdentityRejected { .. } => {
                Self::unauthorized(message)
            }
            Forbidden { .. } => Self::forbidden(message),
            RatingOutOfRange { .. } | Validation { .. } => Self::validation(message),
            Upstream { .. } | Database { .. } | Internal { .. } => Self::internal(),
        }
    }
}
