use api_ingress::AppError;

use crate::domain::error::DomainError;

/// Map domain errors to the HTTP error surface.
pub fn map_domain_error(e: DomainError) -> AppError {
    let message = e.to_string();
    match e {
        DomainError::ListingNotFound { .. }
        | DomainError::ReviewNotFound { .. }
        | DomainError::UserNotFound { .. } => AppError::NotFound(message),
        DomainError::UsernameTaken { .. } => AppError::Conflict(message),
        DomainError::InvalidCredentials
        | DomainError::Unauthenticated { .. }
        | DomainError::IdentityRejected { .. } => AppError::Unauthorized(message),
        DomainError::Forbidden { .. } => AppError::Forbidden(message),
        DomainError::RatingOutOfRange { .. } | DomainError::Validation { .. } => {
            AppError::BadRequest(message)
        }
        DomainError::Upstream { .. } | DomainError::Database { .. } | DomainError::Internal { .. } => {
            AppError::Internal(anyhow::Error::new(e))
        }
    }
}
