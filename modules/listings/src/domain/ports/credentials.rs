use uuid::Uuid;

use crate::domain::error::DomainError;

/// One-way password hashing. Blocking; the service runs it off the async runtime.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, DomainError>;
    /// `Ok(false)` on mismatch, `Err` only for a corrupt stored hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, DomainError>;
}

/// Issues and checks the bearer tokens handed to clients.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, user_id: Uuid) -> Result<String, DomainError>;
    /// Returns the user id the token was issued for.
    fn verify(&self, token: &str) -> Result<Uuid, DomainError>;
}
