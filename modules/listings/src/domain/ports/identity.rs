use async_trait::async_trait;

use crate::domain::error::DomainError;

/// Claims taken from a verified external ID token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    pub subject: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Verifies ID tokens minted by an external identity provider.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> Result<ExternalIdentity, DomainError>;
}
