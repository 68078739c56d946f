use std::sync::Arc;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::domain::error::DomainError;
use crate::domain::ports::{ExternalIdentity, IdentityVerifier};

pub const GOOGLE_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

#[derive(Debug, Deserialize)]
struct GoogleClaims {
    sub: String,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

/// Verifies Google ID tokens (RS256) against Google's published JWKS.
///
/// The key set is cached and refetched once when a token names an unknown
/// `kid`, which covers Google's key rotation.
pub struct GoogleIdentityVerifier {
    http: reqwest::Client,
    jwks_url: Url,
    client_id: Option<String>,
    keys: ArcSwapOption<JwkSet>,
}

impl GoogleIdentityVerifier {
    /// `client_id` is the expected audience. Without it every token is rejected.
    pub fn new(http: reqwest::Client, jwks_url: Url, client_id: Option<String>) -> Self {
        Self {
            http,
            jwks_url,
            client_id: client_id.filter(|c| !c.trim().is_empty()),
            keys: ArcSwapOption::empty(),
        }
    }

    async fn fetch_keys(&self) -> Result<Arc<JwkSet>, DomainError> {
        debug!(url = %self.jwks_url, "Fetching Google signing keys");
        let set: JwkSet = self
            .http
            .get(self.jwks_url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| DomainError::upstream("google", e.to_string()))?
            .json()
            .await
            .map_err(|e| DomainError::upstream("google", format!("bad JWKS document: {e}")))?;

        let set = Arc::new(set);
        self.keys.store(Some(set.clone()));
        Ok(set)
    }

    async fn key_for(&self, kid: &str) -> Result<DecodingKey, DomainError> {
        let cached = self.keys.load_full();
        let jwk = match cached.as_ref().and_then(|set| set.find(kid).cloned()) {
            Some(jwk) => jwk,
            None => self
                .fetch_keys()
                .await?
                .find(kid)
                .cloned()
                .ok_or_else(|| DomainError::identity_rejected(format!("unknown key id {kid}")))?,
        };
        DecodingKey::from_jwk(&jwk)
            .map_err(|e| DomainError::identity_rejected(format!("unusable signing key: {e}")))
    }
}

#[async_trait]
impl IdentityVerifier for GoogleIdentityVerifier {
    async fn verify(&self, id_token: &str) -> Result<ExternalIdentity, DomainError> {
        let Some(client_id) = self.client_id.as_deref() else {
            warn!("Google sign-in attempted but no client id is configured");
            return Err(DomainError::identity_rejected("Google client id not configured"));
        };

        let header = decode_header(id_token)
            .map_err(|e| DomainError::identity_rejected(format!("malformed token: {e}")))?;
        if header.alg != Algorithm::RS256 {
            return Err(DomainError::identity_rejected(format!(
                "unexpected algorithm {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| DomainError::identity_rejected("token has no key id"))?;
        let key = self.key_for(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[client_id]);
        validation.set_issuer(&GOOGLE_ISSUERS);

        let claims = decode::<GoogleClaims>(id_token, &key, &validation)
            .map_err(|e| DomainError::identity_rejected(e.to_string()))?
            .claims;

        Ok(ExternalIdentity {
            subject: claims.sub,
            email: claims.email,
            name: claims.name,
            picture: claims.picture,
        })
    }
}
