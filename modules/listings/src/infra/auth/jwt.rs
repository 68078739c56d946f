use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::ports::TokenIssuer;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// HS256 bearer tokens carrying the user id in `sub`.
pub struct JwtTokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtTokenIssuer {
    pub fn new(secret: &str, ttl: Duration) -> anyhow::Result<Self> {
        if secret.trim().is_empty() {
            anyhow::bail!("JWT secret must not be empty");
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            ttl,
        })
    }
}

impl TokenIssuer for JwtTokenIssuer {
    fn issue(&self, user_id: Uuid) -> Result<String, DomainError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| DomainError::internal(format!("token signing failed: {e}")))
    }

    fn verify(&self, token: &str) -> Result<Uuid, DomainError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| DomainError::unauthenticated(e.to_string()))?;
        Uuid::parse_str(&data.claims.sub)
            .map_err(|e| DomainError::unauthenticated(format!("bad subject: {e}")))
    }
}
