use std::sync::Arc;

use api_ingress::AppError;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::debug;

use crate::api::rest::error::map_domain_error;
use crate::contract::model::User;
use crate::domain::error::DomainError;
use crate::domain::service::Service;

/// The authenticated caller, resolved from `Authorization: Bearer <token>`.
pub struct AuthUser(pub User);

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let svc = parts
            .extensions
            .get::<Arc<Service>>()
            .cloned()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("listings service not installed")))?;

        let Some(token) = bearer_token(parts) else {
            debug!("Request without bearer token");
            return Err(map_domain_error(DomainError::unauthenticated("missing token")));
        };

        let user = svc.authenticate(token).await.map_err(map_domain_error)?;
        Ok(AuthUser(user))
    }
}
