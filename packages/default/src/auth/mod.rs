//! Bearer-token identity for the API routes.

pub mod google;
pub mod keys;

pub use google::GoogleTokenVerifier;
pub use keys::{HttpKeySource, KeyCache, KeySource};

use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::sync::Arc;

/// A caller whose token verified and whose email is in the allowed domain.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VerifiedUser {
    pub email: String,
    /// Every verified claim, as decoded.
    pub claims: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AuthError {
    /// Missing, malformed, expired or unverifiable token.
    #[error("{0}")]
    Unauthorized(String),

    /// Valid token, but the identity is outside the allowed domain.
    #[error("{0}")]
    Forbidden(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = axum::Json(serde_json::json!({ "detail": self.to_string() }));
        match self {
            AuthError::Unauthorized(_) => (
                StatusCode::UNAUTHORIZED,
                [(WWW_AUTHENTICATE, "Bearer")],
                body,
            )
                .into_response(),
            AuthError::Forbidden(_) => (StatusCode::FORBIDDEN, body).into_response(),
        }
    }
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<VerifiedUser, AuthError>;
}

/// The token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let not_authenticated = || AuthError::Unauthorized("Not authenticated".to_string());
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(not_authenticated)?;
    let (scheme, token) = value.split_once(' ').ok_or_else(not_authenticated)?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return Err(not_authenticated());
    }
    Ok(token.trim())
}

/// Extractor for routes that require a verified caller.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub VerifiedUser);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<dyn IdentityVerifier>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let verifier = <Arc<dyn IdentityVerifier> as FromRef<S>>::from_ref(state);
        let user = verifier.verify(token).await?;
        Ok(AuthenticatedUser(user))
    }
}
