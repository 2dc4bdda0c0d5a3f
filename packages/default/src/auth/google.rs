use super::keys::{HttpKeySource, KeyCache, KeySource};
use super::{AuthError, IdentityVerifier, VerifiedUser};
use crate::models::config::AuthConfig;
use anyhow::Result;
use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, Validation, decode, decode_header};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

const INVALID_CREDENTIALS: &str = "Could not validate credentials";

/// Verifies Google-issued RS256 ID tokens for one OAuth client.
pub struct GoogleTokenVerifier {
    client_id: String,
    issuers: Vec<String>,
    allowed_domain: String,
    keys: KeyCache,
}

impl GoogleTokenVerifier {
    pub fn new(config: &AuthConfig) -> Result<Self> {
        let source = HttpKeySource::new(&config.jwks_url)?;
        Ok(Self::with_key_source(config, Arc::new(source)))
    }

    pub fn with_key_source(config: &AuthConfig, source: Arc<dyn KeySource>) -> Self {
        Self {
            client_id: config.client_id.clone(),
            issuers: config.issuers.clone(),
            allowed_domain: config.allowed_email_domain.clone(),
            keys: KeyCache::new(source, config.key_cache_ttl),
        }
    }
}

fn map_jwt_error(e: jsonwebtoken::errors::Error) -> AuthError {
    let message = match e.kind() {
        ErrorKind::ExpiredSignature => "Token has expired",
        ErrorKind::InvalidAudience
        | ErrorKind::InvalidIssuer
        | ErrorKind::ImmatureSignature
        | ErrorKind::MissingRequiredClaim(_) => "Incorrect claims, check audience/issuer",
        _ => INVALID_CREDENTIALS,
    };
    debug!("🔒 token rejected: {e}");
    AuthError::Unauthorized(message.to_string())
}

/// Issuer and email-domain policy over already signature-checked claims.
pub fn check_claims(
    claims: Value,
    issuers: &[String],
    allowed_domain: &str,
) -> Result<VerifiedUser, AuthError> {
    let issuer = claims.get("iss").and_then(Value::as_str).unwrap_or_default();
    if !issuers.iter().any(|i| i == issuer) {
        return Err(AuthError::Unauthorized("Invalid issuer".to_string()));
    }

    let suffix = format!("@{allowed_domain}");
    let email = match claims.get("email").and_then(Value::as_str) {
        Some(email) if email.ends_with(&suffix) => email.to_string(),
        _ => {
            return Err(AuthError::Forbidden(format!(
                "Invalid domain: {suffix} only"
            )));
        }
    };

    Ok(VerifiedUser { email, claims })
}

#[async_trait]
impl IdentityVerifier for GoogleTokenVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedUser, AuthError> {
        let header = decode_header(token).map_err(map_jwt_error)?;
        let kid = header
            .kid
            .ok_or_else(|| AuthError::Unauthorized("Unable to find appropriate key".to_string()))?;

        let key = self
            .keys
            .key(&kid)
            .await
            .map_err(|e| {
                warn!("⚠️ signing keys unavailable: {e:#}");
                AuthError::Unauthorized(INVALID_CREDENTIALS.to_string())
            })?
            .ok_or_else(|| AuthError::Unauthorized("Unable to find appropriate key".to_string()))?;

        // Issuer is checked by `check_claims`; Google signs with two spellings.
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.client_id]);
        validation.validate_exp = true;

        let data = decode::<Value>(token, &key, &validation).map_err(map_jwt_error)?;
        check_claims(data.claims, &self.issuers, &self.allowed_domain)
    }
}
