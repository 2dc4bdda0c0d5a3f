use serde::Deserialize;
use std::time::Duration;

/// Bearer token verification settings.
///
/// Loaded from `[auth]`. `client_id` is the expected token audience and
/// `allowed_email_domain` is matched against the `email` claim.
#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub client_id: String,
    pub allowed_email_domain: String,
    #[serde(default = "default_issuers")]
    pub issuers: Vec<String>,
    #[serde(default = "default_jwks_url")]
    pub jwks_url: String,
    /// How long fetched signing keys are trusted before a refetch
    #[serde(default = "default_key_cache_ttl", with = "humantime_serde")]
    pub key_cache_ttl: Duration,
}

fn default_issuers() -> Vec<String> {
    vec![
        "https://accounts.google.com".to_string(),
        "accounts.google.com".to_string(),
    ]
}

fn default_jwks_url() -> String {
    "https://www.googleapis.com/oauth2/v3/certs".to_string()
}

fn default_key_cache_ttl() -> Duration {
    Duration::from_secs(3600)
}
