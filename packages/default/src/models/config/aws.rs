use serde::Deserialize;
use std::time::Duration;

/// Timeouts applied to outbound AWS calls.
///
/// Loaded from `[aws]`. Credentials are never read from here; they come from
/// the process environment on every sync request.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AwsConfig {
    /// Upper bound for a single SDK operation
    #[serde(with = "humantime_serde")]
    pub call_timeout: Duration,
    /// Upper bound for one whole scan of a cluster
    #[serde(with = "humantime_serde")]
    pub sync_timeout: Duration,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(5),
            sync_timeout: Duration::from_secs(30),
        }
    }
}
