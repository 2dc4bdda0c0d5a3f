use std::env;
use std::fmt;

/// Temporary AWS credentials used for one sync request.
#[derive(Clone, PartialEq)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .field("session_token", &"***")
            .finish()
    }
}

impl AwsCredentials {
    /// All three parts are required; any missing or empty part yields `None`.
    pub fn from_parts(
        access_key_id: Option<String>,
        secret_access_key: Option<String>,
        session_token: Option<String>,
    ) -> Option<Self> {
        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
        Some(Self {
            access_key_id: non_empty(access_key_id)?,
            secret_access_key: non_empty(secret_access_key)?,
            session_token: non_empty(session_token)?,
        })
    }
}

/// Where sync requests get their AWS credentials from.
pub trait CredentialSource: Send + Sync {
    fn credentials(&self) -> Option<AwsCredentials>;
}

/// Reads `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and `AWS_SESSION_TOKEN`
/// from the process environment on every call, so rotated session tokens
/// are picked up without a restart.
#[derive(Debug, Clone, Default)]
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn credentials(&self) -> Option<AwsCredentials> {
        AwsCredentials::from_parts(
            env::var("AWS_ACCESS_KEY_ID").ok(),
            env::var("AWS_SECRET_ACCESS_KEY").ok(),
            env::var("AWS_SESSION_TOKEN").ok(),
        )
    }
}

/// A fixed credential set, or none at all.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials(pub Option<AwsCredentials>);

impl CredentialSource for StaticCredentials {
    fn credentials(&self) -> Option<AwsCredentials> {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_parts_required() {
        assert!(
            AwsCredentials::from_parts(
                Some("AKIA".to_string()),
                Some("secret".to_string()),
                None
            )
            .is_none()
        );
        assert!(
            AwsCredentials::from_parts(
                Some("AKIA".to_string()),
                Some(String::new()),
                Some("token".to_string())
            )
            .is_none()
        );

        let creds = AwsCredentials::from_parts(
            Some("AKIA".to_string()),
            Some("secret".to_string()),
            Some("token".to_string()),
        )
        .unwrap();
        assert_eq!(creds.access_key_id, "AKIA");
    }

    #[test]
    fn test_debug_masks_secrets() {
        let creds = AwsCredentials {
            access_key_id: "AKIA".to_string(),
            secret_access_key: "very-secret".to_string(),
            session_token: "session".to_string(),
        };
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("AKIA"));
        assert!(!rendered.contains("very-secret"));
        assert!(!rendered.contains("session\""));
    }
}
