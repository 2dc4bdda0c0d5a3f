use anyhow::{Context, Result};
use async_trait::async_trait;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::jwk::JwkSet;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Where published signing keys come from.
#[async_trait]
pub trait KeySource: Send + Sync {
    async fn fetch(&self) -> Result<JwkSet>;
}

/// Fetches a JWKS document over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpKeySource {
    client: reqwest::Client,
    url: String,
}

impl HttpKeySource {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("building JWKS client")?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl KeySource for HttpKeySource {
    async fn fetch(&self) -> Result<JwkSet> {
        debug!("🔑 fetching signing keys from {}", self.url);
        let set = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("fetching {}", self.url))?
            .error_for_status()?
            .json::<JwkSet>()
            .await
            .context("decoding JWKS")?;
        Ok(set)
    }
}

struct CachedKeys {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Instant,
}

/// Unknown key ids trigger at most one refetch per this interval.
const MIN_REFETCH_INTERVAL: Duration = Duration::from_secs(30);

/// Signing keys by key id, trusted for `ttl`. A lookup refetches when the
/// cache is stale, or when it does not know the key id and the keys are older
/// than [`MIN_REFETCH_INTERVAL`].
pub struct KeyCache {
    source: Arc<dyn KeySource>,
    ttl: Duration,
    min_refetch: Duration,
    cached: RwLock<Option<CachedKeys>>,
}

impl KeyCache {
    pub fn new(source: Arc<dyn KeySource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            min_refetch: MIN_REFETCH_INTERVAL,
            cached: RwLock::new(None),
        }
    }

    pub async fn key(&self, kid: &str) -> Result<Option<DecodingKey>> {
        {
            let cached = self.cached.read().await;
            if let Some(c) = cached.as_ref() {
                let age = c.fetched_at.elapsed();
                if age < self.ttl {
                    if let Some(key) = c.keys.get(kid) {
                        return Ok(Some(key.clone()));
                    }
                    if age < self.min_refetch {
                        debug!("🔑 unknown key id {kid}; keys are {age:?} old, not refetching");
                        return Ok(None);
                    }
                }
            }
        }

        let keys = self.refresh().await?;
        Ok(keys.get(kid).cloned())
    }

    async fn refresh(&self) -> Result<HashMap<String, DecodingKey>> {
        let set = self.source.fetch().await?;

        let mut keys = HashMap::new();
        for jwk in &set.keys {
            let Some(kid) = jwk.common.key_id.clone() else {
                continue;
            };
            match DecodingKey::from_jwk(jwk) {
                Ok(key) => {
                    keys.insert(kid, key);
                }
                Err(e) => warn!("⚠️ skipping unusable signing key {kid}: {e}"),
            }
        }

        *self.cached.write().await = Some(CachedKeys {
            keys: keys.clone(),
            fetched_at: Instant::now(),
        });
        Ok(keys)
    }
}
