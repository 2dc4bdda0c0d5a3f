//! The sync protocol behind `GET /api/fetchCloudResources`.
//!
//! A stored snapshot is served as-is unless the caller forces a refresh; a
//! miss or a forced refresh probes AWS and stores the result as the new
//! snapshot.

pub mod format;
pub mod locks;

pub use format::{ResourcesView, SyncResponse, format_snapshot};
pub use locks::SyncLocks;

use crate::cloud::{AwsCredentials, CloudConnector, ResourceAggregator};
use crate::store::InventoryStore;
use anyhow::Context;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::de::{self, Deserializer, Unexpected};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Query parameters of a sync. `account_id` is only echoed back.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SyncRequest {
    pub cluster_name: String,
    pub account_id: String,
    pub region: String,
    #[serde(default, deserialize_with = "flag")]
    pub force_refresh: bool,
}

/// Query-string booleans as browsers and scripts send them: `true`/`false`,
/// `1`/`0`, `yes`/`no`, `on`/`off`, `t`/`f`, `y`/`n`, any case.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let raw = String::deserialize(deserializer)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "t" | "y" => Ok(true),
        "false" | "0" | "no" | "off" | "f" | "n" => Ok(false),
        _ => Err(de::Error::invalid_value(Unexpected::Str(&raw), &"a boolean")),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("AWS credentials not configured")]
    MissingCredentials,

    #[error("Cluster not found in database")]
    ClusterNotFound(String),

    /// Probing or persisting failed; nothing from this attempt was stored.
    #[error("{0}")]
    ScanFailed(String),

    #[error("inventory error: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl IntoResponse for SyncError {
    fn into_response(self) -> Response {
        let status = match &self {
            SyncError::ClusterNotFound(_) => StatusCode::NOT_FOUND,
            SyncError::MissingCredentials | SyncError::ScanFailed(_) | SyncError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = serde_json::json!({ "detail": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

pub struct SnapshotReconciler {
    store: Arc<dyn InventoryStore>,
    connector: Arc<dyn CloudConnector>,
    locks: SyncLocks,
    sync_timeout: Duration,
}

impl SnapshotReconciler {
    pub fn new(
        store: Arc<dyn InventoryStore>,
        connector: Arc<dyn CloudConnector>,
        sync_timeout: Duration,
    ) -> Self {
        Self {
            store,
            connector,
            locks: SyncLocks::new(),
            sync_timeout,
        }
    }

    /// Serve the stored snapshot for the cluster, or probe and store a new one.
    ///
    /// Refreshes of one cluster are serialized; a forced refresh that waited
    /// on another still replaces the snapshot that one wrote.
    pub async fn sync(
        &self,
        request: &SyncRequest,
        credentials: Option<AwsCredentials>,
    ) -> Result<SyncResponse, SyncError> {
        let credentials = credentials.ok_or(SyncError::MissingCredentials)?;
        let SyncRequest {
            cluster_name,
            account_id,
            region,
            force_refresh,
        } = request;

        let _guard = self.locks.acquire(cluster_name).await;

        let env = self
            .store
            .find_environment_by_cluster(cluster_name)
            .await?
            .ok_or_else(|| SyncError::ClusterNotFound(cluster_name.clone()))?;

        if let Some(snapshot) = self.store.get_snapshot(env.id).await? {
            if !force_refresh {
                debug!("📦 serving stored snapshot for {cluster_name}");
                return Ok(format_snapshot(cluster_name, account_id, region, snapshot));
            }
            self.store.delete_snapshot(env.id).await?;
            info!("🗑️ dropped snapshot {} for {cluster_name}", snapshot.id);
        }

        let data_store = self.store.get_data_store(env.id).await?.unwrap_or_default();

        // The deadline covers the cloud side only; the write runs to completion.
        let scan = async {
            let api = self
                .connector
                .connect(&credentials, region)
                .await
                .context("connecting to AWS")?;
            let resources = ResourceAggregator::new(api, region.clone())
                .collect(
                    cluster_name,
                    data_store.rds_endpoint.as_deref(),
                    data_store.es_endpoint.as_deref(),
                    None,
                )
                .await;
            anyhow::Ok(resources)
        };

        let resources = match tokio::time::timeout(self.sync_timeout, scan).await {
            Ok(Ok(resources)) => resources,
            Ok(Err(e)) => return Err(scan_failed(cluster_name, e)),
            Err(_) => {
                warn!("⏱️ scan of {cluster_name} timed out");
                return Err(SyncError::ScanFailed(format!(
                    "Scan failed: timed out after {:?}",
                    self.sync_timeout
                )));
            }
        };

        let snapshot = self
            .store
            .insert_snapshot(env.id, &resources)
            .await
            .map_err(|e| scan_failed(cluster_name, e))?;

        info!("✅ stored snapshot {} for {cluster_name}", snapshot.id);
        Ok(format_snapshot(cluster_name, account_id, region, snapshot))
    }
}

fn scan_failed(cluster_name: &str, e: anyhow::Error) -> SyncError {
    error!("❌ scan of {cluster_name} failed: {e:#}");
    SyncError::ScanFailed(format!("Scan failed: {e:#}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request_with(force_refresh: serde_json::Value) -> serde_json::Result<SyncRequest> {
        serde_json::from_value(json!({
            "cluster_name": "acme-prod-eks",
            "account_id": "123456789012",
            "region": "us-east-1",
            "force_refresh": force_refresh
        }))
    }

    #[test]
    fn test_force_refresh_accepts_common_spellings() {
        for truthy in ["true", "True", "1", "yes", "ON", "t", "y"] {
            assert!(request_with(json!(truthy)).unwrap().force_refresh, "{truthy}");
        }
        for falsy in ["false", "FALSE", "0", "no", "off", "f", "n"] {
            assert!(!request_with(json!(falsy)).unwrap().force_refresh, "{falsy}");
        }
        assert!(request_with(json!("maybe")).is_err());
    }

    #[test]
    fn test_force_refresh_defaults_to_false() {
        let request: SyncRequest = serde_json::from_value(json!({
            "cluster_name": "acme-prod-eks",
            "account_id": "123456789012",
            "region": "us-east-1"
        }))
        .unwrap();
        assert!(!request.force_refresh);
    }
}
