use super::{InventoryStats, InventoryStore};
use crate::cloud::ClusterResources;
use crate::models::aws_resources::{
    AwsResourceRow, AwsResourceSnapshot, ClusterDetail, DatabaseDetail, SearchDomainDetail,
};
use crate::models::azure_subscriptions::AzureSubscription;
use crate::models::environments::{
    ApplicationConfig, ClusterConfig, DataStoreConfig, DeclaredEnvironment, Environment,
    Infrastructure,
};
use anyhow::{Result, bail};
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Row arenas keyed by owner id, mirroring the relational layout.
#[derive(Debug, Default)]
struct Arena {
    next_id: i32,
    environments: Vec<Environment>,
    infrastructure: Vec<(i32, Infrastructure)>,
    clusters: Vec<(i32, ClusterConfig)>,
    data_stores: Vec<(i32, DataStoreConfig)>,
    applications: Vec<(i32, ApplicationConfig)>,
    snapshots: Vec<AwsResourceRow>,
    eks: Vec<(i32, ClusterDetail)>,
    rds: Vec<(i32, DatabaseDetail)>,
    elasticsearch: Vec<(i32, SearchDomainDetail)>,
    azure_subscriptions: Vec<AzureSubscription>,
}

fn owned_by<T: Clone>(rows: &[(i32, T)], owner: i32) -> Option<T> {
    rows.iter()
        .find(|(id, _)| *id == owner)
        .map(|(_, row)| row.clone())
}

impl Arena {
    fn allocate_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn snapshot(&self, env_id: i32) -> Option<AwsResourceSnapshot> {
        let row = self.snapshots.iter().find(|s| s.env_id == env_id)?;
        Some(AwsResourceSnapshot {
            id: row.id,
            env_id: row.env_id,
            last_synced: row.last_synced,
            eks: owned_by(&self.eks, row.id),
            rds: owned_by(&self.rds, row.id),
            elasticsearch: owned_by(&self.elasticsearch, row.id),
        })
    }

    fn remove_snapshot(&mut self, env_id: i32) -> bool {
        let Some(pos) = self.snapshots.iter().position(|s| s.env_id == env_id) else {
            return false;
        };
        let row = self.snapshots.remove(pos);
        self.eks.retain(|(owner, _)| *owner != row.id);
        self.rds.retain(|(owner, _)| *owner != row.id);
        self.elasticsearch.retain(|(owner, _)| *owner != row.id);
        true
    }
}

/// In-process inventory. Each write builds its rows first and applies them
/// under one lock, so readers never observe a partial snapshot.
#[derive(Debug, Default)]
pub struct MemoryInventory {
    arena: Mutex<Arena>,
}

impl MemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    fn arena(&self) -> MutexGuard<'_, Arena> {
        self.arena.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Declared cluster config of an environment.
    pub fn cluster_config(&self, env_id: i32) -> Option<ClusterConfig> {
        owned_by(&self.arena().clusters, env_id)
    }

    pub fn azure_subscriptions(&self) -> Vec<AzureSubscription> {
        self.arena().azure_subscriptions.clone()
    }

    /// Detail rows still present across every snapshot, as
    /// `(eks, rds, elasticsearch)` counts.
    pub fn detail_row_counts(&self) -> (usize, usize, usize) {
        let arena = self.arena();
        (arena.eks.len(), arena.rds.len(), arena.elasticsearch.len())
    }
}

#[async_trait]
impl InventoryStore for MemoryInventory {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn find_environment_by_cluster(&self, cluster_name: &str) -> Result<Option<Environment>> {
        let arena = self.arena();
        let env = arena
            .clusters
            .iter()
            .filter(|(_, c)| c.cluster_name == cluster_name)
            .filter_map(|(env_id, _)| arena.environments.iter().find(|e| e.id == *env_id))
            .min_by_key(|e| e.id)
            .cloned();
        Ok(env)
    }

    async fn get_data_store(&self, env_id: i32) -> Result<Option<DataStoreConfig>> {
        Ok(owned_by(&self.arena().data_stores, env_id))
    }

    async fn get_snapshot(&self, env_id: i32) -> Result<Option<AwsResourceSnapshot>> {
        Ok(self.arena().snapshot(env_id))
    }

    async fn delete_snapshot(&self, env_id: i32) -> Result<bool> {
        Ok(self.arena().remove_snapshot(env_id))
    }

    async fn insert_snapshot(
        &self,
        env_id: i32,
        resources: &ClusterResources,
    ) -> Result<AwsResourceSnapshot> {
        let mut arena = self.arena();
        if !arena.environments.iter().any(|e| e.id == env_id) {
            bail!("environment {env_id} does not exist");
        }
        if arena.snapshots.iter().any(|s| s.env_id == env_id) {
            bail!("duplicate key value violates unique constraint on aws_resources.env_id = {env_id}");
        }

        let row = AwsResourceRow {
            id: arena.allocate_id(),
            env_id,
            last_synced: resources.timestamp,
        };
        if let Ok(cluster) = &resources.eks {
            arena.eks.push((row.id, cluster.clone()));
        }
        if let Some(Ok(db)) = &resources.rds {
            arena.rds.push((row.id, db.clone()));
        }
        if let Some(Ok(domain)) = &resources.elasticsearch {
            arena.elasticsearch.push((row.id, domain.clone()));
        }
        arena.snapshots.push(row);

        match arena.snapshot(env_id) {
            Some(snapshot) => Ok(snapshot),
            None => bail!("snapshot vanished after insert"),
        }
    }

    async fn upsert_environment(&self, env: &DeclaredEnvironment) -> Result<i32> {
        let mut arena = self.arena();

        let existing = arena.environments.iter().position(|e| e.slug == env.slug);
        let id = match existing {
            Some(pos) => arena.environments[pos].id,
            None => arena.allocate_id(),
        };
        let row = Environment {
            id,
            slug: env.slug.clone(),
            customer_name: env.customer_name.clone(),
            environment: env.environment.clone(),
            env_type: env.env_type.clone(),
            cloud_platform: env.cloud_platform.clone(),
            account_id: env.account_id.clone(),
            region: env.region.clone(),
            created_at_git: env.created_at_git.clone(),
            updated_at_helm: env.updated_at_helm.clone(),
            web_url: env.web_url.clone(),
        };
        match existing {
            Some(pos) => arena.environments[pos] = row,
            None => arena.environments.push(row),
        }

        arena.infrastructure.retain(|(owner, _)| *owner != id);
        arena.clusters.retain(|(owner, _)| *owner != id);
        arena.data_stores.retain(|(owner, _)| *owner != id);
        arena.applications.retain(|(owner, _)| *owner != id);
        arena.infrastructure.push((id, env.infrastructure.clone()));
        arena.clusters.push((id, env.cluster.clone()));
        arena.data_stores.push((id, env.data_store.clone()));
        arena.applications.push((id, env.application.clone()));

        Ok(id)
    }

    async fn insert_azure_subscription_if_missing(&self, sub: &AzureSubscription) -> Result<bool> {
        let mut arena = self.arena();
        if arena.azure_subscriptions.iter().any(|s| s.id == sub.id) {
            return Ok(false);
        }
        arena.azure_subscriptions.push(sub.clone());
        Ok(true)
    }

    async fn stats(&self) -> Result<InventoryStats> {
        let arena = self.arena();
        Ok(InventoryStats {
            environments: i64::try_from(arena.environments.len())?,
            snapshots: i64::try_from(arena.snapshots.len())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::ProbeError;
    use chrono::Utc;

    fn declared(slug: &str, cluster_name: &str) -> DeclaredEnvironment {
        DeclaredEnvironment {
            slug: slug.to_string(),
            customer_name: "acme".to_string(),
            environment: "prod".to_string(),
            cloud_platform: "aws".to_string(),
            account_id: "123456789012".to_string(),
            region: "us-east-1".to_string(),
            cluster: ClusterConfig {
                cluster_name: cluster_name.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn resources(eks_ok: bool) -> ClusterResources {
        ClusterResources {
            cluster_name: "acme-prod".to_string(),
            region: "us-east-1".to_string(),
            timestamp: Utc::now(),
            eks: if eks_ok {
                Ok(ClusterDetail {
                    name: "acme-prod".to_string(),
                    ..Default::default()
                })
            } else {
                Err(ProbeError::new("boom"))
            },
            rds: Some(Ok(DatabaseDetail {
                identifier: "acme-db".to_string(),
                ..Default::default()
            })),
            elasticsearch: None,
        }
    }

    #[tokio::test]
    async fn test_upsert_overwrites_by_slug() {
        let store = MemoryInventory::new();
        let first = store
            .upsert_environment(&declared("ACME_PROD", "old-cluster"))
            .await
            .unwrap();
        let second = store
            .upsert_environment(&declared("ACME_PROD", "new-cluster"))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(store.stats().await.unwrap().environments, 1);
        assert!(
            store
                .find_environment_by_cluster("old-cluster")
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(
            store.cluster_config(first).unwrap().cluster_name,
            "new-cluster"
        );
    }

    #[tokio::test]
    async fn test_error_results_are_not_stored() {
        let store = MemoryInventory::new();
        let env_id = store
            .upsert_environment(&declared("ACME_PROD", "acme-prod"))
            .await
            .unwrap();

        let snapshot = store.insert_snapshot(env_id, &resources(false)).await.unwrap();
        assert!(snapshot.eks.is_none());
        assert_eq!(snapshot.rds.unwrap().identifier, "acme-db");
        assert!(snapshot.elasticsearch.is_none());
    }

    #[tokio::test]
    async fn test_delete_cascades_and_second_insert_is_rejected() {
        let store = MemoryInventory::new();
        let env_id = store
            .upsert_environment(&declared("ACME_PROD", "acme-prod"))
            .await
            .unwrap();

        store.insert_snapshot(env_id, &resources(true)).await.unwrap();
        assert!(store.insert_snapshot(env_id, &resources(true)).await.is_err());
        assert_eq!(store.detail_row_counts(), (1, 1, 0));

        assert!(store.delete_snapshot(env_id).await.unwrap());
        assert_eq!(store.detail_row_counts(), (0, 0, 0));
        assert!(store.get_snapshot(env_id).await.unwrap().is_none());
        assert!(!store.delete_snapshot(env_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_azure_subscription_insert_if_missing() {
        let store = MemoryInventory::new();
        let sub = AzureSubscription {
            id: "sub-1".to_string(),
            subscription_name: "Internal".to_string(),
            is_internal: true,
        };
        assert!(store.insert_azure_subscription_if_missing(&sub).await.unwrap());

        let renamed = AzureSubscription {
            subscription_name: "Renamed".to_string(),
            ..sub.clone()
        };
        assert!(!store.insert_azure_subscription_if_missing(&renamed).await.unwrap());
        assert_eq!(store.azure_subscriptions()[0].subscription_name, "Internal");
    }
}
