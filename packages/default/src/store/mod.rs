//! Ownership of every inventory row.
//!
//! Environments own their declared configs and at most one live snapshot;
//! a snapshot owns its cluster, database and search-domain details, and the
//! cluster detail owns its node groups. Replacing a snapshot is always
//! delete-subtree then insert-subtree.

pub mod memory;
pub mod postgres;

pub use memory::MemoryInventory;
pub use postgres::PgInventory;

use crate::cloud::ClusterResources;
use crate::models::aws_resources::AwsResourceSnapshot;
use crate::models::azure_subscriptions::AzureSubscription;
use crate::models::environments::{DataStoreConfig, DeclaredEnvironment, Environment};
use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct InventoryStats {
    pub environments: i64,
    pub snapshots: i64,
}

#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Cheap reachability check.
    async fn ping(&self) -> Result<()>;

    async fn find_environment_by_cluster(&self, cluster_name: &str) -> Result<Option<Environment>>;

    async fn get_data_store(&self, env_id: i32) -> Result<Option<DataStoreConfig>>;

    async fn get_snapshot(&self, env_id: i32) -> Result<Option<AwsResourceSnapshot>>;

    /// Removes the snapshot and all of its children. Returns whether one
    /// existed.
    async fn delete_snapshot(&self, env_id: i32) -> Result<bool>;

    /// Persists a new snapshot stamped with the aggregate's timestamp.
    /// Sub-results that are errors are left out. All rows commit together or
    /// none do; an existing snapshot for `env_id` is an error.
    async fn insert_snapshot(
        &self,
        env_id: i32,
        resources: &ClusterResources,
    ) -> Result<AwsResourceSnapshot>;

    /// Inserts or overwrites the environment by slug and replaces its four
    /// declared configs, atomically. Returns the environment id.
    async fn upsert_environment(&self, env: &DeclaredEnvironment) -> Result<i32>;

    /// Returns whether the subscription was new.
    async fn insert_azure_subscription_if_missing(&self, sub: &AzureSubscription) -> Result<bool>;

    async fn stats(&self) -> Result<InventoryStats>;
}
