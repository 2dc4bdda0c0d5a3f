#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use stack_catalogue::cloud::scripted::{ScriptedCloud, ScriptedConnector};
use stack_catalogue::cloud::{
    AwsCredentials, ClusterDescription, DbInstanceDescription, NodeGroupDescription,
    SearchDomainDescription,
};
use stack_catalogue::models::environments::{ClusterConfig, DataStoreConfig, DeclaredEnvironment};
use stack_catalogue::reconciler::{SnapshotReconciler, SyncRequest};
use stack_catalogue::store::{InventoryStore, MemoryInventory};

pub const CLUSTER: &str = "acme-prod-eks";
pub const RDS_ENDPOINT: &str = "acme-prod-db.abcdef123456.us-east-1.rds.amazonaws.com";
pub const ES_ENDPOINT: &str = "vpc-acme-logs-x1y2z3.us-east-1.es.amazonaws.com";

pub fn credentials() -> AwsCredentials {
    AwsCredentials {
        access_key_id: "AKIAEXAMPLE".to_string(),
        secret_access_key: "secret".to_string(),
        session_token: "token".to_string(),
    }
}

pub fn request(cluster_name: &str, force_refresh: bool) -> SyncRequest {
    SyncRequest {
        cluster_name: cluster_name.to_string(),
        account_id: "123456789012".to_string(),
        region: "us-east-1".to_string(),
        force_refresh,
    }
}

pub async fn seed_environment(
    store: &dyn InventoryStore,
    slug: &str,
    cluster_name: &str,
    data_store: DataStoreConfig,
) -> i32 {
    store
        .upsert_environment(&DeclaredEnvironment {
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
            data_store,
            ..Default::default()
        })
        .await
        .unwrap()
}

pub fn declared_data_stores() -> DataStoreConfig {
    DataStoreConfig {
        rds_endpoint: Some(RDS_ENDPOINT.to_string()),
        es_endpoint: Some(ES_ENDPOINT.to_string()),
        ..Default::default()
    }
}

fn node_group(desired: i32) -> NodeGroupDescription {
    NodeGroupDescription {
        instance_types: vec!["m5.xlarge".to_string()],
        desired_size: Some(desired),
        min_size: Some(1),
        max_size: Some(10),
        status: Some("ACTIVE".to_string()),
    }
}

/// A cluster with three node groups, its database and its search domain.
pub fn healthy_cloud() -> ScriptedCloud {
    ScriptedCloud::new()
        .with_cluster(
            CLUSTER,
            ClusterDescription {
                status: Some("ACTIVE".to_string()),
                version: Some("1.29".to_string()),
                vpc_id: Some("vpc-0abc".to_string()),
                ..Default::default()
            },
        )
        .with_node_group(CLUSTER, "system", node_group(2))
        .with_node_group(CLUSTER, "workers", node_group(3))
        .with_node_group(CLUSTER, "batch", node_group(5))
        .with_db_instance(
            "acme-prod-db",
            DbInstanceDescription {
                status: Some("available".to_string()),
                engine: Some("postgres".to_string()),
                ..Default::default()
            },
        )
        .with_search_domain(
            "acme-logs",
            SearchDomainDescription {
                processing: Some(false),
                ..Default::default()
            },
        )
}

pub fn reconciler(
    store: Arc<dyn InventoryStore>,
    cloud: Arc<ScriptedCloud>,
) -> SnapshotReconciler {
    SnapshotReconciler::new(
        store,
        Arc::new(ScriptedConnector::new(cloud)),
        Duration::from_secs(5),
    )
}

pub fn memory_store() -> Arc<MemoryInventory> {
    Arc::new(MemoryInventory::new())
}
