use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A named, independently scaled pool of nodes within a cluster.
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize, PartialEq)]
pub struct NodeGroup {
    pub name: String,
    pub instance_types: Vec<String>,
    pub desired_size: i32,
    pub min_size: i32,
    pub max_size: i32,
    pub status: Option<String>,
}

/// Live orchestrator state for one cluster.
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize, PartialEq)]
pub struct ClusterDetail {
    pub name: String,
    pub status: Option<String>,
    pub kubernetes_version: Option<String>,
    pub endpoint: Option<String>,
    pub arn: Option<String>,
    pub vpc_id: Option<String>,
    pub subnet_ids: Vec<String>,
    pub nat_gateway_ips: Vec<String>,
    pub total_nodes: i32,
    #[sqlx(skip)]
    pub node_groups: Vec<NodeGroup>,
}

/// Recent CloudWatch readings for a database. CPU and free storage stay
/// `None` when no datapoints exist; a missing connection count reads as 0.
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize, PartialEq)]
pub struct DatabasePerformance {
    pub cpu_percent: Option<f64>,
    pub free_storage_gb: Option<f64>,
    pub connections: i64,
}

/// Live managed-database state.
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize, PartialEq)]
pub struct DatabaseDetail {
    pub identifier: String,
    pub endpoint: Option<String>,
    pub status: Option<String>,
    pub engine: Option<String>,
    pub engine_version: Option<String>,
    pub instance_class: Option<String>,
    pub allocated_storage_gb: i32,
    pub multi_az: bool,
    pub storage_encrypted: bool,
    #[sqlx(flatten)]
    pub performance: DatabasePerformance,
}

/// Live search-domain state.
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize, PartialEq)]
pub struct SearchDomainDetail {
    pub domain_name: String,
    pub status: String,
    pub version: Option<String>,
    pub endpoint: Option<String>,
    pub instance_type: Option<String>,
    pub instance_count: Option<i32>,
    pub volume_size_gb: i32,
}

/// The `aws_resources` row itself.
#[derive(Debug, Clone, FromRow, PartialEq)]
pub struct AwsResourceRow {
    pub id: i32,
    pub env_id: i32,
    pub last_synced: DateTime<Utc>,
}

/// An `eks_clusters` row with its id kept for the node-group lookup.
#[derive(Debug, Clone, FromRow)]
pub struct EksClusterRow {
    pub id: i32,
    #[sqlx(flatten)]
    pub detail: ClusterDetail,
}

/// The persisted snapshot of one environment's live AWS resources, with all
/// of its children loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct AwsResourceSnapshot {
    pub id: i32,
    pub env_id: i32,
    pub last_synced: DateTime<Utc>,
    pub eks: Option<ClusterDetail>,
    pub rds: Option<DatabaseDetail>,
    pub elasticsearch: Option<SearchDomainDetail>,
}
