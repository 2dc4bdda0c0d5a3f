use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A customer environment as recorded by the bulk import.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Environment {
    pub id: i32,
    pub slug: String,
    pub customer_name: String,
    pub environment: String,
    pub env_type: Option<String>,
    pub cloud_platform: String,
    pub account_id: String,
    pub region: String,
    pub created_at_git: Option<String>,
    pub updated_at_helm: Option<String>,
    pub web_url: Option<String>,
}

/// Declared network topology for an environment.
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Infrastructure {
    pub vpc_id: Option<String>,
    pub vpc_cidr: Option<String>,
    pub subnet_app_1: Option<String>,
    pub subnet_app_2: Option<String>,
    pub subnet_app_3: Option<String>,
    pub instance_type: Option<String>,
    pub is_multi_az: bool,
    pub resource_group: Option<String>,
}

/// Declared (not live) cluster metadata. `cluster_name` is the key the
/// sync endpoint resolves environments by.
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize, PartialEq)]
pub struct ClusterConfig {
    pub cluster_name: String,
    pub helm_branch: Option<String>,
    pub dashboard_url: Option<String>,
    pub ingress_host: Option<String>,
    pub has_ingress: bool,
    pub has_autoscaler: bool,
}

/// Declared connection endpoints for the environment's data stores.
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize, PartialEq)]
pub struct DataStoreConfig {
    pub rds_endpoint: Option<String>,
    pub rds_class: Option<String>,
    pub es_endpoint: Option<String>,
    pub es_instance: Option<String>,
    pub redis_host: Option<String>,
    pub redis_cluster_id: Option<String>,
}

/// Declared workload sizing.
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize, PartialEq)]
pub struct ApplicationConfig {
    pub ecm_replicas: Option<i32>,
    pub ecm_cpu_limit: Option<String>,
    pub ecm_mem_limit: Option<String>,
    pub ecm_java_ops: Option<String>,
    pub userms_replicas: Option<i32>,
    pub ispm_enabled: bool,
    pub pam_enabled: bool,
    pub apm_enabled: bool,
    pub apm_url: Option<String>,
    pub log_bucket: Option<String>,
}

/// Everything one import row declares about an environment. Upserting it
/// overwrites the environment by slug and replaces all four declared configs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeclaredEnvironment {
    pub slug: String,
    pub customer_name: String,
    pub environment: String,
    pub env_type: Option<String>,
    pub cloud_platform: String,
    pub account_id: String,
    pub region: String,
    pub created_at_git: Option<String>,
    pub updated_at_helm: Option<String>,
    pub web_url: Option<String>,
    pub infrastructure: Infrastructure,
    pub cluster: ClusterConfig,
    pub data_store: DataStoreConfig,
    pub application: ApplicationConfig,
}
