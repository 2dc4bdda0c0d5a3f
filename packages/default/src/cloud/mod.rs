//! Live AWS state for a cluster.
//!
//! Probes talk to the provider only through [`CloudApi`], which returns
//! provider-agnostic descriptions. [`aws::AwsConnector`] is the SDK-backed
//! implementation; tests script their own.

pub mod aggregator;
pub mod aws;
pub mod cluster;
pub mod credentials;
pub mod database;
pub mod metrics;
pub mod network;
#[cfg(any(test, feature = "test-util"))]
pub mod scripted;
pub mod search_domain;

pub use aggregator::{ClusterResources, ResourceAggregator};
pub use credentials::{AwsCredentials, CredentialSource, EnvCredentials};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Failure of a single probe, kept inline in the aggregate instead of
/// aborting sibling probes. Serializes as `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{error}")]
pub struct ProbeError {
    pub error: String,
}

impl ProbeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

impl From<anyhow::Error> for ProbeError {
    fn from(e: anyhow::Error) -> Self {
        // `{:#}` keeps the context chain on one line
        Self::new(format!("{e:#}"))
    }
}

pub type ProbeResult<T> = std::result::Result<T, ProbeError>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterDescription {
    pub status: Option<String>,
    pub version: Option<String>,
    pub endpoint: Option<String>,
    pub arn: Option<String>,
    pub vpc_id: Option<String>,
    pub subnet_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeGroupDescription {
    pub instance_types: Vec<String>,
    pub desired_size: Option<i32>,
    pub min_size: Option<i32>,
    pub max_size: Option<i32>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NatGatewayDescription {
    pub id: Option<String>,
    /// One entry per attached address; private-only addresses are `None`.
    pub public_ips: Vec<Option<String>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DbInstanceDescription {
    pub endpoint_address: Option<String>,
    pub status: Option<String>,
    pub engine: Option<String>,
    pub engine_version: Option<String>,
    pub instance_class: Option<String>,
    pub allocated_storage: Option<i32>,
    pub multi_az: Option<bool>,
    pub storage_encrypted: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchDomainDescription {
    pub processing: Option<bool>,
    pub version: Option<String>,
    pub endpoint: Option<String>,
    pub vpc_endpoint: Option<String>,
    pub instance_type: Option<String>,
    pub instance_count: Option<i32>,
    pub volume_size: Option<i32>,
}

/// One statistics request against the metrics backend.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricQuery {
    pub namespace: String,
    pub metric_name: String,
    pub dimensions: Vec<(String, String)>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub period_secs: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Datapoint {
    pub timestamp: DateTime<Utc>,
    pub average: Option<f64>,
}

/// The provider calls the probes are built from. Every method is a single
/// attempt; callers decide how failures degrade.
#[async_trait]
pub trait CloudApi: Send + Sync {
    async fn describe_cluster(&self, name: &str) -> Result<ClusterDescription>;

    async fn list_node_groups(&self, cluster_name: &str) -> Result<Vec<String>>;

    async fn describe_node_group(
        &self,
        cluster_name: &str,
        node_group: &str,
    ) -> Result<NodeGroupDescription>;

    /// Available NAT gateways in a VPC.
    async fn describe_nat_gateways(&self, vpc_id: &str) -> Result<Vec<NatGatewayDescription>>;

    async fn describe_db_instance(&self, identifier: &str) -> Result<DbInstanceDescription>;

    async fn get_metric_statistics(&self, query: &MetricQuery) -> Result<Vec<Datapoint>>;

    async fn describe_search_domain(&self, domain_name: &str) -> Result<SearchDomainDescription>;
}

/// Builds a [`CloudApi`] scoped to one set of credentials and one region.
#[async_trait]
pub trait CloudConnector: Send + Sync {
    async fn connect(&self, credentials: &AwsCredentials, region: &str)
    -> Result<Arc<dyn CloudApi>>;
}
