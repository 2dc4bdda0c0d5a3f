//! An in-process [`CloudApi`] that answers from canned descriptions and
//! records every call it receives. Anything not scripted fails the way a
//! provider "not found" would.

use super::{
    AwsCredentials, CloudApi, CloudConnector, ClusterDescription, Datapoint,
    DbInstanceDescription, MetricQuery, NatGatewayDescription, NodeGroupDescription,
    SearchDomainDescription,
};
use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Default)]
pub struct ScriptedCloud {
    clusters: HashMap<String, ClusterDescription>,
    node_groups: HashMap<String, Vec<(String, NodeGroupDescription)>>,
    failing_node_group_listings: Vec<String>,
    nat_gateways: HashMap<String, Vec<NatGatewayDescription>>,
    failing_nat_lookups: Vec<String>,
    db_instances: HashMap<String, DbInstanceDescription>,
    metrics: HashMap<String, Vec<Datapoint>>,
    search_domains: HashMap<String, SearchDomainDescription>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cluster(mut self, name: &str, description: ClusterDescription) -> Self {
        self.clusters.insert(name.to_string(), description);
        self
    }

    pub fn with_node_group(
        mut self,
        cluster_name: &str,
        node_group: &str,
        description: NodeGroupDescription,
    ) -> Self {
        self.node_groups
            .entry(cluster_name.to_string())
            .or_default()
            .push((node_group.to_string(), description));
        self
    }

    pub fn failing_node_group_listing(mut self, cluster_name: &str) -> Self {
        self.failing_node_group_listings
            .push(cluster_name.to_string());
        self
    }

    pub fn with_nat_gateways(mut self, vpc_id: &str, gateways: Vec<NatGatewayDescription>) -> Self {
        self.nat_gateways.insert(vpc_id.to_string(), gateways);
        self
    }

    pub fn failing_nat_lookup(mut self, vpc_id: &str) -> Self {
        self.failing_nat_lookups.push(vpc_id.to_string());
        self
    }

    pub fn with_db_instance(mut self, identifier: &str, description: DbInstanceDescription) -> Self {
        self.db_instances.insert(identifier.to_string(), description);
        self
    }

    /// Datapoints returned for a metric name, regardless of dimensions.
    pub fn with_metric(mut self, metric_name: &str, datapoints: Vec<Datapoint>) -> Self {
        self.metrics.insert(metric_name.to_string(), datapoints);
        self
    }

    pub fn with_search_domain(mut self, domain_name: &str, description: SearchDomainDescription) -> Self {
        self.search_domains
            .insert(domain_name.to_string(), description);
        self
    }

    /// Every call received so far, as `operation:argument`.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn record(&self, operation: &str, argument: &str) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(format!("{operation}:{argument}"));
    }
}

#[async_trait]
impl CloudApi for ScriptedCloud {
    async fn describe_cluster(&self, name: &str) -> Result<ClusterDescription> {
        self.record("describe_cluster", name);
        self.clusters
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow!("ResourceNotFoundException: No cluster found for name: {name}."))
    }

    async fn list_node_groups(&self, cluster_name: &str) -> Result<Vec<String>> {
        self.record("list_node_groups", cluster_name);
        if self
            .failing_node_group_listings
            .iter()
            .any(|c| c == cluster_name)
        {
            bail!("AccessDeniedException: not authorized to list node groups");
        }
        Ok(self
            .node_groups
            .get(cluster_name)
            .map(|groups| groups.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default())
    }

    async fn describe_node_group(
        &self,
        cluster_name: &str,
        node_group: &str,
    ) -> Result<NodeGroupDescription> {
        self.record("describe_node_group", node_group);
        self.node_groups
            .get(cluster_name)
            .and_then(|groups| groups.iter().find(|(name, _)| name == node_group))
            .map(|(_, description)| description.clone())
            .ok_or_else(|| anyhow!("ResourceNotFoundException: No node group found for name: {node_group}."))
    }

    async fn describe_nat_gateways(&self, vpc_id: &str) -> Result<Vec<NatGatewayDescription>> {
        self.record("describe_nat_gateways", vpc_id);
        if self.failing_nat_lookups.iter().any(|v| v == vpc_id) {
            bail!("UnauthorizedOperation: ec2:DescribeNatGateways");
        }
        Ok(self.nat_gateways.get(vpc_id).cloned().unwrap_or_default())
    }

    async fn describe_db_instance(&self, identifier: &str) -> Result<DbInstanceDescription> {
        self.record("describe_db_instance", identifier);
        self.db_instances
            .get(identifier)
            .cloned()
            .ok_or_else(|| anyhow!("DBInstanceNotFound: DBInstance {identifier} not found."))
    }

    async fn get_metric_statistics(&self, query: &MetricQuery) -> Result<Vec<Datapoint>> {
        self.record("get_metric_statistics", &query.metric_name);
        Ok(self
            .metrics
            .get(&query.metric_name)
            .cloned()
            .unwrap_or_default())
    }

    async fn describe_search_domain(&self, domain_name: &str) -> Result<SearchDomainDescription> {
        self.record("describe_search_domain", domain_name);
        self.search_domains
            .get(domain_name)
            .cloned()
            .ok_or_else(|| anyhow!("ResourceNotFoundException: Domain not found: {domain_name}"))
    }
}

/// Hands out the same [`ScriptedCloud`] for every credential set and region,
/// counting connections.
#[derive(Debug, Clone)]
pub struct ScriptedConnector {
    cloud: Arc<ScriptedCloud>,
    connections: Arc<Mutex<Vec<String>>>,
}

impl ScriptedConnector {
    pub fn new(cloud: Arc<ScriptedCloud>) -> Self {
        Self {
            cloud,
            connections: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Regions connected to so far.
    pub fn connections(&self) -> Vec<String> {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl CloudConnector for ScriptedConnector {
    async fn connect(
        &self,
        _credentials: &AwsCredentials,
        region: &str,
    ) -> Result<Arc<dyn CloudApi>> {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(region.to_string());
        let api: Arc<dyn CloudApi> = self.cloud.clone();
        Ok(api)
    }
}
