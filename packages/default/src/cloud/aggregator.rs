use super::cluster::probe_cluster;
use super::database::probe_database;
use super::search_domain::probe_search_domain;
use super::{CloudApi, ProbeResult};
use crate::models::aws_resources::{ClusterDetail, DatabaseDetail, SearchDomainDetail};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

/// Everything probed for one cluster in one pass. Sub-resources that were not
/// declared are `None`; probed ones carry their own success or failure.
#[derive(Debug, Clone)]
pub struct ClusterResources {
    pub cluster_name: String,
    pub region: String,
    /// Taken before any probe runs.
    pub timestamp: DateTime<Utc>,
    pub eks: ProbeResult<ClusterDetail>,
    pub rds: Option<ProbeResult<DatabaseDetail>>,
    pub elasticsearch: Option<ProbeResult<SearchDomainDetail>>,
}

impl ClusterResources {
    /// Number of probes that came back as errors.
    pub fn failed_probes(&self) -> usize {
        usize::from(self.eks.is_err())
            + usize::from(matches!(self.rds, Some(Err(_))))
            + usize::from(matches!(self.elasticsearch, Some(Err(_))))
    }
}

pub struct ResourceAggregator {
    api: Arc<dyn CloudApi>,
    region: String,
}

impl ResourceAggregator {
    pub fn new(api: Arc<dyn CloudApi>, region: impl Into<String>) -> Self {
        Self {
            api,
            region: region.into(),
        }
    }

    /// Runs the cluster probe, plus the database and search probes for
    /// whichever endpoints are declared, concurrently. Never fails.
    ///
    /// `_cache_endpoint` is accepted for parity with the declared data stores;
    /// there is no cache probe.
    pub async fn collect(
        &self,
        cluster_name: &str,
        rds_endpoint: Option<&str>,
        es_endpoint: Option<&str>,
        _cache_endpoint: Option<&str>,
    ) -> ClusterResources {
        let timestamp = Utc::now();
        let api = self.api.as_ref();
        debug!(
            "🛰️ probing {cluster_name} in {} (rds: {}, es: {})",
            self.region,
            rds_endpoint.is_some(),
            es_endpoint.is_some()
        );

        let (eks, rds, elasticsearch) = tokio::join!(
            probe_cluster(api, cluster_name),
            async {
                match rds_endpoint {
                    Some(endpoint) => Some(probe_database(api, endpoint).await),
                    None => None,
                }
            },
            async {
                match es_endpoint {
                    Some(endpoint) => Some(probe_search_domain(api, endpoint).await),
                    None => None,
                }
            },
        );

        let resources = ClusterResources {
            cluster_name: cluster_name.to_string(),
            region: self.region.clone(),
            timestamp,
            eks,
            rds,
            elasticsearch,
        };
        info!(
            "🛰️ probed {cluster_name}: {} probe(s) failed",
            resources.failed_probes()
        );
        resources
    }
}
