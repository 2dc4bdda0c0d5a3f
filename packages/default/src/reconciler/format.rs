use crate::models::aws_resources::{
    AwsResourceSnapshot, ClusterDetail, DatabaseDetail, SearchDomainDetail,
};
use chrono::SecondsFormat;
use serde::Serialize;

/// Body of a successful sync.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SyncResponse {
    pub success: bool,
    pub cluster_name: String,
    pub account_id: String,
    pub region: String,
    pub resources: ResourcesView,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResourcesView {
    pub cluster_name: String,
    pub region: String,
    /// `last_synced` of the snapshot, ISO-8601.
    pub timestamp: String,
    pub eks: Option<ClusterDetail>,
    pub rds: Option<DatabaseDetail>,
    pub elasticsearch: Option<SearchDomainDetail>,
}

/// Render a stored snapshot. Request scope is echoed back as given.
pub fn format_snapshot(
    cluster_name: &str,
    account_id: &str,
    region: &str,
    snapshot: AwsResourceSnapshot,
) -> SyncResponse {
    SyncResponse {
        success: true,
        cluster_name: cluster_name.to_string(),
        account_id: account_id.to_string(),
        region: region.to_string(),
        resources: ResourcesView {
            cluster_name: cluster_name.to_string(),
            region: region.to_string(),
            timestamp: snapshot
                .last_synced
                .to_rfc3339_opts(SecondsFormat::Micros, false),
            eks: snapshot.eks,
            rds: snapshot.rds,
            elasticsearch: snapshot.elasticsearch,
        },
    }
}
