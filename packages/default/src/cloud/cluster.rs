use super::{CloudApi, ProbeError, ProbeResult, network};
use crate::models::aws_resources::{ClusterDetail, NodeGroup};
use anyhow::{Context, Result};
use futures::future::join_all;
use tracing::{debug, warn};

/// Live EKS state for `cluster_name`, including node groups and NAT IPs.
///
/// Only the cluster description itself can fail the probe. Node-group and
/// network lookups degrade to empty lists.
pub async fn probe_cluster(api: &dyn CloudApi, cluster_name: &str) -> ProbeResult<ClusterDetail> {
    let description = api
        .describe_cluster(cluster_name)
        .await
        .with_context(|| format!("describing cluster {cluster_name}"))
        .map_err(ProbeError::from)?;

    let node_groups = match node_groups(api, cluster_name).await {
        Ok(groups) => groups,
        Err(e) => {
            warn!("⚠️ node groups unavailable for {cluster_name}: {e:#}");
            Vec::new()
        }
    };

    let nat_gateway_ips = match description.vpc_id.as_deref() {
        Some(vpc_id) => network::nat_gateway_ips(api, vpc_id).await,
        None => Vec::new(),
    };

    let total_nodes: i32 = node_groups.iter().map(|ng| ng.desired_size).sum();
    debug!(
        "🔎 cluster {cluster_name}: {} node groups, {total_nodes} nodes",
        node_groups.len()
    );

    Ok(ClusterDetail {
        name: cluster_name.to_string(),
        status: description.status,
        kubernetes_version: description.version,
        endpoint: description.endpoint,
        arn: description.arn,
        vpc_id: description.vpc_id,
        subnet_ids: description.subnet_ids,
        nat_gateway_ips,
        total_nodes,
        node_groups,
    })
}

/// Lists and describes every node group, in listing order. Any failure fails
/// the whole phase.
async fn node_groups(api: &dyn CloudApi, cluster_name: &str) -> Result<Vec<NodeGroup>> {
    let names = api.list_node_groups(cluster_name).await?;

    let described = join_all(
        names
            .iter()
            .map(|name| api.describe_node_group(cluster_name, name)),
    )
    .await;

    names
        .into_iter()
        .zip(described)
        .map(|(name, description)| {
            let description =
                description.with_context(|| format!("describing node group {name}"))?;
            Ok(NodeGroup {
                name,
                instance_types: description.instance_types,
                desired_size: description.desired_size.unwrap_or(0),
                min_size: description.min_size.unwrap_or(0),
                max_size: description.max_size.unwrap_or(0),
                status: description.status,
            })
        })
        .collect()
}
