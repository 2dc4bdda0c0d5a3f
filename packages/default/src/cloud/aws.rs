//! SDK-backed [`CloudApi`].

use super::{
    AwsCredentials, CloudApi, CloudConnector, ClusterDescription, Datapoint,
    DbInstanceDescription, MetricQuery, NatGatewayDescription, NodeGroupDescription,
    SearchDomainDescription,
};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;
use aws_sdk_cloudwatch::primitives::DateTime as SmithyDateTime;
use aws_sdk_cloudwatch::types::{Dimension, Statistic};
use aws_sdk_ec2::types::Filter;
use aws_sdk_eks::error::DisplayErrorContext;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Renders the full SDK error chain; `SdkError`'s own `Display` only says
/// "service error".
fn sdk_error<E: std::error::Error>(e: E) -> anyhow::Error {
    anyhow!("{}", DisplayErrorContext(e))
}

/// Connects with per-request session credentials. Every call is a single
/// attempt bounded by `call_timeout`.
#[derive(Debug, Clone)]
pub struct AwsConnector {
    call_timeout: Duration,
}

impl AwsConnector {
    pub fn new(call_timeout: Duration) -> Self {
        Self { call_timeout }
    }

    async fn sdk_config(&self, credentials: &AwsCredentials, region: &str) -> SdkConfig {
        let credentials = Credentials::new(
            credentials.access_key_id.clone(),
            credentials.secret_access_key.clone(),
            Some(credentials.session_token.clone()),
            None,
            "stack-catalogue",
        );

        aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(credentials)
            .retry_config(RetryConfig::disabled())
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(self.call_timeout)
                    .build(),
            )
            .load()
            .await
    }
}

#[async_trait]
impl CloudConnector for AwsConnector {
    async fn connect(
        &self,
        credentials: &AwsCredentials,
        region: &str,
    ) -> Result<Arc<dyn CloudApi>> {
        let config = self.sdk_config(credentials, region).await;
        debug!("🔌 AWS clients ready for {region}");
        Ok(Arc::new(AwsCloud::new(&config)))
    }
}

/// One client per probed service, all sharing a region and credentials.
pub struct AwsCloud {
    eks: aws_sdk_eks::Client,
    rds: aws_sdk_rds::Client,
    ec2: aws_sdk_ec2::Client,
    cloudwatch: aws_sdk_cloudwatch::Client,
    elasticsearch: aws_sdk_elasticsearch::Client,
}

impl AwsCloud {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            eks: aws_sdk_eks::Client::new(config),
            rds: aws_sdk_rds::Client::new(config),
            ec2: aws_sdk_ec2::Client::new(config),
            cloudwatch: aws_sdk_cloudwatch::Client::new(config),
            elasticsearch: aws_sdk_elasticsearch::Client::new(config),
        }
    }
}

fn to_chrono(ts: &SmithyDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts.secs(), ts.subsec_nanos())
}

fn to_smithy(ts: DateTime<Utc>) -> SmithyDateTime {
    SmithyDateTime::from_secs(ts.timestamp())
}

#[async_trait]
impl CloudApi for AwsCloud {
    async fn describe_cluster(&self, name: &str) -> Result<ClusterDescription> {
        let output = self
            .eks
            .describe_cluster()
            .name(name)
            .send()
            .await
            .map_err(sdk_error)?;
        let cluster = output
            .cluster()
            .with_context(|| format!("no cluster in response for {name}"))?;
        let vpc = cluster.resources_vpc_config();

        Ok(ClusterDescription {
            status: cluster.status().map(|s| s.as_str().to_string()),
            version: cluster.version().map(str::to_string),
            endpoint: cluster.endpoint().map(str::to_string),
            arn: cluster.arn().map(str::to_string),
            vpc_id: vpc.and_then(|v| v.vpc_id()).map(str::to_string),
            subnet_ids: vpc.map(|v| v.subnet_ids().to_vec()).unwrap_or_default(),
        })
    }

    async fn list_node_groups(&self, cluster_name: &str) -> Result<Vec<String>> {
        let output = self
            .eks
            .list_nodegroups()
            .cluster_name(cluster_name)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(output.nodegroups().to_vec())
    }

    async fn describe_node_group(
        &self,
        cluster_name: &str,
        node_group: &str,
    ) -> Result<NodeGroupDescription> {
        let output = self
            .eks
            .describe_nodegroup()
            .cluster_name(cluster_name)
            .nodegroup_name(node_group)
            .send()
            .await
            .map_err(sdk_error)?;
        let ng = output
            .nodegroup()
            .with_context(|| format!("no node group in response for {node_group}"))?;
        let scaling = ng.scaling_config();

        Ok(NodeGroupDescription {
            instance_types: ng.instance_types().to_vec(),
            desired_size: scaling.and_then(|s| s.desired_size()),
            min_size: scaling.and_then(|s| s.min_size()),
            max_size: scaling.and_then(|s| s.max_size()),
            status: ng.status().map(|s| s.as_str().to_string()),
        })
    }

    async fn describe_nat_gateways(&self, vpc_id: &str) -> Result<Vec<NatGatewayDescription>> {
        let output = self
            .ec2
            .describe_nat_gateways()
            .filter(Filter::builder().name("vpc-id").values(vpc_id).build())
            .filter(Filter::builder().name("state").values("available").build())
            .send()
            .await
            .map_err(sdk_error)?;

        Ok(output
            .nat_gateways()
            .iter()
            .map(|gw| NatGatewayDescription {
                id: gw.nat_gateway_id().map(str::to_string),
                public_ips: gw
                    .nat_gateway_addresses()
                    .iter()
                    .map(|addr| addr.public_ip().map(str::to_string))
                    .collect(),
            })
            .collect())
    }

    async fn describe_db_instance(&self, identifier: &str) -> Result<DbInstanceDescription> {
        let output = self
            .rds
            .describe_db_instances()
            .db_instance_identifier(identifier)
            .send()
            .await
            .map_err(sdk_error)?;
        let db = output
            .db_instances()
            .first()
            .with_context(|| format!("DB instance {identifier} not found"))?;

        Ok(DbInstanceDescription {
            endpoint_address: db.endpoint().and_then(|e| e.address()).map(str::to_string),
            status: db.db_instance_status().map(str::to_string),
            engine: db.engine().map(str::to_string),
            engine_version: db.engine_version().map(str::to_string),
            instance_class: db.db_instance_class().map(str::to_string),
            allocated_storage: db.allocated_storage(),
            multi_az: db.multi_az(),
            storage_encrypted: db.storage_encrypted(),
        })
    }

    async fn get_metric_statistics(&self, query: &MetricQuery) -> Result<Vec<Datapoint>> {
        let mut request = self
            .cloudwatch
            .get_metric_statistics()
            .namespace(&query.namespace)
            .metric_name(&query.metric_name)
            .start_time(to_smithy(query.start))
            .end_time(to_smithy(query.end))
            .period(query.period_secs)
            .statistics(Statistic::Average);
        for (name, value) in &query.dimensions {
            request = request.dimensions(Dimension::builder().name(name).value(value).build());
        }

        let output = request.send().await.map_err(sdk_error)?;
        Ok(output
            .datapoints()
            .iter()
            .filter_map(|dp| {
                Some(Datapoint {
                    timestamp: to_chrono(dp.timestamp()?)?,
                    average: dp.average(),
                })
            })
            .collect())
    }

    async fn describe_search_domain(&self, domain_name: &str) -> Result<SearchDomainDescription> {
        let output = self
            .elasticsearch
            .describe_elasticsearch_domain()
            .domain_name(domain_name)
            .send()
            .await
            .map_err(sdk_error)?;
        let domain = output
            .domain_status()
            .with_context(|| format!("no domain status in response for {domain_name}"))?;
        let cluster = domain.elasticsearch_cluster_config();

        Ok(SearchDomainDescription {
            processing: domain.processing(),
            version: domain.elasticsearch_version().map(str::to_string),
            endpoint: domain.endpoint().map(str::to_string),
            vpc_endpoint: domain
                .endpoints()
                .and_then(|endpoints| endpoints.get("vpc"))
                .cloned(),
            instance_type: cluster
                .and_then(|c| c.instance_type())
                .map(|t| t.as_str().to_string()),
            instance_count: cluster.and_then(|c| c.instance_count()),
            volume_size: domain.ebs_options().and_then(|ebs| ebs.volume_size()),
        })
    }
}
