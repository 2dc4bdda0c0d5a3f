use super::{CloudApi, ProbeError, ProbeResult};
use crate::models::aws_resources::SearchDomainDetail;
use anyhow::Context;

/// Short domain name from an endpoint hostname.
///
/// The provider builds hostnames as `[vpc-]<domain>-<random suffix>.<region>...`,
/// so the suffix after the last hyphen is dropped. This follows the provider's
/// current naming and breaks if that changes.
pub fn search_domain_name(endpoint: &str) -> &str {
    let host_label = endpoint.split('.').next().unwrap_or(endpoint);
    let label = host_label.strip_prefix("vpc-").unwrap_or(host_label);
    match label.rsplit_once('-') {
        Some((name, _suffix)) => name,
        None => label,
    }
}

/// Live Elasticsearch/OpenSearch state for the domain behind `endpoint`.
pub async fn probe_search_domain(
    api: &dyn CloudApi,
    endpoint: &str,
) -> ProbeResult<SearchDomainDetail> {
    let domain_name = search_domain_name(endpoint);

    let description = api
        .describe_search_domain(domain_name)
        .await
        .with_context(|| format!("describing search domain {domain_name}"))
        .map_err(ProbeError::from)?;

    let status = if description.processing.unwrap_or(false) {
        "processing"
    } else {
        "available"
    };

    Ok(SearchDomainDetail {
        domain_name: domain_name.to_string(),
        status: status.to_string(),
        version: description.version,
        endpoint: description.endpoint.or(description.vpc_endpoint),
        instance_type: description.instance_type,
        instance_count: description.instance_count,
        volume_size_gb: description.volume_size.unwrap_or(0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::SearchDomainDescription;
    use crate::cloud::scripted::ScriptedCloud;

    const VPC_ENDPOINT: &str = "vpc-logs-prod-xyz123abc.us-east-1.es.amazonaws.com";

    #[test]
    fn test_domain_name_from_endpoint() {
        assert_eq!(search_domain_name(VPC_ENDPOINT), "logs-prod");
        assert_eq!(
            search_domain_name("search-acme-abc123.eu-west-1.es.amazonaws.com"),
            "search-acme"
        );
        assert_eq!(search_domain_name("standalone.es.amazonaws.com"), "standalone");
        assert_eq!(search_domain_name("vpc-single"), "single");
    }

    fn domain(processing: Option<bool>) -> SearchDomainDescription {
        SearchDomainDescription {
            processing,
            version: Some("7.10".into()),
            endpoint: None,
            vpc_endpoint: Some(VPC_ENDPOINT.into()),
            instance_type: Some("r6g.large.elasticsearch".into()),
            instance_count: Some(3),
            volume_size: None,
        }
    }

    #[tokio::test]
    async fn test_status_follows_processing_flag() {
        let cloud = ScriptedCloud::new().with_search_domain("logs-prod", domain(Some(true)));
        let detail = probe_search_domain(&cloud, VPC_ENDPOINT).await.unwrap();
        assert_eq!(detail.status, "processing");

        let cloud = ScriptedCloud::new().with_search_domain("logs-prod", domain(Some(false)));
        let detail = probe_search_domain(&cloud, VPC_ENDPOINT).await.unwrap();
        assert_eq!(detail.status, "available");

        let cloud = ScriptedCloud::new().with_search_domain("logs-prod", domain(None));
        let detail = probe_search_domain(&cloud, VPC_ENDPOINT).await.unwrap();
        assert_eq!(detail.status, "available");
    }

    #[tokio::test]
    async fn test_endpoint_falls_back_to_vpc() {
        let cloud = ScriptedCloud::new().with_search_domain("logs-prod", domain(None));
        let detail = probe_search_domain(&cloud, VPC_ENDPOINT).await.unwrap();
        assert_eq!(detail.endpoint.as_deref(), Some(VPC_ENDPOINT));
        assert_eq!(detail.volume_size_gb, 0);
        assert_eq!(detail.instance_count, Some(3));

        let public = SearchDomainDescription {
            endpoint: Some("search-logs-prod-xyz.es.amazonaws.com".into()),
            ..domain(None)
        };
        let cloud = ScriptedCloud::new().with_search_domain("logs-prod", public);
        let detail = probe_search_domain(&cloud, VPC_ENDPOINT).await.unwrap();
        assert_eq!(
            detail.endpoint.as_deref(),
            Some("search-logs-prod-xyz.es.amazonaws.com")
        );
    }

    #[tokio::test]
    async fn test_unknown_domain_is_error_marker() {
        let cloud = ScriptedCloud::new();
        let err = probe_search_domain(&cloud, VPC_ENDPOINT).await.unwrap_err();
        assert!(err.error.contains("describing search domain logs-prod"));
    }
}
