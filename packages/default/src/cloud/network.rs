use super::CloudApi;
use tracing::warn;

/// Public IPs of every available NAT gateway in `vpc_id`. A failed lookup
/// reads as no gateways.
pub async fn nat_gateway_ips(api: &dyn CloudApi, vpc_id: &str) -> Vec<String> {
    match api.describe_nat_gateways(vpc_id).await {
        Ok(gateways) => gateways
            .into_iter()
            .flat_map(|gw| gw.public_ips.into_iter().flatten())
            .collect(),
        Err(e) => {
            warn!("⚠️ NAT gateway lookup failed for {vpc_id}: {e:#}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::NatGatewayDescription;
    use crate::cloud::scripted::ScriptedCloud;

    #[tokio::test]
    async fn test_collects_public_ips_across_gateways() {
        let cloud = ScriptedCloud::new().with_nat_gateways(
            "vpc-1",
            vec![
                NatGatewayDescription {
                    id: Some("nat-a".into()),
                    public_ips: vec![Some("3.3.3.3".into()), None],
                },
                NatGatewayDescription {
                    id: Some("nat-b".into()),
                    public_ips: vec![Some("4.4.4.4".into())],
                },
            ],
        );

        let ips = nat_gateway_ips(&cloud, "vpc-1").await;
        assert_eq!(ips, vec!["3.3.3.3", "4.4.4.4"]);
    }

    #[tokio::test]
    async fn test_lookup_failure_is_empty() {
        let cloud = ScriptedCloud::new().failing_nat_lookup("vpc-1");
        assert!(nat_gateway_ips(&cloud, "vpc-1").await.is_empty());
    }
}
