use super::metrics::MetricReader;
use super::{CloudApi, ProbeError, ProbeResult};
use crate::models::aws_resources::{DatabaseDetail, DatabasePerformance};
use anyhow::Context;

const RDS_NAMESPACE: &str = "AWS/RDS";
const BYTES_PER_GB: f64 = 1_073_741_824.0;

/// The instance identifier is the leading label of the endpoint hostname.
pub fn database_identifier(endpoint: &str) -> &str {
    endpoint.split('.').next().unwrap_or(endpoint)
}

pub fn bytes_to_gb(bytes: f64) -> f64 {
    round2(bytes / BYTES_PER_GB)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Live RDS state for the instance behind `endpoint`, with its latest
/// CloudWatch readings.
pub async fn probe_database(api: &dyn CloudApi, endpoint: &str) -> ProbeResult<DatabaseDetail> {
    let identifier = database_identifier(endpoint);

    let description = api
        .describe_db_instance(identifier)
        .await
        .with_context(|| format!("describing DB instance {identifier}"))
        .map_err(ProbeError::from)?;

    let performance = performance(api, identifier).await;

    Ok(DatabaseDetail {
        identifier: identifier.to_string(),
        endpoint: description.endpoint_address,
        status: description.status,
        engine: description.engine,
        engine_version: description.engine_version,
        instance_class: description.instance_class,
        allocated_storage_gb: description.allocated_storage.unwrap_or(0),
        multi_az: description.multi_az.unwrap_or(false),
        storage_encrypted: description.storage_encrypted.unwrap_or(false),
        performance,
    })
}

async fn performance(api: &dyn CloudApi, identifier: &str) -> DatabasePerformance {
    let reader = MetricReader::new(api);
    let dimensions = [("DBInstanceIdentifier", identifier)];

    let (cpu, free_storage, connections) = tokio::join!(
        reader.latest_average(RDS_NAMESPACE, "CPUUtilization", &dimensions),
        reader.latest_average(RDS_NAMESPACE, "FreeStorageSpace", &dimensions),
        reader.latest_average(RDS_NAMESPACE, "DatabaseConnections", &dimensions),
    );

    DatabasePerformance {
        cpu_percent: cpu.map(round2),
        free_storage_gb: free_storage.map(bytes_to_gb),
        connections: connections.map(|c| c.trunc() as i64).unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::scripted::ScriptedCloud;
    use crate::cloud::{Datapoint, DbInstanceDescription};
    use chrono::{Duration, Utc};

    const ENDPOINT: &str = "mydb-instance-1.abcdef123456.us-east-1.rds.amazonaws.com";

    fn instance() -> DbInstanceDescription {
        DbInstanceDescription {
            endpoint_address: Some(ENDPOINT.into()),
            status: Some("available".into()),
            engine: Some("postgres".into()),
            engine_version: Some("15.4".into()),
            instance_class: Some("db.r6g.large".into()),
            allocated_storage: Some(100),
            multi_az: Some(true),
            storage_encrypted: None,
        }
    }

    fn reading(average: f64) -> Vec<Datapoint> {
        vec![Datapoint {
            timestamp: Utc::now(),
            average: Some(average),
        }]
    }

    #[test]
    fn test_identifier_is_leading_label() {
        assert_eq!(database_identifier(ENDPOINT), "mydb-instance-1");
        assert_eq!(database_identifier("bare-host"), "bare-host");
    }

    #[test]
    fn test_bytes_to_gb() {
        assert_eq!(bytes_to_gb(10_737_418_240.0), 10.0);
        assert_eq!(bytes_to_gb(1_610_612_736.0), 1.5);
        assert_eq!(bytes_to_gb(1_000_000_000.0), 0.93);
    }

    #[tokio::test]
    async fn test_probe_reads_instance_and_metrics() {
        let cloud = ScriptedCloud::new()
            .with_db_instance("mydb-instance-1", instance())
            .with_metric("CPUUtilization", reading(12.3456))
            .with_metric("FreeStorageSpace", reading(10_737_418_240.0))
            .with_metric("DatabaseConnections", reading(42.9));

        let detail = probe_database(&cloud, ENDPOINT).await.unwrap();

        assert_eq!(detail.identifier, "mydb-instance-1");
        assert_eq!(detail.allocated_storage_gb, 100);
        assert!(detail.multi_az);
        assert!(!detail.storage_encrypted);
        assert_eq!(detail.performance.cpu_percent, Some(12.35));
        assert_eq!(detail.performance.free_storage_gb, Some(10.0));
        assert_eq!(detail.performance.connections, 42);
    }

    #[tokio::test]
    async fn test_latest_datapoint_wins() {
        let now = Utc::now();
        let cloud = ScriptedCloud::new()
            .with_db_instance("mydb-instance-1", instance())
            .with_metric(
                "CPUUtilization",
                vec![
                    Datapoint {
                        timestamp: now,
                        average: Some(80.0),
                    },
                    Datapoint {
                        timestamp: now - Duration::minutes(5),
                        average: Some(10.0),
                    },
                ],
            );

        let detail = probe_database(&cloud, ENDPOINT).await.unwrap();
        assert_eq!(detail.performance.cpu_percent, Some(80.0));
    }

    #[tokio::test]
    async fn test_missing_metrics_are_absent_not_zero() {
        let cloud = ScriptedCloud::new().with_db_instance("mydb-instance-1", instance());

        let detail = probe_database(&cloud, ENDPOINT).await.unwrap();
        assert_eq!(detail.performance.cpu_percent, None);
        assert_eq!(detail.performance.free_storage_gb, None);
        assert_eq!(detail.performance.connections, 0);
    }

    #[tokio::test]
    async fn test_unknown_instance_is_error_marker() {
        let cloud = ScriptedCloud::new();
        let err = probe_database(&cloud, ENDPOINT).await.unwrap_err();
        assert!(err.error.contains("DBInstanceNotFound"));
        assert_eq!(cloud.call_count(), 1);
    }
}
