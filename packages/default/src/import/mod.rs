//! Bulk import of declared environments from the catalogue report.
//!
//! The report is a CSV file whose header row names the columns. Rows fail one
//! at a time; a bad row never stops the job.

use crate::models::azure_subscriptions::AzureSubscription;
use crate::models::config::{AzureSubscriptionConfig, ImportConfig};
use crate::models::environments::{
    ApplicationConfig, ClusterConfig, DataStoreConfig, DeclaredEnvironment, Infrastructure,
};
use crate::store::InventoryStore;
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;
use tracing::{error, info, warn};

pub type ReportRow = Map<String, Value>;

const UNKNOWN_CLUSTER: &str = "Unknown";

/// Why a row was left out without touching the store.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RowSkip {
    #[error("Skipped - Missing CUSTOMER_ENV (Slug)")]
    MissingSlug,

    #[error("Could not derive customer/env for {0}. Skipping.")]
    Underivable(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub success: usize,
    pub errors: usize,
    pub skipped: usize,
}

/// Empty, `NA` and null cells read as absent.
pub fn clean_value(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if text.is_empty() || text.eq_ignore_ascii_case("na") {
        None
    } else {
        Some(text)
    }
}

pub fn parse_bool(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        other => clean_value(other).is_some_and(|s| {
            matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "true" | "yes" | "1" | "t" | "on"
            )
        }),
    }
}

/// Replica counts are taken only when the cell is all digits.
pub fn parse_replicas(value: Option<&Value>) -> Option<i32> {
    clean_value(value)
        .filter(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
        .and_then(|s| s.parse().ok())
}

struct Cells<'a>(&'a ReportRow);

impl Cells<'_> {
    fn text(&self, column: &str) -> Option<String> {
        clean_value(self.0.get(column))
    }

    /// First present value among `columns`.
    fn first(&self, columns: &[&str]) -> Option<String> {
        columns.iter().find_map(|c| self.text(c))
    }

    fn flag(&self, column: &str) -> bool {
        parse_bool(self.0.get(column))
    }

    fn replicas(&self, column: &str) -> Option<i32> {
        parse_replicas(self.0.get(column))
    }
}

/// Customer and environment from a `customer-...-env` slug.
fn derive_names(slug: &str) -> Option<(String, String)> {
    let parts: Vec<&str> = slug.split('-').collect();
    match parts.as_slice() {
        [first, .., last] => Some((first.to_string(), last.to_string())),
        _ => None,
    }
}

pub fn declared_from_row(
    row: &ReportRow,
    cfg: &ImportConfig,
) -> std::result::Result<DeclaredEnvironment, RowSkip> {
    let cells = Cells(row);
    let slug = cells.text("CUSTOMER_ENV").ok_or(RowSkip::MissingSlug)?;

    let (customer_name, environment) = match (
        cells.text("customer_name_appinstance"),
        cells.text("environment_appinstance"),
    ) {
        (Some(customer), Some(env)) => (customer, env),
        _ => {
            warn!("⚠️ missing customer/env name for slug {slug}, deriving from slug");
            derive_names(&slug).ok_or_else(|| RowSkip::Underivable(slug.clone()))?
        }
    };

    let mut cluster_name = cells
        .first(&[
            "cluster_name_cluster",
            "aks_cluster_name_cluster",
            "AKSClusterName_infra-output",
            "cluster_name_appinstance",
        ])
        .unwrap_or_else(|| UNKNOWN_CLUSTER.to_string());
    if cluster_name.eq_ignore_ascii_case("na") {
        cluster_name = UNKNOWN_CLUSTER.to_string();
    }

    Ok(DeclaredEnvironment {
        web_url: Some(cfg.web_url(&customer_name, &environment)),
        slug,
        env_type: cells.text("customer_tier_appinstance"),
        cloud_platform: cells.text("cloud_platform").unwrap_or_else(|| "aws".to_string()),
        account_id: cells.text("Account").unwrap_or_else(|| "UNKNOWN".to_string()),
        region: cells
            .first(&["Region", "aws_region_appinstance"])
            .unwrap_or_else(|| "us-east-1".to_string()),
        created_at_git: cells.text("CreatedAt"),
        updated_at_helm: cells.text("HelmFileTimeStamp"),
        infrastructure: Infrastructure {
            vpc_id: cells.text("VPCID_infra-input"),
            vpc_cidr: cells.text("VPCCIDR_infra-input"),
            subnet_app_1: cells.text("AppSubnetCIDR1_infra-input"),
            subnet_app_2: cells.text("AppSubnetCIDR2_infra-input"),
            subnet_app_3: cells.text("AppSubnetCIDR3_infra-input"),
            instance_type: cells.text("InstanceType_infra-input"),
            is_multi_az: cells.flag("MultiAZ_infra-input"),
            resource_group: cells.first(&["resource_group_appinstance", "AKSMCRGName_infra-output"]),
        },
        cluster: ClusterConfig {
            cluster_name,
            helm_branch: cells.first(&["helm_branch_cluster", "helm_branch_appinstance"]),
            dashboard_url: cells.first(&["k8dashboard_hostname_cluster", "aks_dashboard_url_cluster"]),
            ingress_host: cells.text("ingress-host_appinstance"),
            has_ingress: cells.flag("ingress-nginx-enabled_cluster"),
            has_autoscaler: cells.flag("cluster_autoscaler_enabled"),
        },
        data_store: DataStoreConfig {
            rds_endpoint: cells.text("RDSEndpoint_infra-output"),
            rds_class: cells.text("RDSInstanceClass_infra-input"),
            es_endpoint: cells.text("Elasticsearch_endpoint_infra-output"),
            es_instance: cells.text("ESInstanceType_infra-input"),
            redis_host: cells.text("redis_hostname_appinstance"),
            redis_cluster_id: cells.text("RedisClusterID_infra-output"),
        },
        application: ApplicationConfig {
            ecm_replicas: cells.replicas("ecm-worker-replicas_appinstance"),
            ecm_cpu_limit: cells.text("ecm-worker-resources-limits-cpu_appinstance"),
            ecm_mem_limit: cells.text("ecm-worker-resources-limits-memory_appinstance"),
            ecm_java_ops: cells.text("ecm-worker-java_ops_appinstance"),
            userms_replicas: cells.replicas("userms-replicas_appinstance"),
            ispm_enabled: cells.flag("ispm_services_enabled_appinstance"),
            pam_enabled: cells.flag("pam_services_enabled_appinstance"),
            apm_enabled: cells.flag("enabled_apm_monitoring_appinstance"),
            apm_url: cells.text("apm_server_url_appinstance"),
            log_bucket: cells.text("recording_bucket_appinstance"),
        },
        customer_name,
        environment,
    })
}

/// Reads every record of the CSV report, keyed by header. Empty cells stay
/// as empty strings and are cleaned per column later.
pub fn load_report(path: &Path) -> Result<Vec<ReportRow>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening report {}", path.display()))?;

    let mut rows = Vec::new();
    for (index, record) in reader.deserialize::<HashMap<String, String>>().enumerate() {
        let record = record
            .with_context(|| format!("parsing record {} of {}", index + 1, path.display()))?;
        rows.push(
            record
                .into_iter()
                .map(|(column, cell)| (column, Value::String(cell)))
                .collect::<ReportRow>(),
        );
    }

    info!("📄 loaded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Upserts every usable row. Row numbers in logs are 1-based.
pub async fn run_import(
    store: &dyn InventoryStore,
    rows: &[ReportRow],
    cfg: &ImportConfig,
) -> ImportSummary {
    let mut summary = ImportSummary::default();

    for (index, row) in rows.iter().enumerate() {
        let row_number = index + 1;
        let declared = match declared_from_row(row, cfg) {
            Ok(declared) => declared,
            Err(skip @ RowSkip::MissingSlug) => {
                warn!("⚠️ Row {row_number}: {skip}");
                summary.skipped += 1;
                continue;
            }
            Err(skip) => {
                error!("❌ Row {row_number}: {skip}");
                summary.skipped += 1;
                continue;
            }
        };

        match store.upsert_environment(&declared).await {
            Ok(env_id) => {
                info!("📥 Row {row_number}: stored '{}' as environment {env_id}", declared.slug);
                summary.success += 1;
            }
            Err(e) => {
                error!("❌ Row {row_number}: Failed to process. Error: {e:#}");
                summary.errors += 1;
            }
        }
    }

    info!(
        "🏁 Population complete. Success: {}, Errors: {}",
        summary.success, summary.errors
    );
    summary
}

/// Inserts configured Azure subscriptions that are not yet known. Returns how
/// many were added.
pub async fn seed_azure_subscriptions(
    store: &dyn InventoryStore,
    subscriptions: &[AzureSubscriptionConfig],
) -> Result<usize> {
    let mut added = 0;
    for sub in subscriptions {
        let row = AzureSubscription {
            id: sub.id.clone(),
            subscription_name: sub.name.clone(),
            is_internal: sub.internal,
        };
        if store.insert_azure_subscription_if_missing(&row).await? {
            info!("➕ Added Azure subscription: {}", sub.name);
            added += 1;
        }
    }
    Ok(added)
}
