use super::{InventoryStats, InventoryStore};
use crate::cloud::ClusterResources;
use crate::models::aws_resources::AwsResourceSnapshot;
use crate::models::azure_subscriptions::AzureSubscription;
use crate::models::environments::{DataStoreConfig, DeclaredEnvironment, Environment};
use crate::queries::{aws_resources, azure_subscriptions, environments};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct PgInventory {
    pool: PgPool,
}

impl PgInventory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InventoryStore for PgInventory {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1 as health_check")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_environment_by_cluster(&self, cluster_name: &str) -> Result<Option<Environment>> {
        environments::get_by_cluster_name(&self.pool, cluster_name).await
    }

    async fn get_data_store(&self, env_id: i32) -> Result<Option<DataStoreConfig>> {
        environments::get_data_store(&self.pool, env_id).await
    }

    async fn get_snapshot(&self, env_id: i32) -> Result<Option<AwsResourceSnapshot>> {
        aws_resources::get_snapshot(&self.pool, env_id).await
    }

    async fn delete_snapshot(&self, env_id: i32) -> Result<bool> {
        aws_resources::delete(&self.pool, env_id).await
    }

    async fn insert_snapshot(
        &self,
        env_id: i32,
        resources: &ClusterResources,
    ) -> Result<AwsResourceSnapshot> {
        // Dropping `tx` on any early return rolls everything back.
        let mut tx = self.pool.begin().await?;

        let row = aws_resources::insert_row(&mut *tx, env_id, resources.timestamp)
            .await
            .context("inserting aws_resources row")?;

        if let Ok(cluster) = &resources.eks {
            aws_resources::insert_eks(&mut *tx, row.id, cluster)
                .await
                .context("inserting eks cluster")?;
        }
        if let Some(Ok(db)) = &resources.rds {
            aws_resources::insert_rds(&mut *tx, row.id, db)
                .await
                .context("inserting rds instance")?;
        }
        if let Some(Ok(domain)) = &resources.elasticsearch {
            aws_resources::insert_elasticsearch(&mut *tx, row.id, domain)
                .await
                .context("inserting elasticsearch domain")?;
        }

        tx.commit().await?;
        debug!("💾 snapshot {} stored for environment {env_id}", row.id);

        aws_resources::get_snapshot(&self.pool, env_id)
            .await?
            .context("snapshot vanished after commit")
    }

    async fn upsert_environment(&self, env: &DeclaredEnvironment) -> Result<i32> {
        let mut tx = self.pool.begin().await?;

        let env_id = environments::upsert(&mut *tx, env).await?;
        environments::delete_declared(&mut *tx, env_id).await?;
        environments::insert_infrastructure(&mut *tx, env_id, &env.infrastructure).await?;
        environments::insert_cluster(&mut *tx, env_id, &env.cluster).await?;
        environments::insert_data_store(&mut *tx, env_id, &env.data_store).await?;
        environments::insert_application(&mut *tx, env_id, &env.application).await?;

        tx.commit().await?;
        Ok(env_id)
    }

    async fn insert_azure_subscription_if_missing(&self, sub: &AzureSubscription) -> Result<bool> {
        azure_subscriptions::insert_if_missing(&self.pool, sub).await
    }

    async fn stats(&self) -> Result<InventoryStats> {
        Ok(InventoryStats {
            environments: environments::count(&self.pool).await?,
            snapshots: aws_resources::count(&self.pool).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::ProbeError;
    use crate::models::aws_resources::{
        ClusterDetail, DatabaseDetail, DatabasePerformance, NodeGroup, SearchDomainDetail,
    };
    use crate::models::environments::ClusterConfig;
    use chrono::{SubsecRound, Utc};

    async fn seed(store: &PgInventory) -> i32 {
        store
            .upsert_environment(&DeclaredEnvironment {
                slug: "acme-prod".to_string(),
                customer_name: "acme".to_string(),
                environment: "prod".to_string(),
                cloud_platform: "aws".to_string(),
                account_id: "123456789012".to_string(),
                region: "us-east-1".to_string(),
                cluster: ClusterConfig {
                    cluster_name: "acme-prod-eks".to_string(),
                    ..Default::default()
                },
                ..Default::default()
            })
            .await
            .unwrap()
    }

    fn node_group(name: &str, desired_size: i32) -> NodeGroup {
        NodeGroup {
            name: name.to_string(),
            instance_types: vec!["m5.xlarge".to_string(), "m5a.xlarge".to_string()],
            desired_size,
            min_size: 1,
            max_size: 10,
            status: Some("ACTIVE".to_string()),
        }
    }

    fn resources() -> ClusterResources {
        ClusterResources {
            cluster_name: "acme-prod-eks".to_string(),
            region: "us-east-1".to_string(),
            // timestamptz keeps microseconds
            timestamp: Utc::now().trunc_subsecs(6),
            eks: Ok(ClusterDetail {
                name: "acme-prod-eks".to_string(),
                status: Some("ACTIVE".to_string()),
                kubernetes_version: Some("1.29".to_string()),
                vpc_id: Some("vpc-0abc".to_string()),
                subnet_ids: vec!["subnet-a".to_string(), "subnet-b".to_string()],
                nat_gateway_ips: vec!["52.1.2.3".to_string()],
                total_nodes: 10,
                // deliberately not in name order
                node_groups: vec![
                    node_group("workers", 3),
                    node_group("batch", 5),
                    node_group("system", 2),
                ],
                ..Default::default()
            }),
            rds: Some(Ok(DatabaseDetail {
                identifier: "acme-prod-db".to_string(),
                status: Some("available".to_string()),
                engine: Some("postgres".to_string()),
                allocated_storage_gb: 100,
                multi_az: true,
                performance: DatabasePerformance {
                    cpu_percent: Some(12.5),
                    free_storage_gb: None,
                    connections: 42,
                },
                ..Default::default()
            })),
            elasticsearch: Some(Ok(SearchDomainDetail {
                domain_name: "acme-logs".to_string(),
                status: "available".to_string(),
                instance_count: Some(3),
                volume_size_gb: 20,
                ..Default::default()
            })),
        }
    }

    async fn count_rows(pool: &PgPool, table: &str) -> i64 {
        let sql = format!("SELECT COUNT(*) FROM {table}");
        sqlx::query_scalar::<_, i64>(&sql)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    async fn snapshot_rows(pool: &PgPool) -> [i64; 5] {
        [
            count_rows(pool, "aws_resources").await,
            count_rows(pool, "eks_clusters").await,
            count_rows(pool, "eks_node_groups").await,
            count_rows(pool, "rds_instances").await,
            count_rows(pool, "elasticsearch_domains").await,
        ]
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL pointing at a Postgres server"]
    async fn test_snapshot_round_trip(pool: PgPool) {
        let store = PgInventory::new(pool);
        let env_id = seed(&store).await;
        let resources = resources();

        let stored = store.insert_snapshot(env_id, &resources).await.unwrap();
        let loaded = store.get_snapshot(env_id).await.unwrap().unwrap();

        assert_eq!(stored, loaded);
        assert_eq!(loaded.last_synced, resources.timestamp);
        assert_eq!(loaded.eks.as_ref(), resources.eks.as_ref().ok());

        let groups: Vec<&str> = loaded
            .eks
            .as_ref()
            .unwrap()
            .node_groups
            .iter()
            .map(|g| g.name.as_str())
            .collect();
        assert_eq!(groups, ["workers", "batch", "system"]);

        let rds = loaded.rds.unwrap();
        assert_eq!(rds.performance.cpu_percent, Some(12.5));
        assert_eq!(rds.performance.free_storage_gb, None);
        assert_eq!(rds.performance.connections, 42);
        assert_eq!(loaded.elasticsearch.unwrap().volume_size_gb, 20);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL pointing at a Postgres server"]
    async fn test_failed_probes_are_not_stored(pool: PgPool) {
        let store = PgInventory::new(pool);
        let env_id = seed(&store).await;
        let mut resources = resources();
        resources.eks = Err(ProbeError::new("AccessDeniedException"));
        resources.elasticsearch = None;

        let stored = store.insert_snapshot(env_id, &resources).await.unwrap();

        assert!(stored.eks.is_none());
        assert!(stored.elasticsearch.is_none());
        assert_eq!(stored.rds.unwrap().identifier, "acme-prod-db");
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL pointing at a Postgres server"]
    async fn test_delete_cascades_to_every_detail(pool: PgPool) {
        let store = PgInventory::new(pool.clone());
        let env_id = seed(&store).await;
        store.insert_snapshot(env_id, &resources()).await.unwrap();
        assert_eq!(snapshot_rows(&pool).await, [1, 1, 3, 1, 1]);

        assert!(store.delete_snapshot(env_id).await.unwrap());

        assert_eq!(snapshot_rows(&pool).await, [0; 5]);
        assert!(!store.delete_snapshot(env_id).await.unwrap());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL pointing at a Postgres server"]
    async fn test_failed_detail_insert_rolls_back_everything(pool: PgPool) {
        let store = PgInventory::new(pool.clone());
        let env_id = seed(&store).await;
        let mut resources = resources();
        // Postgres rejects NUL in text, after the cluster and database rows
        // are already written.
        if let Some(Ok(domain)) = resources.elasticsearch.as_mut() {
            domain.domain_name = "acme\0logs".to_string();
        }

        let err = store.insert_snapshot(env_id, &resources).await.unwrap_err();

        assert!(format!("{err:#}").contains("inserting elasticsearch domain"));
        assert_eq!(snapshot_rows(&pool).await, [0; 5]);
        assert!(store.get_snapshot(env_id).await.unwrap().is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL pointing at a Postgres server"]
    async fn test_second_snapshot_for_environment_is_rejected(pool: PgPool) {
        let store = PgInventory::new(pool.clone());
        let env_id = seed(&store).await;
        let first = store.insert_snapshot(env_id, &resources()).await.unwrap();

        assert!(store.insert_snapshot(env_id, &resources()).await.is_err());

        assert_eq!(snapshot_rows(&pool).await, [1, 1, 3, 1, 1]);
        assert_eq!(store.get_snapshot(env_id).await.unwrap().unwrap(), first);
    }
}
