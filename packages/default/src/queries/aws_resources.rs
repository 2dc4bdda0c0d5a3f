use crate::models::aws_resources::{
    AwsResourceRow, AwsResourceSnapshot, ClusterDetail, DatabaseDetail, EksClusterRow, NodeGroup,
    SearchDomainDetail,
};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

pub async fn get_row(pool: &PgPool, env_id: i32) -> Result<Option<AwsResourceRow>> {
    let row = sqlx::query_as::<_, AwsResourceRow>(
        "SELECT id, env_id, last_synced FROM aws_resources WHERE env_id = $1",
    )
    .bind(env_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Load an environment's snapshot with every child record.
pub async fn get_snapshot(pool: &PgPool, env_id: i32) -> Result<Option<AwsResourceSnapshot>> {
    let Some(row) = get_row(pool, env_id).await? else {
        return Ok(None);
    };

    let eks = sqlx::query_as::<_, EksClusterRow>(
        r#"
        SELECT id, name, status, kubernetes_version, endpoint, arn, vpc_id,
               subnet_ids, nat_gateway_ips, total_nodes
        FROM eks_clusters
        WHERE aws_resource_id = $1
        "#,
    )
    .bind(row.id)
    .fetch_optional(pool)
    .await?;

    let eks = match eks {
        Some(EksClusterRow { id, mut detail }) => {
            detail.node_groups = get_node_groups(pool, id).await?;
            Some(detail)
        }
        None => None,
    };

    let rds = sqlx::query_as::<_, DatabaseDetail>(
        r#"
        SELECT identifier, endpoint, status, engine, engine_version, instance_class,
               allocated_storage_gb, multi_az, storage_encrypted,
               cpu_percent, free_storage_gb, connections
        FROM rds_instances
        WHERE aws_resource_id = $1
        "#,
    )
    .bind(row.id)
    .fetch_optional(pool)
    .await?;

    let elasticsearch = sqlx::query_as::<_, SearchDomainDetail>(
        r#"
        SELECT domain_name, status, version, endpoint, instance_type,
               instance_count, volume_size_gb
        FROM elasticsearch_domains
        WHERE aws_resource_id = $1
        "#,
    )
    .bind(row.id)
    .fetch_optional(pool)
    .await?;

    Ok(Some(AwsResourceSnapshot {
        id: row.id,
        env_id: row.env_id,
        last_synced: row.last_synced,
        eks,
        rds,
        elasticsearch,
    }))
}

async fn get_node_groups(pool: &PgPool, eks_cluster_id: i32) -> Result<Vec<NodeGroup>> {
    let groups = sqlx::query_as::<_, NodeGroup>(
        r#"
        SELECT name, instance_types, desired_size, min_size, max_size, status
        FROM eks_node_groups
        WHERE eks_cluster_id = $1
        ORDER BY position
        "#,
    )
    .bind(eks_cluster_id)
    .fetch_all(pool)
    .await?;
    Ok(groups)
}

/// Delete the snapshot; children go with it through `ON DELETE CASCADE`.
pub async fn delete(pool: &PgPool, env_id: i32) -> Result<bool> {
    let result = sqlx::query("DELETE FROM aws_resources WHERE env_id = $1")
        .bind(env_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count(pool: &PgPool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM aws_resources")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn insert_row(
    conn: &mut PgConnection,
    env_id: i32,
    last_synced: DateTime<Utc>,
) -> Result<AwsResourceRow> {
    let row = sqlx::query_as::<_, AwsResourceRow>(
        r#"
        INSERT INTO aws_resources (env_id, last_synced)
        VALUES ($1, $2)
        RETURNING id, env_id, last_synced
        "#,
    )
    .bind(env_id)
    .bind(last_synced)
    .fetch_one(&mut *conn)
    .await?;
    Ok(row)
}

/// Insert the cluster detail and its node groups, in order.
pub async fn insert_eks(
    conn: &mut PgConnection,
    aws_resource_id: i32,
    cluster: &ClusterDetail,
) -> Result<i32> {
    let eks_id = sqlx::query_scalar::<_, i32>(
        r#"
        INSERT INTO eks_clusters (
            aws_resource_id, name, status, kubernetes_version, endpoint, arn,
            vpc_id, subnet_ids, nat_gateway_ips, total_nodes
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id
        "#,
    )
    .bind(aws_resource_id)
    .bind(&cluster.name)
    .bind(&cluster.status)
    .bind(&cluster.kubernetes_version)
    .bind(&cluster.endpoint)
    .bind(&cluster.arn)
    .bind(&cluster.vpc_id)
    .bind(&cluster.subnet_ids)
    .bind(&cluster.nat_gateway_ips)
    .bind(cluster.total_nodes)
    .fetch_one(&mut *conn)
    .await?;

    for (position, group) in cluster.node_groups.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO eks_node_groups (
                eks_cluster_id, position, name, instance_types,
                desired_size, min_size, max_size, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(eks_id)
        .bind(i32::try_from(position)?)
        .bind(&group.name)
        .bind(&group.instance_types)
        .bind(group.desired_size)
        .bind(group.min_size)
        .bind(group.max_size)
        .bind(&group.status)
        .execute(&mut *conn)
        .await?;
    }

    Ok(eks_id)
}

pub async fn insert_rds(
    conn: &mut PgConnection,
    aws_resource_id: i32,
    db: &DatabaseDetail,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO rds_instances (
            aws_resource_id, identifier, endpoint, status, engine, engine_version,
            instance_class, allocated_storage_gb, multi_az, storage_encrypted,
            cpu_percent, free_storage_gb, connections
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        "#,
    )
    .bind(aws_resource_id)
    .bind(&db.identifier)
    .bind(&db.endpoint)
    .bind(&db.status)
    .bind(&db.engine)
    .bind(&db.engine_version)
    .bind(&db.instance_class)
    .bind(db.allocated_storage_gb)
    .bind(db.multi_az)
    .bind(db.storage_encrypted)
    .bind(db.performance.cpu_percent)
    .bind(db.performance.free_storage_gb)
    .bind(db.performance.connections)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn insert_elasticsearch(
    conn: &mut PgConnection,
    aws_resource_id: i32,
    domain: &SearchDomainDetail,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO elasticsearch_domains (
            aws_resource_id, domain_name, status, version, endpoint,
            instance_type, instance_count, volume_size_gb
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(aws_resource_id)
    .bind(&domain.domain_name)
    .bind(&domain.status)
    .bind(&domain.version)
    .bind(&domain.endpoint)
    .bind(&domain.instance_type)
    .bind(domain.instance_count)
    .bind(domain.volume_size_gb)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
