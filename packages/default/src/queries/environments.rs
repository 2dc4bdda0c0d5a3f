use crate::models::environments::{
    ApplicationConfig, ClusterConfig, DataStoreConfig, DeclaredEnvironment, Environment,
    Infrastructure,
};
use anyhow::Result;
use sqlx::{PgConnection, PgPool};

/// Resolve an environment through its declared cluster name.
pub async fn get_by_cluster_name(pool: &PgPool, cluster_name: &str) -> Result<Option<Environment>> {
    let env = sqlx::query_as::<_, Environment>(
        r#"
        SELECT e.*
        FROM environments e
        JOIN clusters c ON c.env_id = e.id
        WHERE c.cluster_name = $1
        ORDER BY e.id
        LIMIT 1
        "#,
    )
    .bind(cluster_name)
    .fetch_optional(pool)
    .await?;
    Ok(env)
}

pub async fn get_data_store(pool: &PgPool, env_id: i32) -> Result<Option<DataStoreConfig>> {
    let data_store = sqlx::query_as::<_, DataStoreConfig>(
        r#"
        SELECT rds_endpoint, rds_class, es_endpoint, es_instance, redis_host, redis_cluster_id
        FROM data_stores
        WHERE env_id = $1
        "#,
    )
    .bind(env_id)
    .fetch_optional(pool)
    .await?;
    Ok(data_store)
}

pub async fn count(pool: &PgPool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM environments")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Insert or overwrite the environment row by slug, returning its id.
pub async fn upsert(conn: &mut PgConnection, env: &DeclaredEnvironment) -> Result<i32> {
    let id = sqlx::query_scalar::<_, i32>(
        r#"
        INSERT INTO environments (
            slug, customer_name, environment, env_type, cloud_platform,
            account_id, region, created_at_git, updated_at_helm, web_url
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (slug) DO UPDATE SET
            customer_name = EXCLUDED.customer_name,
            environment = EXCLUDED.environment,
            env_type = EXCLUDED.env_type,
            cloud_platform = EXCLUDED.cloud_platform,
            account_id = EXCLUDED.account_id,
            region = EXCLUDED.region,
            created_at_git = EXCLUDED.created_at_git,
            updated_at_helm = EXCLUDED.updated_at_helm,
            web_url = EXCLUDED.web_url
        RETURNING id
        "#,
    )
    .bind(&env.slug)
    .bind(&env.customer_name)
    .bind(&env.environment)
    .bind(&env.env_type)
    .bind(&env.cloud_platform)
    .bind(&env.account_id)
    .bind(&env.region)
    .bind(&env.created_at_git)
    .bind(&env.updated_at_helm)
    .bind(&env.web_url)
    .fetch_one(&mut *conn)
    .await?;
    Ok(id)
}

/// Drop every declared config owned by the environment.
pub async fn delete_declared(conn: &mut PgConnection, env_id: i32) -> Result<()> {
    for table in ["infrastructure", "clusters", "data_stores", "applications"] {
        sqlx::query(&format!("DELETE FROM {table} WHERE env_id = $1"))
            .bind(env_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

pub async fn insert_infrastructure(
    conn: &mut PgConnection,
    env_id: i32,
    infra: &Infrastructure,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO infrastructure (
            env_id, vpc_id, vpc_cidr, subnet_app_1, subnet_app_2, subnet_app_3,
            instance_type, is_multi_az, resource_group
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(env_id)
    .bind(&infra.vpc_id)
    .bind(&infra.vpc_cidr)
    .bind(&infra.subnet_app_1)
    .bind(&infra.subnet_app_2)
    .bind(&infra.subnet_app_3)
    .bind(&infra.instance_type)
    .bind(infra.is_multi_az)
    .bind(&infra.resource_group)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn insert_cluster(
    conn: &mut PgConnection,
    env_id: i32,
    cluster: &ClusterConfig,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO clusters (
            env_id, cluster_name, helm_branch, dashboard_url, ingress_host,
            has_ingress, has_autoscaler
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(env_id)
    .bind(&cluster.cluster_name)
    .bind(&cluster.helm_branch)
    .bind(&cluster.dashboard_url)
    .bind(&cluster.ingress_host)
    .bind(cluster.has_ingress)
    .bind(cluster.has_autoscaler)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn insert_data_store(
    conn: &mut PgConnection,
    env_id: i32,
    data_store: &DataStoreConfig,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO data_stores (
            env_id, rds_endpoint, rds_class, es_endpoint, es_instance,
            redis_host, redis_cluster_id
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(env_id)
    .bind(&data_store.rds_endpoint)
    .bind(&data_store.rds_class)
    .bind(&data_store.es_endpoint)
    .bind(&data_store.es_instance)
    .bind(&data_store.redis_host)
    .bind(&data_store.redis_cluster_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn insert_application(
    conn: &mut PgConnection,
    env_id: i32,
    app: &ApplicationConfig,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO applications (
            env_id, ecm_replicas, ecm_cpu_limit, ecm_mem_limit, ecm_java_ops,
            userms_replicas, ispm_enabled, pam_enabled, apm_enabled, apm_url, log_bucket
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(env_id)
    .bind(app.ecm_replicas)
    .bind(&app.ecm_cpu_limit)
    .bind(&app.ecm_mem_limit)
    .bind(&app.ecm_java_ops)
    .bind(app.userms_replicas)
    .bind(app.ispm_enabled)
    .bind(app.pam_enabled)
    .bind(app.apm_enabled)
    .bind(&app.apm_url)
    .bind(&app.log_bucket)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
