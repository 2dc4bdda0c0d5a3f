use crate::models::azure_subscriptions::AzureSubscription;
use anyhow::Result;
use sqlx::PgPool;

/// Insert the subscription unless its id is already known. Existing rows are
/// never updated.
pub async fn insert_if_missing(pool: &PgPool, sub: &AzureSubscription) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO azure_subscriptions (id, subscription_name, is_internal)
        VALUES ($1, $2, $3)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(&sub.id)
    .bind(&sub.subscription_name)
    .bind(sub.is_internal)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
