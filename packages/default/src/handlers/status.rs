use axum::{extract::State, response::Json};
use serde_json::{Value, json};
use tracing::warn;

use crate::handlers::AppState;
use crate::store::InventoryStats;

pub async fn status(State(state): State<AppState>) -> Json<Value> {
    let db_status = match state.store().ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let stats = state.store().stats().await.unwrap_or_else(|e| {
        warn!("⚠️ inventory stats unavailable: {e:#}");
        InventoryStats::default()
    });

    Json(json!({
        "service": "Stack Catalogue",
        "status": "running",
        "database": db_status,
        "stats": {
            "environments": stats.environments,
            "aws_snapshots": stats.snapshots
        },
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
