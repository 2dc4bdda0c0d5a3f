use crate::auth::AuthenticatedUser;
use crate::handlers::AppState;
use crate::reconciler::{SyncError, SyncRequest, SyncResponse};
use axum::Json;
use axum::extract::{Query, State};
use tracing::info;

/// `GET /api/fetchCloudResources`
pub async fn fetch_cloud_resources(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(request): Query<SyncRequest>,
) -> Result<Json<SyncResponse>, SyncError> {
    info!(
        "📩 {} requested resources for {} (force_refresh={})",
        user.email, request.cluster_name, request.force_refresh
    );
    let credentials = state.credentials().credentials();
    let response = state.reconciler().sync(&request, credentials).await?;
    Ok(Json(response))
}
