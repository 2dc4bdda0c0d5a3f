use crate::handlers::{AppState, cloud_resources, secure, status};
use crate::models::config::ServerConfig;
use anyhow::{Context, Result};
use axum::http::HeaderValue;
use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Credentialed CORS for the configured origins. Methods and headers mirror
/// the preflight, since wildcards are not allowed with credentials.
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o).with_context(|| format!("invalid CORS origin '{o}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}

pub fn build_router(state: AppState, server_cfg: &ServerConfig) -> Result<Router> {
    let api = Router::new()
        .route("/fetchCloudResources", get(cloud_resources::fetch_cloud_resources))
        .route("/secure-data", get(secure::secure_data));

    Ok(Router::new()
        .route("/", get(secure::root))
        .route("/status", get(status::status))
        .nest("/api", api)
        .layer(cors_layer(&server_cfg.cors_origins)?)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

pub async fn serve(router: Router, server_cfg: &ServerConfig) -> Result<()> {
    let address = server_cfg.bind_address();
    info!("🚀 listening on {address}");
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;
    axum::serve(listener, router).await?;
    Ok(())
}
