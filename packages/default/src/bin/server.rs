use std::sync::Arc;

use stack_catalogue::{
    auth::{GoogleTokenVerifier, IdentityVerifier},
    cloud::{CredentialSource, EnvCredentials, aws::AwsConnector},
    config::debug_print_config,
    handlers::AppState,
    models::config::CatalogueConfig,
    reconciler::SnapshotReconciler,
    server::{build_router, serve},
    store::{InventoryStore, PgInventory},
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env()) // uses RUST_LOG
        .init();

    info!("Stack Catalogue: Starting...");

    let cfg = CatalogueConfig::load()?;
    debug_print_config(&cfg);

    debug!("======== INITIALIZING DATABASE ========");
    let pool = cfg.db_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let store: Arc<dyn InventoryStore> = Arc::new(PgInventory::new(pool));
    let verifier: Arc<dyn IdentityVerifier> = Arc::new(GoogleTokenVerifier::new(cfg.auth()?)?);
    let credentials: Arc<dyn CredentialSource> = Arc::new(EnvCredentials);
    let reconciler = Arc::new(SnapshotReconciler::new(
        store.clone(),
        Arc::new(AwsConnector::new(cfg.aws.call_timeout)),
        cfg.aws.sync_timeout,
    ));

    if credentials.credentials().is_none() {
        warn!("⚠️ AWS credentials are not set; syncs will fail until they are");
    }

    let state = AppState::new(reconciler, store, verifier, credentials);
    let app = build_router(state, &cfg.server)?;

    info!("Starting Stack Catalogue Server...");
    serve(app, &cfg.server).await
}
