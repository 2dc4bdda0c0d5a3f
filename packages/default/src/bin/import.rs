use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use stack_catalogue::{
    import::{load_report, run_import, seed_azure_subscriptions},
    models::config::CatalogueConfig,
    store::{InventoryStore, PgInventory},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Load declared environments from a catalogue report into the inventory.
#[derive(Parser, Debug)]
#[command(name = "import", version)]
struct Cli {
    /// CSV report with a header row naming the columns
    report: PathBuf,

    /// Skip seeding Azure subscription labels from config
    #[arg(long)]
    skip_azure: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let cfg = CatalogueConfig::load()?;

    let pool = cfg.db_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    let store: Arc<dyn InventoryStore> = Arc::new(PgInventory::new(pool));

    info!("📥 Starting database population from file: {}", cli.report.display());
    let rows = load_report(&cli.report)?;
    run_import(store.as_ref(), &rows, &cfg.import).await;

    if !cli.skip_azure {
        let added = seed_azure_subscriptions(store.as_ref(), &cfg.azure_subscriptions).await?;
        info!(
            "✅ Azure subscriptions: {added} added, {} configured",
            cfg.azure_subscriptions.len()
        );
    }

    Ok(())
}
