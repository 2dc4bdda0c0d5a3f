mod auth;
mod aws;
mod database;
mod import;
mod server;

pub use auth::*;
pub use aws::*;
pub use database::*;
pub use import::*;
pub use server::*;

use anyhow::{Context, Result};
use config::Config;
use serde::Deserialize;
use sqlx::PgPool;
use std::env;
use tracing::debug;

const DEFAULT_CONFIG_PATH: &str = "/var/lib/stack_catalogue/config.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CatalogueConfig {
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub aws: AwsConfig,
    pub auth: Option<AuthConfig>,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub azure_subscriptions: Vec<AzureSubscriptionConfig>,
}

impl CatalogueConfig {
    /// Loads `config.toml` (path from `STACK_CATALOGUE_CONFIG`) layered with
    /// `STACK_CATALOGUE__*` environment variables.
    pub fn load() -> Result<Self> {
        let config_path =
            env::var("STACK_CATALOGUE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        debug!("STACK_CATALOGUE_CONFIG => {}", config_path);

        let settings = Config::builder()
            .add_source(config::File::with_name(&config_path).required(false))
            .add_source(config::Environment::with_prefix("STACK_CATALOGUE").separator("__"))
            .build()
            .context("loading configuration")?;

        settings
            .try_deserialize::<Self>()
            .context("parsing configuration")
    }

    pub fn database(&self) -> Result<&DatabaseConfig> {
        self.database
            .as_ref()
            .context("missing [database] section in configuration")
    }

    pub fn auth(&self) -> Result<&AuthConfig> {
        self.auth
            .as_ref()
            .context("missing [auth] section in configuration")
    }

    pub async fn db_pool(&self) -> Result<PgPool> {
        self.database()?.pool().await
    }
}
