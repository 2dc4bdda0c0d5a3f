use crate::models::config::CatalogueConfig;
use tracing::debug;

pub fn debug_print_config(cfg: &CatalogueConfig) {
    debug!("🔧 Loaded Configuration:");

    if let Some(db) = &cfg.database {
        let masked: String = "*".repeat(db.password.chars().count());
        debug!("  [database]");
        debug!("    host = {}", db.host);
        debug!("    port = {}", db.port);
        debug!("    user = {}", db.user);
        debug!("    password = {}", masked);
        debug!("    name = {}", db.name);
        debug!("    max_connections = {}", db.max_connections);
    }

    debug!("  [server]");
    debug!("    host = {}", cfg.server.host);
    debug!("    port = {}", cfg.server.port);
    for origin in &cfg.server.cors_origins {
        debug!("    cors_origin = {}", origin);
    }

    debug!("  [aws]");
    debug!("    call_timeout = {:?}", cfg.aws.call_timeout);
    debug!("    sync_timeout = {:?}", cfg.aws.sync_timeout);

    if let Some(auth) = &cfg.auth {
        debug!("  [auth]");
        debug!("    client_id = {}", auth.client_id);
        debug!("    allowed_email_domain = {}", auth.allowed_email_domain);
        debug!("    jwks_url = {}", auth.jwks_url);
        debug!("    key_cache_ttl = {:?}", auth.key_cache_ttl);
    }

    debug!("  [import]");
    debug!("    web_url_template = {}", cfg.import.web_url_template);
    debug!("  azure_subscriptions = {}", cfg.azure_subscriptions.len());
}
