//! # Postpilot Main Entry Point
//!
//! This is the main entry point for the postpilot API service.

use anyhow::Context;
use postpilot::{
    config::ConfigLoader,
    crypto::CryptoKey,
    db::{init_pool, run_migrations},
    server::run_server,
    telemetry::init_tracing,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from layered env files and variables
    let config_loader = ConfigLoader::new();
    let config = config_loader.load()?;

    init_tracing(&config)?;

    tracing::info!(profile = %config.profile, "Loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!(config = %redacted_json, "Effective configuration");
    }

    let crypto_key = config
        .crypto_key
        .clone()
        .context("POSTPILOT_CRYPTO_KEY is required")
        .and_then(|bytes| CryptoKey::new(bytes).context("Invalid POSTPILOT_CRYPTO_KEY"))?;

    let db = init_pool(&config).await?;
    run_migrations(&db).await?;

    run_server(config, db, crypto_key).await
}
