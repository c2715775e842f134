//! CropLock platform node binary
//!
//! Usage: `croplock-server [config.toml]`. Without a path the configuration
//! is read from `CROPLOCK_*` environment variables.

use anyhow::Context;
use croplock_node::{spawn_platform_actor, Platform, PlatformConfig};
use receipt_ledger::SystemClock;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => PlatformConfig::from_file(&path)
            .with_context(|| format!("Failed to load config from {}", path))?,
        None => PlatformConfig::from_env().context("Failed to load config from environment")?,
    };

    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    if config.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        journal = config.journal.enabled,
        "Starting CropLock node"
    );

    let platform = Platform::new(&config, Arc::new(SystemClock))
        .context("Failed to initialize platform")?;
    let handle = spawn_platform_actor(platform, config.mailbox_capacity);

    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down CropLock node");
    let metrics = handle.render_metrics().await?;
    handle.shutdown().await?;
    tracing::info!(metrics = %metrics, "Final metrics");

    Ok(())
}
