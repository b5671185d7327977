//! Restock monitor entry point
//!
//! Loads configuration, sets up logging and runs the monitor until Ctrl+C
//! (or for a single cycle in run-once mode).

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use restock_monitor::RestockMonitor;
use restock_monitor::infrastructure::{AppConfig, init_logging_with_config};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_logging_with_config(&config.logging).context("Failed to initialize logging")?;

    info!("Restock monitor v{}", env!("CARGO_PKG_VERSION"));
    if config.products.is_empty() {
        warn!("No products configured; nothing to monitor");
    }
    if config.notifier.webhook_url.is_none() {
        warn!("No webhook configured; alerts will only be logged");
    }

    let monitor = RestockMonitor::from_config(&config)?;

    let cancellation_token = CancellationToken::new();
    let shutdown = cancellation_token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown requested");
                shutdown.cancel();
            }
            Err(e) => warn!("Failed to listen for Ctrl+C: {}", e),
        }
    });

    monitor.run(cancellation_token).await;
    Ok(())
}
