//! # Signed Notification Relay
//!
//! Entry point: load configuration, initialize logging, build the relay and
//! serve until Ctrl+C.

use anyhow::{Context, Result};
use relay_runtime::{RelayConfig, RelayRuntime};
use relay_telemetry::init_logging;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = RelayConfig::from_env().context("Invalid configuration")?;

    // Initialize logging
    init_logging(&config.logging).context("Failed to initialize logging")?;
    info!(
        public_host = %config.server.address(),
        gateway = %config.gateway.host,
        ttl_secs = config.notification_ttl.as_secs(),
        max_subscriptions_per_user = config.max_subscriptions_per_user,
        "Starting relay"
    );

    let runtime = match RelayRuntime::build(config).await {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = ?e, "Startup failed");
            return Err(e);
        }
    };

    info!("Relay is running. Press Ctrl+C to stop.");
    runtime.run(shutdown_signal()).await?;

    info!("Relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C");
    }
}
