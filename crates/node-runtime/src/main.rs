//! # Feedline Node
//!
//! Entry point of the Feedline service process.
//!
//! ## Startup Sequence
//!
//! 1. Install logging and register metrics (`FL_LOG_LEVEL`, `FL_JSON_LOGS`)
//! 2. Load configuration (`FL_CONFIG` file, then `FL_*` overrides)
//! 3. Build every subsystem and start the background tasks
//! 4. Run until Ctrl+C, then drain live sessions and stop

use anyhow::{Context, Result};
use tracing::info;

use feed_telemetry::{init_telemetry, TelemetryConfig};
use node_runtime::{FeedConfig, FeedRuntime};

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry = init_telemetry(TelemetryConfig::from_env())
        .context("Failed to initialize telemetry")?;

    let config = FeedConfig::load().context("Failed to load configuration")?;

    let runtime = FeedRuntime::new(config).context("Failed to build subsystems")?;
    runtime.start()?;

    info!("Feedline is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    let report = runtime.shutdown().await;
    info!(
        sessions_drained = report.sessions_drained,
        "Feedline stopped"
    );
    Ok(())
}
