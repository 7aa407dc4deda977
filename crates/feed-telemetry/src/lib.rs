//! # Feed Telemetry
//!
//! Logging and metrics for the Feedline runtime.
//!
//! ## Components
//!
//! - **Logs**: `tracing-subscriber` registry with env filter, human readable
//!   or JSON output
//! - **Metrics**: Prometheus collectors in a process-wide registry, fed from
//!   subsystem snapshots and rendered in the text exposition format
//!
//! ## Usage
//!
//! ```rust,ignore
//! use feed_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_telemetry(TelemetryConfig::from_env())?;
//!     // Subsystem logs are now collected
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `FL_SERVICE_NAME` | `feedline` | Service name in logs |
//! | `FL_LOG_LEVEL` | `info` | Log filter (falls back to `RUST_LOG`) |
//! | `FL_JSON_LOGS` | `false` | JSON log lines (`true` in containers) |
//! | `FL_CONSOLE_OUTPUT` | `true` | Write logs to stdout |

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    advance, encode_metrics, register_metrics, HistogramTimer, CACHE_DEGRADED, CACHE_ENTRIES,
    CACHE_EXPIRED, CACHE_FLUSHES, CACHE_HITS, CACHE_INVALIDATED, CACHE_MISSES,
    CACHE_REJECTED_FILLS, CACHE_STORES, EVENT_BUS_LAGGED, EVENT_BUS_PUBLISHED,
    EVENT_BUS_SUBSCRIBERS, LIVE_KEEPALIVES, LIVE_SAMPLE_FAILURES, LIVE_SESSIONS_ACTIVE,
    LIVE_SESSIONS_CLOSED, LIVE_SESSIONS_OPENED, LIVE_SESSIONS_REJECTED, LIVE_TICKS,
    LIVE_UPDATES, MAINTENANCE_DURATION, TOMBSTONES_PURGED,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggerInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Initialize logging and register metrics.
///
/// Returns a guard to hold for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    register_metrics()?;
    init_logging(&config)?;

    Ok(TelemetryGuard {
        service_name: config.service_name,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}
