//! # Feed Runtime
//!
//! Owns the subsystem container and its background tasks.
//!
//! ## Background Tasks
//!
//! - **Cache invalidator**: applies every bus event to the response cache
//! - **Maintenance**: every cache sweep interval, sweeps expired cache
//!   state, purges tombstoned metrics and exports subsystem counters to
//!   the Prometheus collectors
//!
//! Live sessions are tasks of the notifier, not of the runtime.
//!
//! ## Shutdown Sequence
//!
//! 1. Drain live sessions (notifier grace period)
//! 2. Signal the background tasks and wait for them
//! 3. Export final counters

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use feed_telemetry::{
    advance, time_histogram, CACHE_DEGRADED, CACHE_ENTRIES, CACHE_EXPIRED, CACHE_FLUSHES,
    CACHE_HITS, CACHE_INVALIDATED, CACHE_MISSES, CACHE_REJECTED_FILLS, CACHE_STORES,
    EVENT_BUS_LAGGED, EVENT_BUS_PUBLISHED, EVENT_BUS_SUBSCRIBERS, LIVE_KEEPALIVES,
    LIVE_SAMPLE_FAILURES, LIVE_SESSIONS_ACTIVE, LIVE_SESSIONS_CLOSED, LIVE_SESSIONS_OPENED,
    LIVE_SESSIONS_REJECTED, LIVE_TICKS, LIVE_UPDATES, MAINTENANCE_DURATION, TOMBSTONES_PURGED,
};
use fl_01_metric_store::ContentMetricApi;
use fl_02_response_cache::{CacheInvalidator, SweepReport};
use shared_bus::EventPublisher;

use crate::container::{ContainerError, FeedConfig, FeedContainer};

/// How long `shutdown` waits for the background tasks.
const TASK_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// What one maintenance pass removed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub sweep: SweepReport,
    pub tombstones_purged: usize,
}

/// Outcome of a shutdown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Live sessions that ended within the grace period.
    pub sessions_drained: usize,
    /// Background tasks that stopped on their own.
    pub tasks_stopped: usize,
}

/// The running service.
pub struct FeedRuntime {
    container: Arc<FeedContainer>,
    shutdown_tx: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    started: AtomicBool,
}

impl FeedRuntime {
    /// Build every subsystem. Nothing runs until `start`.
    pub fn new(config: FeedConfig) -> Result<Self, ContainerError> {
        info!("Creating Feedline runtime");
        let container = Arc::new(FeedContainer::new(config)?);
        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            container,
            shutdown_tx,
            tasks: Mutex::new(Vec::new()),
            started: AtomicBool::new(false),
        })
    }

    /// Get a reference to the subsystem container.
    pub fn container(&self) -> Arc<FeedContainer> {
        Arc::clone(&self.container)
    }

    /// Spawn the background tasks. Must be called within a tokio runtime.
    pub fn start(&self) -> Result<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            bail!("runtime already started");
        }

        let invalidator = CacheInvalidator::new(
            Arc::clone(&self.container.cache),
            &self.container.event_bus,
        );
        let invalidator_task = tokio::spawn(invalidator.run(self.shutdown_tx.subscribe()));

        let maintenance_task = tokio::spawn(maintenance_loop(
            Arc::clone(&self.container),
            self.shutdown_tx.subscribe(),
        ));

        self.tasks.lock().extend([invalidator_task, maintenance_task]);

        info!(
            sweep_interval_secs = self.container.config.cache.sweep_interval_secs,
            "Feedline runtime started"
        );
        Ok(())
    }

    /// Stop accepting work and drain everything.
    pub async fn shutdown(&self) -> ShutdownReport {
        info!("Initiating graceful shutdown...");

        let sessions_drained = self.container.notifier.shutdown().await;

        if self.shutdown_tx.send(true).is_err() {
            debug!("No background task was listening for shutdown");
        }

        let tasks = std::mem::take(&mut *self.tasks.lock());
        let mut tasks_stopped = 0;
        for mut task in tasks {
            match tokio::time::timeout(TASK_DRAIN_TIMEOUT, &mut task).await {
                Ok(Ok(())) => tasks_stopped += 1,
                Ok(Err(e)) => error!(error = %e, "Background task failed"),
                Err(_) => {
                    warn!("Background task did not stop in time, aborting");
                    task.abort();
                }
            }
        }

        export_metrics(&self.container).await;
        info!(sessions_drained, tasks_stopped, "Shutdown complete");

        ShutdownReport {
            sessions_drained,
            tasks_stopped,
        }
    }
}

async fn maintenance_loop(container: Arc<FeedContainer>, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = interval(container.config.cache.sweep_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                run_maintenance(&container).await;
                export_metrics(&container).await;
            }
        }
    }
    debug!("Maintenance loop stopped");
}

/// One maintenance pass over the cache and the metric store.
pub async fn run_maintenance(container: &FeedContainer) -> MaintenanceReport {
    let _timer = time_histogram!(MAINTENANCE_DURATION);

    let sweep = container.cache.sweep().await;
    let tombstones_purged = if container.config.runtime.purge_tombstones {
        container.metric_store.purge_tombstones()
    } else {
        0
    };
    TOMBSTONES_PURGED.inc_by(tombstones_purged as u64);

    let report = MaintenanceReport {
        sweep,
        tombstones_purged,
    };
    debug!(?report, "Maintenance pass finished");
    report
}

/// Copy subsystem counters into the Prometheus collectors.
pub async fn export_metrics(container: &FeedContainer) {
    let cache = container.cache.metrics().snapshot();
    advance(&CACHE_HITS, cache.hits);
    advance(&CACHE_MISSES, cache.misses);
    advance(&CACHE_DEGRADED, cache.degraded);
    advance(&CACHE_STORES, cache.stores);
    advance(&CACHE_REJECTED_FILLS, cache.rejected_fills);
    advance(&CACHE_INVALIDATED, cache.invalidated);
    advance(&CACHE_FLUSHES, cache.flushes);
    advance(&CACHE_EXPIRED, cache.expired);
    CACHE_ENTRIES.set(gauge(container.cache.entries().await));

    let live = container.notifier.metrics().snapshot();
    advance(&LIVE_SESSIONS_OPENED, live.sessions_opened);
    advance(&LIVE_SESSIONS_CLOSED, live.sessions_closed);
    advance(&LIVE_SESSIONS_REJECTED, live.sessions_rejected);
    advance(&LIVE_TICKS, live.ticks);
    advance(&LIVE_UPDATES, live.updates_sent);
    advance(&LIVE_KEEPALIVES, live.keepalives_sent);
    advance(&LIVE_SAMPLE_FAILURES, live.sample_failures);
    LIVE_SESSIONS_ACTIVE.set(gauge(container.notifier.active_sessions()));

    let bus = &container.event_bus;
    advance(&EVENT_BUS_PUBLISHED, bus.events_published());
    advance(&EVENT_BUS_LAGGED, bus.events_lagged());
    EVENT_BUS_SUBSCRIBERS.set(gauge(bus.subscriber_count()));

    debug!(hit_ratio = cache.hit_ratio(), "Exported subsystem metrics");
}

fn gauge(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
