//! Prometheus metrics for Feedline subsystems.
//!
//! All metrics follow the naming convention: `fl_<subsystem>_<metric>_<unit>`
//!
//! Subsystems count with their own atomics; the runtime copies their
//! snapshots into these collectors with [`advance`] and [`IntGauge::set`].

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry,
    TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // RESPONSE CACHE METRICS (fl-02)
    // =========================================================================

    pub static ref CACHE_HITS: IntCounter = IntCounter::new(
        "fl_cache_hits_total",
        "Lookups answered from the response cache"
    ).expect("metric creation failed");

    pub static ref CACHE_MISSES: IntCounter = IntCounter::new(
        "fl_cache_misses_total",
        "Lookups that found no live entry"
    ).expect("metric creation failed");

    pub static ref CACHE_DEGRADED: IntCounter = IntCounter::new(
        "fl_cache_degraded_total",
        "Cache backend failures absorbed as a miss"
    ).expect("metric creation failed");

    pub static ref CACHE_STORES: IntCounter = IntCounter::new(
        "fl_cache_stores_total",
        "Entries written to the response cache"
    ).expect("metric creation failed");

    pub static ref CACHE_REJECTED_FILLS: IntCounter = IntCounter::new(
        "fl_cache_rejected_fills_total",
        "Fills dropped because an invalidation overtook them"
    ).expect("metric creation failed");

    pub static ref CACHE_INVALIDATED: IntCounter = IntCounter::new(
        "fl_cache_invalidated_total",
        "Entries removed by event driven invalidation"
    ).expect("metric creation failed");

    pub static ref CACHE_FLUSHES: IntCounter = IntCounter::new(
        "fl_cache_flushes_total",
        "Whole cache flushes after the invalidator lagged"
    ).expect("metric creation failed");

    pub static ref CACHE_EXPIRED: IntCounter = IntCounter::new(
        "fl_cache_expired_total",
        "Expired entries removed by the maintenance sweep"
    ).expect("metric creation failed");

    pub static ref CACHE_ENTRIES: IntGauge = IntGauge::new(
        "fl_cache_entries",
        "Entries currently held by the cache backend"
    ).expect("metric creation failed");

    // =========================================================================
    // REALTIME NOTIFIER METRICS (fl-03)
    // =========================================================================

    pub static ref LIVE_SESSIONS_OPENED: IntCounter = IntCounter::new(
        "fl_notifier_sessions_opened_total",
        "Live unread counter sessions opened"
    ).expect("metric creation failed");

    pub static ref LIVE_SESSIONS_CLOSED: IntCounter = IntCounter::new(
        "fl_notifier_sessions_closed_total",
        "Live unread counter sessions closed"
    ).expect("metric creation failed");

    pub static ref LIVE_SESSIONS_REJECTED: IntCounter = IntCounter::new(
        "fl_notifier_sessions_rejected_total",
        "Subscriptions refused by the per-user session limit"
    ).expect("metric creation failed");

    pub static ref LIVE_SESSIONS_ACTIVE: IntGauge = IntGauge::new(
        "fl_notifier_sessions_active",
        "Live sessions currently running"
    ).expect("metric creation failed");

    pub static ref LIVE_TICKS: IntCounter = IntCounter::new(
        "fl_notifier_ticks_total",
        "Ticks processed across all live sessions"
    ).expect("metric creation failed");

    pub static ref LIVE_UPDATES: IntCounter = IntCounter::new(
        "fl_notifier_updates_sent_total",
        "Changed counts pushed to clients"
    ).expect("metric creation failed");

    pub static ref LIVE_KEEPALIVES: IntCounter = IntCounter::new(
        "fl_notifier_keepalives_sent_total",
        "Keepalives pushed to clients"
    ).expect("metric creation failed");

    pub static ref LIVE_SAMPLE_FAILURES: IntCounter = IntCounter::new(
        "fl_notifier_sample_failures_total",
        "Unread count samples that failed"
    ).expect("metric creation failed");

    // =========================================================================
    // EVENT BUS METRICS
    // =========================================================================

    pub static ref EVENT_BUS_PUBLISHED: IntCounter = IntCounter::new(
        "fl_eventbus_published_total",
        "Domain events published on the bus"
    ).expect("metric creation failed");

    pub static ref EVENT_BUS_LAGGED: IntCounter = IntCounter::new(
        "fl_eventbus_lagged_total",
        "Events lost by lagging subscribers"
    ).expect("metric creation failed");

    pub static ref EVENT_BUS_SUBSCRIBERS: IntGauge = IntGauge::new(
        "fl_eventbus_subscribers",
        "Active bus subscriptions"
    ).expect("metric creation failed");

    // =========================================================================
    // METRIC STORE AND MAINTENANCE
    // =========================================================================

    pub static ref TOMBSTONES_PURGED: IntCounter = IntCounter::new(
        "fl_metric_store_tombstones_purged_total",
        "Tombstoned metric records physically removed"
    ).expect("metric creation failed");

    pub static ref MAINTENANCE_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "fl_runtime_maintenance_duration_seconds",
            "Time spent in one maintenance pass"
        ).buckets(exponential_buckets(0.0001, 2.0, 14).expect("valid buckets"))
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Registering twice is harmless.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Cache
        Box::new(CACHE_HITS.clone()),
        Box::new(CACHE_MISSES.clone()),
        Box::new(CACHE_DEGRADED.clone()),
        Box::new(CACHE_STORES.clone()),
        Box::new(CACHE_REJECTED_FILLS.clone()),
        Box::new(CACHE_INVALIDATED.clone()),
        Box::new(CACHE_FLUSHES.clone()),
        Box::new(CACHE_EXPIRED.clone()),
        Box::new(CACHE_ENTRIES.clone()),
        // Notifier
        Box::new(LIVE_SESSIONS_OPENED.clone()),
        Box::new(LIVE_SESSIONS_CLOSED.clone()),
        Box::new(LIVE_SESSIONS_REJECTED.clone()),
        Box::new(LIVE_SESSIONS_ACTIVE.clone()),
        Box::new(LIVE_TICKS.clone()),
        Box::new(LIVE_UPDATES.clone()),
        Box::new(LIVE_KEEPALIVES.clone()),
        Box::new(LIVE_SAMPLE_FAILURES.clone()),
        // Event Bus
        Box::new(EVENT_BUS_PUBLISHED.clone()),
        Box::new(EVENT_BUS_LAGGED.clone()),
        Box::new(EVENT_BUS_SUBSCRIBERS.clone()),
        // Store and runtime
        Box::new(TOMBSTONES_PURGED.clone()),
        Box::new(MAINTENANCE_DURATION.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Move a counter forward to a subsystem's running total.
///
/// Totals only grow, so a total below the counter (a restarted subsystem)
/// leaves it untouched.
pub fn advance(counter: &IntCounter, total: u64) {
    let current = counter.get();
    if total > current {
        counter.inc_by(total - current);
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
