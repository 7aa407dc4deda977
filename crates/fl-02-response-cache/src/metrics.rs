//! Response cache counters
//!
//! Lock-free counters read by the runtime's metrics exporter.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for cache operations
#[derive(Debug, Default)]
pub struct CacheMetrics {
    /// Lookups answered from the cache
    pub hits: AtomicU64,
    /// Lookups that found nothing
    pub misses: AtomicU64,
    /// Backend failures absorbed as a miss or a skipped store
    pub degraded: AtomicU64,
    /// Entries written
    pub stores: AtomicU64,
    /// Fills dropped because an invalidation overtook them
    pub rejected_fills: AtomicU64,
    /// Entries removed by invalidation
    pub invalidated: AtomicU64,
    /// Whole-cache flushes
    pub flushes: AtomicU64,
    /// Expired entries removed by the sweep
    pub expired: AtomicU64,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add(counter: &AtomicU64, amount: usize) {
        counter.fetch_add(amount as u64, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> CacheMetricsSnapshot {
        CacheMetricsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            degraded: self.degraded.load(Ordering::Relaxed),
            stores: self.stores.load(Ordering::Relaxed),
            rejected_fills: self.rejected_fills.load(Ordering::Relaxed),
            invalidated: self.invalidated.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of `CacheMetrics`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheMetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub degraded: u64,
    pub stores: u64,
    pub rejected_fills: u64,
    pub invalidated: u64,
    pub flushes: u64,
    pub expired: u64,
}

impl CacheMetricsSnapshot {
    /// Fraction of lookups served from the cache
    pub fn hit_ratio(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}
