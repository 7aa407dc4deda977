//! Realtime notifier counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for live sessions
#[derive(Debug, Default)]
pub struct NotifierMetrics {
    pub sessions_opened: AtomicU64,
    pub sessions_closed: AtomicU64,
    /// Sessions refused by the per-user limit
    pub sessions_rejected: AtomicU64,
    pub ticks: AtomicU64,
    pub updates_sent: AtomicU64,
    pub keepalives_sent: AtomicU64,
    /// Samples that failed and were answered with a keepalive
    pub sample_failures: AtomicU64,
}

impl NotifierMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Sessions currently running
    pub fn active_sessions(&self) -> u64 {
        let opened = self.sessions_opened.load(Ordering::Relaxed);
        opened.saturating_sub(self.sessions_closed.load(Ordering::Relaxed))
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> NotifierMetricsSnapshot {
        NotifierMetricsSnapshot {
            sessions_opened: self.sessions_opened.load(Ordering::Relaxed),
            sessions_closed: self.sessions_closed.load(Ordering::Relaxed),
            sessions_rejected: self.sessions_rejected.load(Ordering::Relaxed),
            ticks: self.ticks.load(Ordering::Relaxed),
            updates_sent: self.updates_sent.load(Ordering::Relaxed),
            keepalives_sent: self.keepalives_sent.load(Ordering::Relaxed),
            sample_failures: self.sample_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of `NotifierMetrics`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NotifierMetricsSnapshot {
    pub sessions_opened: u64,
    pub sessions_closed: u64,
    pub sessions_rejected: u64,
    pub ticks: u64,
    pub updates_sent: u64,
    pub keepalives_sent: u64,
    pub sample_failures: u64,
}
