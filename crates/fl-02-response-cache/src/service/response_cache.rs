//! Response Cache Service
//!
//! Cache-aside over a `CacheBackend`, with subject-prefix invalidation, a
//! dependency index and a fill guard.
//!
//! ## Fill guard
//!
//! A reader that misses takes a `FillTicket` before it queries the source.
//! Every invalidation advances a global epoch and stamps the invalidated
//! subject (or key). `put_filled` refuses to store when the key's subject,
//! the key itself or one of the declared dependencies was stamped after the
//! ticket was issued, so a slow fill can never overwrite fresher state with
//! data read before the invalidation. The check runs again after the write
//! and the entry is removed if an invalidation slipped in between.

use bytes::Bytes;
use dashmap::DashMap;
use shared_bus::DomainEvent;
use shared_types::Subject;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::domain::{
    invalidation_targets, CacheConfig, CacheKey, InvalidationTarget, MAX_TTL_SECS,
};
use crate::error::CacheError;
use crate::metrics::CacheMetrics;
use crate::ports::CacheBackend;

/// Last invalidation of a subject or key
#[derive(Clone, Copy, Debug)]
struct GuardMark {
    epoch: u64,
    at: Instant,
}

/// Permission to store the result of a fill
#[derive(Clone, Debug)]
pub struct FillTicket {
    key: CacheKey,
    epoch: u64,
    issued_at: Instant,
}

impl FillTicket {
    pub fn key(&self) -> &CacheKey {
        &self.key
    }
}

/// What a maintenance sweep removed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub expired_entries: usize,
    pub guard_marks: usize,
    pub dependency_links: usize,
}

/// Cache-aside response cache
pub struct ResponseCache<B: CacheBackend> {
    backend: Arc<B>,
    config: CacheConfig,
    epoch: AtomicU64,
    flushed_epoch: AtomicU64,
    subject_marks: DashMap<Subject, GuardMark>,
    key_marks: DashMap<String, GuardMark>,
    /// dependency subject -> keys that declared it, with their expiry
    dependents: DashMap<Subject, HashMap<String, Instant>>,
    metrics: Arc<CacheMetrics>,
}

impl<B: CacheBackend> ResponseCache<B> {
    /// Create a cache over `backend` with a validated configuration
    pub fn new(backend: Arc<B>, config: CacheConfig) -> Result<Self, CacheError> {
        config.validate()?;
        Ok(Self {
            backend,
            config,
            epoch: AtomicU64::new(0),
            flushed_epoch: AtomicU64::new(0),
            subject_marks: DashMap::new(),
            key_marks: DashMap::new(),
            dependents: DashMap::new(),
            metrics: Arc::new(CacheMetrics::new()),
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn metrics(&self) -> Arc<CacheMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Look up a live entry. Backend failure reads as a miss.
    pub async fn get(&self, key: &CacheKey) -> Option<Bytes> {
        let rendered = key.render();
        let found = self
            .absorb("get", self.backend.get(&rendered).await)
            .flatten();

        if found.is_some() {
            CacheMetrics::incr(&self.metrics.hits);
            trace!(key = %rendered, "Cache hit");
        } else {
            CacheMetrics::incr(&self.metrics.misses);
            trace!(key = %rendered, "Cache miss");
        }
        found
    }

    /// Store without a fill guard. Concurrent puts to one key are
    /// last-writer-wins. Returns whether the entry was stored.
    pub async fn put(&self, key: &CacheKey, payload: Bytes, ttl: Duration) -> bool {
        self.put_with_dependencies(key, payload, ttl, &[]).await
    }

    /// Store without a fill guard, registering the subjects the payload was
    /// derived from besides its own.
    pub async fn put_with_dependencies(
        &self,
        key: &CacheKey,
        payload: Bytes,
        ttl: Duration,
        dependencies: &[Subject],
    ) -> bool {
        self.store(key, payload, ttl, dependencies).await
    }

    /// Start a guarded fill for `key`. Take the ticket before reading the
    /// source of truth.
    pub fn fill_ticket(&self, key: &CacheKey) -> FillTicket {
        FillTicket {
            key: key.clone(),
            epoch: self.epoch.load(Ordering::SeqCst),
            issued_at: Instant::now(),
        }
    }

    /// Finish a guarded fill. Returns `false` when an invalidation touching
    /// the key or its dependencies happened after the ticket was issued.
    pub async fn put_filled(
        &self,
        ticket: FillTicket,
        payload: Bytes,
        ttl: Duration,
        dependencies: &[Subject],
    ) -> bool {
        if self.is_stale(&ticket, dependencies) {
            CacheMetrics::incr(&self.metrics.rejected_fills);
            debug!(key = %ticket.key, "Dropping fill overtaken by invalidation");
            return false;
        }

        if !self.store(&ticket.key, payload, ttl, dependencies).await {
            return false;
        }

        if self.is_stale(&ticket, dependencies) {
            let rendered = ticket.key.render();
            self.absorb("delete", self.backend.delete(&rendered).await);
            CacheMetrics::incr(&self.metrics.rejected_fills);
            debug!(key = %rendered, "Removed fill invalidated during write");
            return false;
        }
        true
    }

    /// Remove every entry under the subject's key prefix.
    pub async fn invalidate(&self, subject: Subject) -> usize {
        self.mark_subject(subject);
        let removed = self
            .absorb(
                "delete_prefix",
                self.backend.delete_prefix(&subject.key_prefix()).await,
            )
            .unwrap_or(0);
        CacheMetrics::add(&self.metrics.invalidated, removed);
        trace!(subject = %subject, removed, "Invalidated subject");
        removed
    }

    /// Remove every entry that declared `subject` as a dependency.
    pub async fn invalidate_dependents(&self, subject: Subject) -> usize {
        self.mark_subject(subject);
        let Some((_, keys)) = self.dependents.remove(&subject) else {
            return 0;
        };

        let mut removed = 0;
        for key in keys.keys() {
            if let Some(true) = self.absorb("delete", self.backend.delete(key).await) {
                removed += 1;
            }
        }
        CacheMetrics::add(&self.metrics.invalidated, removed);
        trace!(subject = %subject, removed, "Invalidated dependents");
        removed
    }

    /// Remove exactly one key.
    pub async fn invalidate_key(&self, key: &CacheKey) -> bool {
        let rendered = key.render();
        self.mark_key(&rendered);
        let removed = self
            .absorb("delete", self.backend.delete(&rendered).await)
            .unwrap_or(false);
        if removed {
            CacheMetrics::incr(&self.metrics.invalidated);
        }
        removed
    }

    /// Apply the invalidations a domain event maps to.
    pub async fn apply_event(&self, event: &DomainEvent) -> usize {
        let mut removed = 0;
        for target in invalidation_targets(event) {
            removed += match target {
                InvalidationTarget::Subject(subject) => self.invalidate(subject).await,
                InvalidationTarget::Dependents(subject) => {
                    self.invalidate_dependents(subject).await
                }
                InvalidationTarget::Key(key) => usize::from(self.invalidate_key(&key).await),
            };
        }
        removed
    }

    /// Drop everything and void every outstanding fill ticket.
    pub async fn flush(&self) -> usize {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.flushed_epoch.fetch_max(epoch, Ordering::SeqCst);
        self.dependents.clear();

        let removed = self
            .absorb("clear", self.backend.clear().await)
            .unwrap_or(0);
        CacheMetrics::incr(&self.metrics.flushes);
        info!(removed, "Flushed response cache");
        removed
    }

    /// Remove expired entries, guard marks older than the fill window and
    /// dependency links of expired entries.
    pub async fn sweep(&self) -> SweepReport {
        let now = Instant::now();
        let window = self.config.fill_guard_window();

        let expired_entries = self
            .absorb("purge_expired", self.backend.purge_expired().await)
            .unwrap_or(0);
        CacheMetrics::add(&self.metrics.expired, expired_entries);

        let marks_before = self.subject_marks.len() + self.key_marks.len();
        self.subject_marks
            .retain(|_, mark| now.duration_since(mark.at) < window);
        self.key_marks
            .retain(|_, mark| now.duration_since(mark.at) < window);
        let guard_marks =
            marks_before.saturating_sub(self.subject_marks.len() + self.key_marks.len());

        let mut dependency_links = 0;
        self.dependents.retain(|_, keys| {
            let before = keys.len();
            keys.retain(|_, expires_at| now < *expires_at);
            dependency_links += before - keys.len();
            !keys.is_empty()
        });

        let report = SweepReport {
            expired_entries,
            guard_marks,
            dependency_links,
        };
        debug!(?report, "Cache sweep finished");
        report
    }

    /// Entries held by the backend, 0 when it cannot be reached
    pub async fn entries(&self) -> usize {
        self.absorb("len", self.backend.len().await).unwrap_or(0)
    }

    async fn store(
        &self,
        key: &CacheKey,
        payload: Bytes,
        ttl: Duration,
        dependencies: &[Subject],
    ) -> bool {
        let rendered = key.render();
        let ttl = ttl.min(Duration::from_secs(MAX_TTL_SECS));
        if self
            .absorb("set", self.backend.set(&rendered, payload, ttl).await)
            .is_none()
        {
            return false;
        }

        let expires_at = Instant::now() + ttl;
        for dependency in dependencies {
            self.dependents
                .entry(*dependency)
                .or_default()
                .insert(rendered.clone(), expires_at);
        }
        CacheMetrics::incr(&self.metrics.stores);
        trace!(key = %rendered, ttl_secs = ttl.as_secs(), "Stored entry");
        true
    }

    fn is_stale(&self, ticket: &FillTicket, dependencies: &[Subject]) -> bool {
        if ticket.issued_at.elapsed() >= self.config.fill_guard_window() {
            return true;
        }
        if self.flushed_epoch.load(Ordering::SeqCst) > ticket.epoch {
            return true;
        }

        let newer = |mark: Option<GuardMark>| mark.is_some_and(|m| m.epoch > ticket.epoch);
        let subject_mark = |subject: &Subject| self.subject_marks.get(subject).map(|m| *m);

        newer(subject_mark(&ticket.key.subject()))
            || newer(self.key_marks.get(&ticket.key.render()).map(|m| *m))
            || dependencies.iter().any(|dep| newer(subject_mark(dep)))
    }

    fn next_mark(&self) -> GuardMark {
        GuardMark {
            epoch: self.epoch.fetch_add(1, Ordering::SeqCst) + 1,
            at: Instant::now(),
        }
    }

    fn mark_subject(&self, subject: Subject) {
        let mark = self.next_mark();
        self.subject_marks
            .entry(subject)
            .and_modify(|current| {
                if mark.epoch > current.epoch {
                    *current = mark;
                }
            })
            .or_insert(mark);
    }

    fn mark_key(&self, key: &str) {
        let mark = self.next_mark();
        self.key_marks
            .entry(key.to_owned())
            .and_modify(|current| {
                if mark.epoch > current.epoch {
                    *current = mark;
                }
            })
            .or_insert(mark);
    }

    fn absorb<T>(&self, operation: &'static str, result: Result<T, CacheError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                CacheMetrics::incr(&self.metrics.degraded);
                warn!(operation, error = %e, "Cache backend failure, degrading");
                None
            }
        }
    }
}
