//! In-memory cache backend
//!
//! A sharded map of immutable payloads with absolute expiry. When full, the
//! entry closest to expiry is evicted.

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

use crate::error::CacheError;
use crate::ports::CacheBackend;

#[derive(Debug, Clone)]
struct StoredEntry {
    payload: Bytes,
    expires_at: Instant,
}

impl StoredEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// `CacheBackend` held in process memory
#[derive(Debug)]
pub struct InMemoryCacheBackend {
    entries: DashMap<String, StoredEntry>,
    max_entries: usize,
}

impl InMemoryCacheBackend {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries: max_entries.max(1),
        }
    }

    fn make_room(&self, now: Instant) {
        self.entries.retain(|_, entry| entry.is_live(now));
        if self.entries.len() < self.max_entries {
            return;
        }

        let victim = self
            .entries
            .iter()
            .min_by_key(|entry| entry.expires_at)
            .map(|entry| entry.key().clone());
        if let Some(key) = victim {
            trace!(key = %key, "Evicting entry closest to expiry");
            self.entries.remove(&key);
        }
    }
}

impl Default for InMemoryCacheBackend {
    fn default() -> Self {
        Self::new(crate::domain::CacheConfig::default().max_entries)
    }
}

#[async_trait]
impl CacheBackend for InMemoryCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        let now = Instant::now();
        let live = self
            .entries
            .get(key)
            .map(|entry| entry.is_live(now).then(|| entry.payload.clone()));

        match live {
            Some(Some(payload)) => Ok(Some(payload)),
            Some(None) => {
                self.entries.remove_if(key, |_, entry| !entry.is_live(now));
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError> {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .ok_or_else(|| CacheError::Backend(format!("ttl of {ttl:?} overflows the clock")))?;
        if !self.entries.contains_key(key) && self.entries.len() >= self.max_entries {
            self.make_room(now);
        }
        self.entries.insert(
            key.to_owned(),
            StoredEntry {
                payload: value,
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.entries.remove(key).is_some())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<usize, CacheError> {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(prefix));
        Ok(before.saturating_sub(self.entries.len()))
    }

    async fn clear(&self) -> Result<usize, CacheError> {
        let removed = self.entries.len();
        self.entries.clear();
        Ok(removed)
    }

    async fn purge_expired(&self) -> Result<usize, CacheError> {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        Ok(before.saturating_sub(self.entries.len()))
    }

    async fn len(&self) -> Result<usize, CacheError> {
        Ok(self.entries.len())
    }
}
