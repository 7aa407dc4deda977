//! Outbound Ports (Driven Ports)
//!
//! The key/value store that holds serialized responses. A deployment may
//! back it with an external cache server; the crate ships an in-memory
//! implementation.

use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

use crate::error::CacheError;

/// Key/value cache backend (Driven Port)
///
/// Expired entries must never be returned by `get`.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Fetch a live entry
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError>;

    /// Store or replace an entry
    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError>;

    /// Remove one entry. Returns whether it existed.
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;

    /// Remove every entry whose key starts with `prefix`
    async fn delete_prefix(&self, prefix: &str) -> Result<usize, CacheError>;

    /// Remove everything
    async fn clear(&self) -> Result<usize, CacheError>;

    /// Drop expired entries
    async fn purge_expired(&self) -> Result<usize, CacheError>;

    /// Number of stored entries, expired ones included
    async fn len(&self) -> Result<usize, CacheError>;
}
