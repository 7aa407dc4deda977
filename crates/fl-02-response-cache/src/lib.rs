//! # FL-02 Response Cache
//!
//! Cache-aside storage for serialized query responses, kept fresh by
//! invalidations derived from domain events.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`)
//!   - `CacheKey`: `{subject}:{style}:{pageSize}:{offset}` keys
//!   - `invalidation_targets`: the event to invalidation mapping table
//!   - `CacheConfig`
//! - **Ports Layer** (`ports/`): `CacheBackend` (driven port)
//! - **Service Layer** (`service/`): `ResponseCache` with the fill guard
//! - **Adapters Layer** (`adapters/`)
//!   - `InMemoryCacheBackend`
//!   - `CacheInvalidator`: bus subscriber task
//!
//! ## Guarantees
//!
//! - An entry is served only while unexpired and not invalidated since it
//!   was written
//! - Backend failures degrade to misses and skipped stores
//! - A lagging invalidator flushes everything rather than serve stale data

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod adapters;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

pub use adapters::{CacheInvalidator, InMemoryCacheBackend};
pub use domain::{
    invalidation_targets, CacheConfig, CacheKey, InvalidationTarget, PageWindow, MAX_TTL_SECS,
};
pub use error::CacheError;
pub use metrics::{CacheMetrics, CacheMetricsSnapshot};
pub use ports::CacheBackend;
pub use service::{FillTicket, ResponseCache, SweepReport};
