//! Domain layer for the Response Cache

pub mod config;
pub mod invalidation;
pub mod key;

pub use config::{CacheConfig, MAX_TTL_SECS};
pub use invalidation::{invalidation_targets, InvalidationTarget};
pub use key::{CacheKey, PageWindow, UNREAD_STYLE};
