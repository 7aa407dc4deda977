//! Adapters layer for the Response Cache
//!
//! - `InMemoryCacheBackend`: process-local `CacheBackend`
//! - `CacheInvalidator`: event bus subscriber applying invalidations

pub mod invalidator;
pub mod memory_backend;

pub use invalidator::CacheInvalidator;
pub use memory_backend::InMemoryCacheBackend;
