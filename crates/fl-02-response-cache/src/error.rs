//! Error types for the Response Cache subsystem

use thiserror::Error;

/// Errors that can occur in the Response Cache subsystem
///
/// Backend errors never reach callers of `ResponseCache`; they are logged,
/// counted and turned into a miss or a skipped store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache backend unavailable: {0}")]
    Unavailable(String),

    #[error("Cache backend rejected operation: {0}")]
    Backend(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
