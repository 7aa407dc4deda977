//! # Error Types
//!
//! Errors reported by external collaborators (the persistent store) through
//! the outbound ports of the subsystems.

use thiserror::Error;

/// Errors from the authoritative data source.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    /// The requested record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The store could not be reached.
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    /// The store rejected or failed the query.
    #[error("Query failed: {0}")]
    Query(String),
}
