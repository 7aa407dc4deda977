//! Error types for the Query Facade subsystem

use shared_types::SourceError;
use thiserror::Error;

/// Errors returned by `QueryFacade::query`
///
/// Cache failures never appear here; they degrade to a source read.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Invalid query parameters: {0}")]
    InvalidParams(String),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for QueryError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
