//! Error types for the Metric Store subsystem

use shared_types::{ContentKind, EntityRef, UserId};
use thiserror::Error;

use crate::domain::Counter;

/// Errors that can occur in the Metric Store subsystem
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MetricError {
    #[error("Metric not found: {entity}")]
    NotFound { entity: EntityRef },

    #[error("Metric already exists: {entity}")]
    AlreadyExists { entity: EntityRef },

    #[error("Version conflict on {entity}: expected {expected}, found {actual}")]
    VersionConflict {
        entity: EntityRef,
        expected: u64,
        actual: u64,
    },

    #[error("Counter {counter:?} does not apply to {entity}")]
    CounterMismatch { entity: EntityRef, counter: Counter },

    #[error("{submitted} counters submitted for {entity}")]
    CounterKindMismatch {
        entity: EntityRef,
        submitted: ContentKind,
    },

    #[error("Replacement targets {actual} but was submitted for {expected}")]
    EntityMismatch {
        expected: EntityRef,
        actual: EntityRef,
    },

    #[error("User metric not found: {user_id}")]
    UserNotFound { user_id: UserId },

    #[error("User metric already exists: {user_id}")]
    UserAlreadyExists { user_id: UserId },

    #[error("Experience grants must be non-negative, got {amount}")]
    NegativeExperienceGrant { amount: i64 },

    #[error("User {user_id} is not allowed to adjust experience")]
    Unauthorized { user_id: UserId },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
