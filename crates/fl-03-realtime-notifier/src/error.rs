//! Error types for the Realtime Notifier subsystem

use shared_types::UserId;
use thiserror::Error;

/// Errors that can occur when opening live sessions
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifierError {
    #[error("User {user_id} already has {max} live sessions")]
    TooManySessions { user_id: UserId, max: usize },

    #[error("Notifier is shutting down")]
    ShuttingDown,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
