//! Domain layer for the Realtime Notifier

pub mod config;
pub mod session;

pub use config::NotifierConfig;
pub use session::{LiveUpdate, SessionId, TickOutcome, UnreadCounterSession};
