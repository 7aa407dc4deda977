//! Ports layer for the Realtime Notifier

pub mod outbound;

pub use outbound::UnreadCountSource;
