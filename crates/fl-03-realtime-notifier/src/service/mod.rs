//! Service layer for the Realtime Notifier
//!
//! - `RealtimeNotifier`: session lifecycle
//! - `SessionLoop`: the per-connection detection loop
//! - `SessionRegistry`: sessions by id and by user

pub mod notifier;
mod registry;
mod session_loop;

pub use notifier::{LiveChannel, RealtimeNotifier};
pub use session_loop::SessionExit;
