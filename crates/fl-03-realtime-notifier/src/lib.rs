//! # FL-03 Realtime Notifier
//!
//! Pushes each connected client's unread message count whenever it changes,
//! and a keepalive otherwise, at most once per tick.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): `UnreadCounterSession` change detection,
//!   `LiveUpdate` wire encoding, `NotifierConfig`
//! - **Ports Layer** (`ports/`): `UnreadCountSource` (driven port)
//! - **Service Layer** (`service/`): `RealtimeNotifier` and the per-session
//!   detection loop
//! - **Adapters Layer** (`adapters/`): server-sent-events framing
//!
//! ## Session lifecycle
//!
//! `Connected -> tick* -> Disconnected`. A session ends on `unsubscribe`,
//! `disconnect_user`, `shutdown`, or when the client drops its
//! `LiveChannel`, including while a sample is in flight. The session's bus
//! subscription is released when its loop ends.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod adapters;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

pub use adapters::{sse_frames, SSE_CONTENT_TYPE};
pub use domain::{LiveUpdate, NotifierConfig, SessionId, TickOutcome, UnreadCounterSession};
pub use error::NotifierError;
pub use metrics::{NotifierMetrics, NotifierMetricsSnapshot};
pub use ports::UnreadCountSource;
pub use service::{LiveChannel, RealtimeNotifier, SessionExit};
