//! # Shared Bus - In-Process Event Bus
//!
//! Carries domain events from the write paths (metric updates, message
//! actions, profile edits) to the passive subscribers that keep derived
//! state fresh (response cache invalidation, live unread counters).
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────────┐
//! │ Metric Store │    publish()       │ Cache Invalidator│
//! │ Msg handlers │ ──────┐            │ Live Sessions    │
//! └──────────────┘       │            └──────────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐           │
//!                  │  Event Bus   │ ──────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! ## Delivery Guarantees
//!
//! - `publish` never blocks the publisher
//! - Every subscriber sees events in publish order
//! - Per-subscriber buffers are bounded; overflow drops the oldest events and
//!   reports `SubscriptionError::Lagged` so the subscriber can reset

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{DomainEvent, EventFilter, EventKind};
pub use publisher::{BusStats, EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before the oldest are dropped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;
