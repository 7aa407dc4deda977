//! # Node Runtime Library
//!
//! Wiring of the Feedline ranking and freshness core. The binary in
//! `main.rs` is a thin shell around [`FeedRuntime`].
//!
//! ## Architectural Patterns
//!
//! - **Event-Driven**: write paths publish domain events, derived state
//!   (cached responses, live counters) follows from the bus
//! - **Hexagonal Architecture**: subsystems define ports, `adapters/`
//!   implements the outbound ones
//! - **Single Container**: every subsystem is built once, in dependency
//!   order, by `container::FeedContainer`

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod container;
pub mod runtime;

pub use container::{ConfigError, ContainerError, FeedConfig, FeedContainer};
pub use runtime::{export_metrics, run_maintenance, FeedRuntime, MaintenanceReport, ShutdownReport};
