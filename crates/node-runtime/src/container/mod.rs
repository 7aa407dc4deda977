//! # Subsystem Container
//!
//! Central container holding every subsystem instance, plus the
//! configuration it is built from.

pub mod config;
pub mod subsystems;

pub use config::{ConfigError, FeedConfig, RuntimeConfig};
pub use subsystems::{ContainerError, FeedContainer};
