//! Domain layer for the Query Facade

pub mod config;
pub mod query;

pub use config::{FacadeConfig, TtlPolicy};
pub use query::{PageEnvelope, Pager, QueryParams};
