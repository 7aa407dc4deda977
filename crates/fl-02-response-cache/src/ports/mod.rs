//! Ports layer for the Response Cache

pub mod outbound;

pub use outbound::CacheBackend;
