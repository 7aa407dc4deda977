//! Service layer for the Response Cache

pub mod response_cache;

pub use response_cache::{FillTicket, ResponseCache, SweepReport};
