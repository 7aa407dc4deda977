//! Service layer for the Query Facade

pub mod query_facade;
pub mod unread_counter;

pub use query_facade::{QueryFacade, QueryResponse};
pub use unread_counter::UnreadCounter;
