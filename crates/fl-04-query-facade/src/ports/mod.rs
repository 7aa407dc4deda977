//! Ports layer for the Query Facade

pub mod outbound;

pub use outbound::{FetchedPage, ListingSource, UnreadMessageSource};
