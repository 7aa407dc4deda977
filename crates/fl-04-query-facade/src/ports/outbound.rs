//! Outbound Ports (Driven Ports)
//!
//! The persistent store, consumed through two narrow queries.

use async_trait::async_trait;
use shared_types::{SourceError, Subject, UserId};

use crate::domain::QueryParams;

/// One page read from the store
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FetchedPage {
    pub items: Vec<serde_json::Value>,
    pub total_rows: u64,
    /// Subjects besides the query's own that the page was built from
    /// (authors, embedded tweets). Their invalidation evicts the page.
    pub dependencies: Vec<Subject>,
}

/// Paginated listing queries (Driven Port)
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn fetch_page(&self, params: &QueryParams) -> Result<FetchedPage, SourceError>;
}

/// Unread message counts (Driven Port)
#[async_trait]
pub trait UnreadMessageSource: Send + Sync {
    async fn unread_count(&self, user_id: UserId) -> Result<i64, SourceError>;
}
