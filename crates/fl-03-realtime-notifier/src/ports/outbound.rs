//! Outbound Ports (Driven Ports)

use async_trait::async_trait;
use shared_types::{SourceError, UserId};

/// Where a session samples the unread message count from (Driven Port)
///
/// Implementations are expected to read through the response cache.
#[async_trait]
pub trait UnreadCountSource: Send + Sync {
    async fn unread_count(&self, user_id: UserId) -> Result<i64, SourceError>;
}
