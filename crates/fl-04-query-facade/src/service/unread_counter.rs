//! Cached unread message counter
//!
//! Reads `u{id}:unread` (`{"count":n}`) through the response cache and
//! falls back to the message store on a miss. Live sessions sample it once
//! per tick, so a cache hit keeps the store out of the hot path.

use async_trait::async_trait;
use bytes::Bytes;
use fl_02_response_cache::{CacheBackend, CacheKey, ResponseCache};
use fl_03_realtime_notifier::UnreadCountSource;
use serde::{Deserialize, Serialize};
use shared_types::{SourceError, UserId};
use std::sync::Arc;
use std::time::Duration;
use tracing::{trace, warn};

use crate::ports::UnreadMessageSource;

#[derive(Serialize, Deserialize)]
struct UnreadPayload {
    count: i64,
}

/// Unread count reader backed by the response cache
pub struct UnreadCounter<U: UnreadMessageSource, B: CacheBackend> {
    source: Arc<U>,
    cache: Arc<ResponseCache<B>>,
    ttl: Duration,
}

impl<U: UnreadMessageSource, B: CacheBackend> UnreadCounter<U, B> {
    pub fn new(source: Arc<U>, cache: Arc<ResponseCache<B>>, ttl: Duration) -> Self {
        Self { source, cache, ttl }
    }

    /// Current unread count of `user_id`
    pub async fn count(&self, user_id: UserId) -> Result<i64, SourceError> {
        let key = CacheKey::unread(user_id);

        if let Some(bytes) = self.cache.get(&key).await {
            match serde_json::from_slice::<UnreadPayload>(&bytes) {
                Ok(payload) => return Ok(payload.count),
                Err(e) => {
                    warn!(key = %key, error = %e, "Discarding undecodable unread counter");
                    self.cache.invalidate_key(&key).await;
                }
            }
        }

        let ticket = self.cache.fill_ticket(&key);
        let count = self.source.unread_count(user_id).await?;

        match serde_json::to_vec(&UnreadPayload { count }) {
            Ok(body) => {
                let stored = self
                    .cache
                    .put_filled(ticket, Bytes::from(body), self.ttl, &[])
                    .await;
                trace!(user_id, count, stored, "Filled unread counter");
            }
            Err(e) => warn!(user_id, error = %e, "Could not encode unread counter"),
        }
        Ok(count)
    }
}

#[async_trait]
impl<U, B> UnreadCountSource for UnreadCounter<U, B>
where
    U: UnreadMessageSource,
    B: CacheBackend,
{
    async fn unread_count(&self, user_id: UserId) -> Result<i64, SourceError> {
        self.count(user_id).await
    }
}
