//! Query Facade Service
//!
//! Cache-first orchestration of paginated reads:
//!
//! 1. validate params and compute the cache key
//! 2. serve a cached response if one is live
//! 3. otherwise take a fill ticket, read the page from the source, wrap it
//!    in the page envelope and store it with the style's TTL
//!
//! The source is the authority. A fill overtaken by an invalidation is
//! still returned to its caller but not stored.

use bytes::Bytes;
use fl_02_response_cache::{CacheBackend, ResponseCache};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::domain::{FacadeConfig, PageEnvelope, Pager, QueryParams};
use crate::error::QueryError;
use crate::ports::ListingSource;

/// A serialized listing response
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryResponse {
    /// JSON `PageEnvelope`
    pub body: Bytes,
    pub from_cache: bool,
}

impl QueryResponse {
    /// Decode the body
    pub fn envelope(&self) -> Result<PageEnvelope, QueryError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Cache-first listing facade
pub struct QueryFacade<L: ListingSource, B: CacheBackend> {
    source: Arc<L>,
    cache: Arc<ResponseCache<B>>,
    config: FacadeConfig,
}

impl<L: ListingSource, B: CacheBackend> QueryFacade<L, B> {
    pub fn new(
        source: Arc<L>,
        cache: Arc<ResponseCache<B>>,
        config: FacadeConfig,
    ) -> Result<Self, QueryError> {
        config.validate()?;
        Ok(Self {
            source,
            cache,
            config,
        })
    }

    pub fn config(&self) -> &FacadeConfig {
        &self.config
    }

    /// Answer a listing query, from the cache when possible.
    pub async fn query(&self, params: &QueryParams) -> Result<QueryResponse, QueryError> {
        params.validate(self.config.max_page_size)?;
        let key = params.cache_key();

        if let Some(body) = self.cache.get(&key).await {
            trace!(key = %key, "Serving listing from cache");
            return Ok(QueryResponse {
                body,
                from_cache: true,
            });
        }

        let ticket = self.cache.fill_ticket(&key);
        let page = self.source.fetch_page(params).await?;

        let envelope = PageEnvelope {
            list: page.items,
            pager: Pager {
                page: params.page,
                page_size: params.page_size,
                total_rows: page.total_rows,
            },
        };
        let body = Bytes::from(serde_json::to_vec(&envelope)?);

        let ttl = self.config.ttl.ttl_for(&params.style);
        let stored = self
            .cache
            .put_filled(ticket, body.clone(), ttl, &page.dependencies)
            .await;
        debug!(key = %key, stored, ttl_secs = ttl.as_secs(), "Filled listing from source");

        Ok(QueryResponse {
            body,
            from_cache: false,
        })
    }
}
