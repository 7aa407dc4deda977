//! Event Bus Adapter for the Response Cache
//!
//! Subscribes to every domain event and applies the invalidations it maps
//! to. Falling behind on the bus loses events whose invalidations can no
//! longer be reconstructed, so a lag flushes the whole cache.

use shared_bus::{EventFilter, InMemoryEventBus, Subscription, SubscriptionError};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::ports::CacheBackend;
use crate::service::ResponseCache;

/// Long-lived invalidation task
pub struct CacheInvalidator<B: CacheBackend> {
    cache: Arc<ResponseCache<B>>,
    subscription: Subscription,
}

impl<B: CacheBackend + 'static> CacheInvalidator<B> {
    /// Subscribe immediately, so events published before `run` is polled
    /// are still applied.
    pub fn new(cache: Arc<ResponseCache<B>>, bus: &InMemoryEventBus) -> Self {
        Self {
            cache,
            subscription: bus.subscribe(EventFilter::all()),
        }
    }

    /// Apply events until shutdown is signalled or the bus closes.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!("[CacheInvalidator] Started listening for events");

        loop {
            tokio::select! {
                biased;

                _ = shutdown.changed() => {
                    info!("[CacheInvalidator] Shutdown signal received");
                    break;
                }
                received = self.subscription.recv() => match received {
                    Ok(event) => {
                        let removed = self.cache.apply_event(&event).await;
                        debug!(kind = ?event.kind(), removed, "Applied invalidation");
                    }
                    Err(SubscriptionError::Lagged { missed }) => {
                        warn!(missed, "[CacheInvalidator] Lagged behind the bus, flushing cache");
                        self.cache.flush().await;
                    }
                    Err(SubscriptionError::Closed) => {
                        warn!("[CacheInvalidator] Event bus closed, stopping");
                        break;
                    }
                },
            }
        }
    }
}
