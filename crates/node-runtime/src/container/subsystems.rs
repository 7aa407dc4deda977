//! # Subsystem Container
//!
//! Holds all subsystem instances and wires them around one event bus.
//!
//! ## Initialization Order
//!
//! ```text
//! Level 0: Event bus, content store (no dependencies)
//! Level 1: Metric store (publishes), response cache (passive)
//! Level 2: Query facade, unread counter (read through the cache)
//! Level 3: Realtime notifier (samples the unread counter, listens on the bus)
//! ```
//!
//! ## Thread Safety
//!
//! Every subsystem is shared behind an `Arc` and synchronizes internally.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument};

use fl_01_metric_store::{MetricError, MetricStoreService};
use fl_02_response_cache::{CacheError, InMemoryCacheBackend, ResponseCache};
use fl_03_realtime_notifier::{NotifierError, RealtimeNotifier};
use fl_04_query_facade::{QueryError, QueryFacade, UnreadCounter};
use shared_bus::InMemoryEventBus;

use crate::adapters::InMemoryContentStore;
use crate::container::config::{ConfigError, FeedConfig};

/// Content store wired to the in-process bus.
pub type ContentStore = InMemoryContentStore<InMemoryEventBus>;
/// Response cache over the in-memory backend.
pub type ConcreteCache = ResponseCache<InMemoryCacheBackend>;
/// Metric store publishing on the in-process bus.
pub type ConcreteMetricStore = MetricStoreService<InMemoryEventBus>;
/// Query facade over the content store.
pub type ConcreteQueryFacade = QueryFacade<ContentStore, InMemoryCacheBackend>;
/// Cached unread counter over the content store.
pub type ConcreteUnreadCounter = UnreadCounter<ContentStore, InMemoryCacheBackend>;
/// Notifier sampling the cached unread counter.
pub type ConcreteNotifier = RealtimeNotifier<ConcreteUnreadCounter>;

/// Errors raised while building the container.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Metric store: {0}")]
    MetricStore(#[from] MetricError),
    #[error("Response cache: {0}")]
    Cache(#[from] CacheError),
    #[error("Realtime notifier: {0}")]
    Notifier(#[from] NotifierError),
    #[error("Query facade: {0}")]
    Facade(#[from] QueryError),
}

/// Central container holding all subsystem instances.
pub struct FeedContainer {
    // =========================================================================
    // SHARED INFRASTRUCTURE
    // =========================================================================
    /// Event bus carrying every domain event.
    pub event_bus: Arc<InMemoryEventBus>,

    /// Authoritative listings and message boxes.
    pub content_store: Arc<ContentStore>,

    // =========================================================================
    // SUBSYSTEMS
    // =========================================================================
    pub metric_store: Arc<ConcreteMetricStore>,

    pub cache: Arc<ConcreteCache>,

    pub query_facade: Arc<ConcreteQueryFacade>,

    pub unread_counter: Arc<ConcreteUnreadCounter>,

    pub notifier: Arc<ConcreteNotifier>,

    /// Configuration (immutable after initialization).
    pub config: FeedConfig,
}

impl FeedContainer {
    /// Build every subsystem from `config`.
    #[instrument(name = "subsystem_init", skip(config))]
    pub fn new(config: FeedConfig) -> Result<Self, ContainerError> {
        config.validate()?;
        info!("Initializing Feedline subsystem container");

        let event_bus = Arc::new(InMemoryEventBus::with_capacity(
            config.runtime.bus_capacity,
        ));
        let content_store = Arc::new(InMemoryContentStore::new(Arc::clone(&event_bus)));
        info!(bus_capacity = config.runtime.bus_capacity, "Level 0: bus and content store ready");

        let metric_store = Arc::new(MetricStoreService::with_config(
            Arc::clone(&event_bus),
            config.metric_store.clone(),
        )?);
        let cache = Arc::new(ResponseCache::new(
            Arc::new(InMemoryCacheBackend::new(config.cache.max_entries)),
            config.cache.clone(),
        )?);
        info!(
            max_entries = config.cache.max_entries,
            default_ttl_secs = config.cache.default_ttl_secs,
            "Level 1: metric store and response cache ready"
        );

        let query_facade = Arc::new(QueryFacade::new(
            Arc::clone(&content_store),
            Arc::clone(&cache),
            config.facade.clone(),
        )?);
        let unread_counter = Arc::new(UnreadCounter::new(
            Arc::clone(&content_store),
            Arc::clone(&cache),
            config.facade.unread_ttl(),
        ));
        info!(max_page_size = config.facade.max_page_size, "Level 2: query facade ready");

        let notifier = Arc::new(RealtimeNotifier::new(
            Arc::clone(&unread_counter),
            Arc::clone(&event_bus),
            config.notifier.clone(),
        )?);
        info!(
            tick_interval_ms = config.notifier.tick_interval_ms,
            "Level 3: realtime notifier ready"
        );

        Ok(Self {
            event_bus,
            content_store,
            metric_store,
            cache,
            query_facade,
            unread_counter,
            notifier,
            config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_with_defaults() {
        let container = FeedContainer::new(FeedConfig::default()).unwrap();
        assert_eq!(
            container.event_bus.capacity(),
            shared_bus::DEFAULT_CHANNEL_CAPACITY
        );
        assert_eq!(container.notifier.active_sessions(), 0);
    }

    #[test]
    fn test_invalid_config_is_refused() {
        let mut config = FeedConfig::default();
        config.notifier.tick_interval_ms = 0;
        assert!(matches!(
            FeedContainer::new(config),
            Err(ContainerError::Config(ConfigError::Invalid {
                section: "notifier",
                ..
            }))
        ));
    }
}
