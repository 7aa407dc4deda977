//! # Event Publisher
//!
//! Defines the publishing side of the event bus.

use crate::events::{DomainEvent, EventFilter};
use crate::subscriber::{EventStream, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Trait for publishing events to the bus.
///
/// Publishing is fire-and-forget: it never waits on subscribers, so it can
/// be called from synchronous write paths.
pub trait EventPublisher: Send + Sync {
    /// Publish an event to the bus.
    ///
    /// # Returns
    ///
    /// The number of active subscribers the event was queued for.
    fn publish(&self, event: DomainEvent) -> usize;

    /// Get the total number of events published.
    fn events_published(&self) -> u64;
}

/// Delivery counters shared between the bus and its subscriptions.
#[derive(Debug, Default)]
pub struct BusStats {
    /// Events accepted by `publish`.
    pub published: AtomicU64,
    /// Events a lagging subscriber lost to buffer overflow.
    pub lagged: AtomicU64,
}

/// In-memory implementation of the event bus.
///
/// Uses `tokio::sync::broadcast` for multi-producer, multi-consumer
/// semantics. Every subscriber observes events in the single order in which
/// they were published, so events about the same user or entity are never
/// reordered. Each subscriber buffer is bounded: an overflowing subscriber
/// loses its oldest events and is told so on its next receive.
pub struct InMemoryEventBus {
    /// Broadcast sender for events.
    sender: broadcast::Sender<DomainEvent>,

    /// Active subscription count by filter.
    subscriptions: Arc<RwLock<HashMap<String, usize>>>,

    /// Delivery counters.
    stats: Arc<BusStats>,

    /// Channel capacity.
    capacity: usize,
}

impl InMemoryEventBus {
    /// Create a new in-memory event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new in-memory event bus with specified per-subscriber capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
            stats: Arc::new(BusStats::default()),
            capacity: capacity.max(1),
        }
    }

    /// Subscribe to events matching a filter.
    ///
    /// Delivery starts with the next published event. Dropping the returned
    /// `Subscription` unsubscribes.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        let receiver = self.sender.subscribe();
        let filter_key = format!("{:?}/{:?}", filter.kinds, filter.users);

        *self
            .subscriptions
            .write()
            .entry(filter_key.clone())
            .or_insert(0) += 1;

        debug!(kinds = ?filter.kinds, users = ?filter.users, "New subscription created");

        Subscription::new(
            receiver,
            filter,
            self.subscriptions.clone(),
            self.stats.clone(),
            filter_key,
        )
    }

    /// Get a stream of events matching a filter.
    #[must_use]
    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        EventStream::new(self.subscribe(filter))
    }

    /// Get the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Get the per-subscriber channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total events lost by lagging subscribers.
    #[must_use]
    pub fn events_lagged(&self) -> u64 {
        self.stats.lagged.load(Ordering::Relaxed)
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPublisher for InMemoryEventBus {
    fn publish(&self, event: DomainEvent) -> usize {
        let kind = event.kind();

        // Always increment counter (event was attempted)
        self.stats.published.fetch_add(1, Ordering::Relaxed);

        match self.sender.send(event) {
            Ok(receiver_count) => {
                trace!(kind = ?kind, receivers = receiver_count, "Event published");
                receiver_count
            }
            Err(_) => {
                // No receivers: nothing derived from this event exists yet
                trace!(kind = ?kind, "Event dropped (no receivers)");
                0
            }
        }
    }

    fn events_published(&self) -> u64 {
        self.stats.published.load(Ordering::Relaxed)
    }
}

impl<P: EventPublisher + ?Sized> EventPublisher for Arc<P> {
    fn publish(&self, event: DomainEvent) -> usize {
        (**self).publish(event)
    }

    fn events_published(&self) -> u64 {
        (**self).events_published()
    }
}
