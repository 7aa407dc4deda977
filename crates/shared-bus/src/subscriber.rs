//! # Event Subscriber
//!
//! Defines the subscription side of the event bus.

use crate::events::{DomainEvent, EventFilter};
use crate::publisher::BusStats;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::task::{ready, Context, Poll};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::Stream;
use tracing::{debug, warn};

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The event bus was closed.
    #[error("Event bus closed")]
    Closed,

    /// The subscriber fell behind and the oldest events were dropped.
    ///
    /// Anything derived from the missed events must be reset.
    #[error("Subscriber lagged, {missed} events dropped")]
    Lagged { missed: u64 },
}

/// Releases the subscription bookkeeping when the subscriber goes away.
struct SubscriptionGuard {
    /// Reference to subscription tracking (for cleanup).
    subscriptions: Arc<RwLock<HashMap<String, usize>>>,

    /// Filter key for this subscription.
    filter_key: String,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        let mut subs = self.subscriptions.write();
        if let Some(count) = subs.get_mut(&self.filter_key) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                subs.remove(&self.filter_key);
            }
        }
        debug!(filter = %self.filter_key, "Subscription dropped");
    }
}

/// A subscription handle for receiving events.
///
/// When dropped, the subscription is automatically cleaned up and the bus
/// stops buffering events for it.
pub struct Subscription {
    /// The broadcast receiver.
    receiver: broadcast::Receiver<DomainEvent>,

    /// Filter for this subscription.
    filter: EventFilter,

    /// Shared delivery counters.
    stats: Arc<BusStats>,

    guard: SubscriptionGuard,
}

impl Subscription {
    /// Create a new subscription.
    pub(crate) fn new(
        receiver: broadcast::Receiver<DomainEvent>,
        filter: EventFilter,
        subscriptions: Arc<RwLock<HashMap<String, usize>>>,
        stats: Arc<BusStats>,
        filter_key: String,
    ) -> Self {
        Self {
            receiver,
            filter,
            stats,
            guard: SubscriptionGuard {
                subscriptions,
                filter_key,
            },
        }
    }

    /// Receive the next event that matches the filter.
    ///
    /// # Errors
    ///
    /// - `SubscriptionError::Lagged` - events were lost; the next call resumes
    ///   with the oldest event still buffered
    /// - `SubscriptionError::Closed` - the bus was dropped
    pub async fn recv(&mut self) -> Result<DomainEvent, SubscriptionError> {
        loop {
            let event = match self.receiver.recv().await {
                Ok(e) => e,
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    return Err(self.lagged(missed));
                }
            };

            if self.filter.matches(&event) {
                return Ok(event);
            }
            // Event doesn't match filter, continue waiting
        }
    }

    /// Try to receive the next event without blocking.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(event))` - An event was available and matched
    /// - `Ok(None)` - No event available (would block)
    /// - `Err(_)` - The channel was closed or the subscriber lagged
    pub fn try_recv(&mut self) -> Result<Option<DomainEvent>, SubscriptionError> {
        loop {
            let event = match self.receiver.try_recv() {
                Ok(e) => e,
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
                Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                    return Err(self.lagged(missed));
                }
            };

            if self.filter.matches(&event) {
                return Ok(Some(event));
            }
        }
    }

    /// Get the filter for this subscription.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    fn lagged(&self, missed: u64) -> SubscriptionError {
        self.stats.lagged.fetch_add(missed, Ordering::Relaxed);
        warn!(filter = %self.guard.filter_key, missed, "Subscriber lagged, events dropped");
        SubscriptionError::Lagged { missed }
    }
}

/// A stream wrapper for subscriptions.
///
/// Implements `tokio_stream::Stream` for use with stream combinators. Lag is
/// surfaced as an `Err` item; the end of the stream means the bus closed.
pub struct EventStream {
    inner: BroadcastStream<DomainEvent>,
    filter: EventFilter,
    stats: Arc<BusStats>,
    _guard: SubscriptionGuard,
}

impl EventStream {
    /// Create a new event stream from a subscription.
    #[must_use]
    pub fn new(subscription: Subscription) -> Self {
        let Subscription {
            receiver,
            filter,
            stats,
            guard,
        } = subscription;
        Self {
            inner: BroadcastStream::new(receiver),
            filter,
            stats,
            _guard: guard,
        }
    }

    /// Get the filter for this stream.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

impl Stream for EventStream {
    type Item = Result<DomainEvent, SubscriptionError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match ready!(Pin::new(&mut self.inner).poll_next(cx)) {
                None => return Poll::Ready(None),
                Some(Ok(event)) => {
                    if self.filter.matches(&event) {
                        return Poll::Ready(Some(Ok(event)));
                    }
                }
                Some(Err(BroadcastStreamRecvError::Lagged(missed))) => {
                    self.stats.lagged.fetch_add(missed, Ordering::Relaxed);
                    return Poll::Ready(Some(Err(SubscriptionError::Lagged { missed })));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use crate::publisher::{EventPublisher, InMemoryEventBus};
    use shared_types::EntityRef;
    use std::time::Duration;
    use tokio::time::timeout;
    use tokio_stream::StreamExt;

    #[tokio::test]
    async fn test_subscription_recv() {
        let bus = InMemoryEventBus::new();
        let mut sub = bus.subscribe(EventFilter::all());

        bus.publish(DomainEvent::MessageRead(4));

        let received = timeout(Duration::from_millis(100), sub.recv())
            .await
            .expect("timeout")
            .expect("event");

        assert_eq!(received, DomainEvent::MessageRead(4));
    }

    #[tokio::test]
    async fn test_subscription_filter() {
        let bus = InMemoryEventBus::new();
        let mut sub = bus.subscribe(EventFilter::kinds(vec![EventKind::MetricChanged]));

        // Filtered out
        bus.publish(DomainEvent::ProfileChanged(1));
        // Delivered
        bus.publish(DomainEvent::MetricChanged(EntityRef::tweet(9)));

        let received = timeout(Duration::from_millis(100), sub.recv())
            .await
            .expect("timeout")
            .expect("event");

        assert_eq!(received, DomainEvent::MetricChanged(EntityRef::tweet(9)));
    }

    #[tokio::test]
    async fn test_same_user_events_keep_publish_order() {
        let bus = InMemoryEventBus::new();
        let mut sub = bus.subscribe(EventFilter::all().for_users(vec![5]));

        bus.publish(DomainEvent::UnreadCountChanged(5));
        bus.publish(DomainEvent::MessageRead(6));
        bus.publish(DomainEvent::MessageRead(5));

        assert_eq!(sub.recv().await, Ok(DomainEvent::UnreadCountChanged(5)));
        assert_eq!(sub.recv().await, Ok(DomainEvent::MessageRead(5)));
    }

    #[tokio::test]
    async fn test_subscription_drop_cleanup() {
        let bus = InMemoryEventBus::new();

        {
            let _sub1 = bus.subscribe(EventFilter::all());
            let _sub2 = bus.subscribe(EventFilter::all());
            assert_eq!(bus.subscriber_count(), 2);
        }

        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_try_recv_empty() {
        let bus = InMemoryEventBus::new();
        let mut sub = bus.subscribe(EventFilter::all());
        assert!(matches!(sub.try_recv(), Ok(None)));
    }

    #[tokio::test]
    async fn test_lagging_subscriber_is_told_and_bus_not_blocked() {
        let bus = InMemoryEventBus::with_capacity(2);
        let mut slow = bus.subscribe(EventFilter::all());

        // Publisher never blocks even though nobody reads
        for user in 0..5 {
            bus.publish(DomainEvent::MessageRead(user));
        }

        assert_eq!(slow.try_recv(), Err(SubscriptionError::Lagged { missed: 3 }));
        assert_eq!(bus.events_lagged(), 3);

        // Oldest retained events follow
        assert_eq!(slow.try_recv(), Ok(Some(DomainEvent::MessageRead(3))));
        assert_eq!(slow.try_recv(), Ok(Some(DomainEvent::MessageRead(4))));
    }

    #[tokio::test]
    async fn test_recv_closed_when_bus_dropped() {
        let bus = InMemoryEventBus::new();
        let mut sub = bus.subscribe(EventFilter::all());
        drop(bus);
        assert_eq!(sub.recv().await, Err(SubscriptionError::Closed));
    }

    #[tokio::test]
    async fn test_event_stream_filters_and_releases() {
        let bus = InMemoryEventBus::new();
        let mut stream = bus.event_stream(EventFilter::kinds(vec![EventKind::ProfileChanged]));
        assert_eq!(EventStream::filter(&stream).kinds, vec![EventKind::ProfileChanged]);

        bus.publish(DomainEvent::MessageRead(1));
        bus.publish(DomainEvent::ProfileChanged(2));

        let next = timeout(Duration::from_millis(100), stream.next())
            .await
            .expect("timeout")
            .expect("stream open");
        assert_eq!(next, Ok(DomainEvent::ProfileChanged(2)));

        drop(stream);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
