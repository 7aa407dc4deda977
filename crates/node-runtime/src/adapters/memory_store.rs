//! # In-Memory Content Store
//!
//! Stand-in for the persistent store behind the outbound ports of the query
//! facade. Holds seeded listings and per-user unread message counts, and
//! plays the role of the message handlers: sending or reading messages
//! updates the counts and publishes the matching domain events.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use fl_04_query_facade::{FetchedPage, ListingSource, QueryParams, UnreadMessageSource};
use shared_bus::{DomainEvent, EventPublisher};
use shared_types::{SourceError, Subject, UserId};

#[derive(Debug, Default)]
struct Listing {
    items: Vec<Value>,
    dependencies: Vec<Subject>,
}

/// Listings and message boxes kept in memory.
pub struct InMemoryContentStore<P: EventPublisher> {
    listings: RwLock<HashMap<(Subject, String), Listing>>,
    unread: RwLock<HashMap<UserId, i64>>,
    publisher: Arc<P>,
}

impl<P: EventPublisher> InMemoryContentStore<P> {
    pub fn new(publisher: Arc<P>) -> Self {
        Self {
            listings: RwLock::new(HashMap::new()),
            unread: RwLock::new(HashMap::new()),
            publisher,
        }
    }

    /// Seed or replace the listing of `style` about `subject`.
    ///
    /// `dependencies` are the other subjects its rows are built from.
    pub fn put_listing(
        &self,
        subject: Subject,
        style: impl Into<String>,
        items: Vec<Value>,
        dependencies: Vec<Subject>,
    ) {
        self.listings.write().insert(
            (subject, style.into()),
            Listing {
                items,
                dependencies,
            },
        );
    }

    /// Deliver a message from `sender` to every receiver.
    ///
    /// Each receiver's unread count grows by one. Publishes `MessageCreated`
    /// and then one `UnreadCountChanged` per receiver.
    pub fn send_message(&self, sender: UserId, receivers: &[UserId]) {
        {
            let mut unread = self.unread.write();
            for receiver in receivers {
                *unread.entry(*receiver).or_insert(0) += 1;
            }
        }
        debug!(sender, receivers = receivers.len(), "Message delivered");

        self.publisher.publish(DomainEvent::MessageCreated {
            sender,
            receivers: receivers.to_vec(),
        });
        for receiver in receivers {
            self.publisher
                .publish(DomainEvent::UnreadCountChanged(*receiver));
        }
    }

    /// Mark every message of `user` as read. Returns how many were unread.
    pub fn read_messages(&self, user: UserId) -> i64 {
        let previous = self.unread.write().insert(user, 0).unwrap_or(0);

        self.publisher.publish(DomainEvent::MessageRead(user));
        if previous != 0 {
            self.publisher
                .publish(DomainEvent::UnreadCountChanged(user));
        }
        previous
    }
}

#[async_trait]
impl<P: EventPublisher> ListingSource for InMemoryContentStore<P> {
    async fn fetch_page(&self, params: &QueryParams) -> Result<FetchedPage, SourceError> {
        let listings = self.listings.read();
        let listing = listings
            .get(&(params.subject, params.style.clone()))
            .ok_or_else(|| SourceError::NotFound(format!("{}:{}", params.subject, params.style)))?;

        let total_rows = listing.items.len() as u64;
        let offset = usize::try_from(params.offset()).unwrap_or(usize::MAX);
        let items = listing
            .items
            .iter()
            .skip(offset)
            .take(params.page_size as usize)
            .cloned()
            .collect();

        Ok(FetchedPage {
            items,
            total_rows,
            dependencies: listing.dependencies.clone(),
        })
    }
}

#[async_trait]
impl<P: EventPublisher> UnreadMessageSource for InMemoryContentStore<P> {
    async fn unread_count(&self, user_id: UserId) -> Result<i64, SourceError> {
        Ok(self.unread.read().get(&user_id).copied().unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared_bus::{EventFilter, InMemoryEventBus};

    fn store() -> (InMemoryContentStore<InMemoryEventBus>, Arc<InMemoryEventBus>) {
        let bus = Arc::new(InMemoryEventBus::new());
        (InMemoryContentStore::new(Arc::clone(&bus)), bus)
    }

    #[tokio::test]
    async fn test_pages_are_sliced_by_offset() {
        let (store, _bus) = store();
        let items = (0..25).map(|i| json!({ "tweet_id": i })).collect();
        store.put_listing(Subject::User(1), "list", items, vec![Subject::Tweet(3)]);

        let page = store
            .fetch_page(&QueryParams::new(Subject::User(1), "list", 3, 10))
            .await
            .unwrap();
        assert_eq!(page.total_rows, 25);
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.items[0]["tweet_id"], 20);
        assert_eq!(page.dependencies, vec![Subject::Tweet(3)]);

        let past_end = store
            .fetch_page(&QueryParams::new(Subject::User(1), "list", 9, 10))
            .await
            .unwrap();
        assert!(past_end.items.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_listing_is_not_found() {
        let (store, _bus) = store();
        let result = store
            .fetch_page(&QueryParams::new(Subject::Tweet(4), "comments", 1, 10))
            .await;
        assert!(matches!(result, Err(SourceError::NotFound(key)) if key == "t4:comments"));
    }

    #[tokio::test]
    async fn test_message_flow_publishes_events() {
        let (store, bus) = store();
        let mut events = bus.subscribe(EventFilter::all());

        store.send_message(1, &[2, 3]);
        assert_eq!(store.unread_count(2).await.unwrap(), 1);
        assert_eq!(store.unread_count(1).await.unwrap(), 0);

        assert_eq!(
            events.recv().await.unwrap(),
            DomainEvent::MessageCreated {
                sender: 1,
                receivers: vec![2, 3]
            }
        );
        assert_eq!(events.recv().await.unwrap(), DomainEvent::UnreadCountChanged(2));
        assert_eq!(events.recv().await.unwrap(), DomainEvent::UnreadCountChanged(3));

        assert_eq!(store.read_messages(2), 1);
        assert_eq!(store.unread_count(2).await.unwrap(), 0);
        assert_eq!(events.recv().await.unwrap(), DomainEvent::MessageRead(2));
        assert_eq!(events.recv().await.unwrap(), DomainEvent::UnreadCountChanged(2));
    }

    #[tokio::test]
    async fn test_reading_nothing_skips_count_event() {
        let (store, bus) = store();
        let mut events = bus.subscribe(EventFilter::all());

        assert_eq!(store.read_messages(5), 0);
        assert_eq!(events.recv().await.unwrap(), DomainEvent::MessageRead(5));
        assert!(events.try_recv().unwrap().is_none());
    }
}
