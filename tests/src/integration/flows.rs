//! # Integration Test Flows
//!
//! Tests that the metric store, response cache, query facade and realtime
//! notifier stay consistent with each other through the shared bus.
//!
//! ## Flows Tested:
//!
//! 1. **Metric Store → Bus → Cache**: engagement updates evict every cached
//!    page built from the entity
//! 2. **Messages → Bus → Cache + Live Sessions**: a new message refreshes
//!    the cached unread counter and reaches the open live channel
//! 3. **User Metrics → Bus → Cache**: profile changes evict the user's pages
//! 4. **Fill guard**: a fill overtaken by an invalidation is not stored
//! 5. **Lag recovery**: a lagging invalidator flushes instead of serving
//!    stale entries

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use bytes::Bytes;
    use serde_json::json;
    use tokio::time::timeout;

    use fl_01_metric_store::{
        ContentMetricApi, Counter, EngagementCounters, MetricDelta, UserMetricApi,
    };
    use fl_02_response_cache::{CacheConfig, CacheKey, InMemoryCacheBackend, ResponseCache};
    use fl_03_realtime_notifier::{LiveChannel, LiveUpdate, NotifierError};
    use fl_04_query_facade::{FacadeConfig, FetchedPage, ListingSource, QueryFacade, QueryParams};
    use node_runtime::{FeedConfig, FeedRuntime};
    use shared_bus::{DomainEvent, EventPublisher};
    use shared_types::{EntityRef, SourceError, Subject};

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    fn fast_config() -> FeedConfig {
        let mut config = FeedConfig::default();
        config.notifier.tick_interval_ms = 50;
        config
    }

    fn started_runtime(config: FeedConfig) -> FeedRuntime {
        let runtime = FeedRuntime::new(config).expect("valid config");
        runtime.start().expect("first start");
        runtime
    }

    /// Poll `check` until it holds or two seconds pass.
    async fn eventually<F, Fut>(mut check: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        for _ in 0..200 {
            if check().await {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    /// Receive until a count update arrives, skipping keepalives.
    async fn next_count(channel: &mut LiveChannel) -> i64 {
        let wait = async {
            loop {
                match channel.recv().await {
                    Some(LiveUpdate::Count { count }) => return count,
                    Some(LiveUpdate::Keepalive) => continue,
                    None => panic!("live channel closed"),
                }
            }
        };
        timeout(Duration::from_secs(2), wait)
            .await
            .expect("timeout waiting for a count update")
    }

    // =========================================================================
    // FLOW 1: METRIC STORE → BUS → CACHE
    // =========================================================================

    #[tokio::test]
    async fn test_comment_update_evicts_thread_page() {
        let runtime = FeedRuntime::new(fast_config()).unwrap();
        let container = runtime.container();
        container.content_store.put_listing(
            Subject::Tweet(7),
            "comments",
            vec![json!({ "comment_id": 3 }), json!({ "comment_id": 4 })],
            vec![Subject::Comment(3), Subject::Comment(4)],
        );
        container
            .metric_store
            .add_metric(EntityRef::comment(3))
            .unwrap();
        runtime.start().unwrap();

        let params = QueryParams::new(Subject::Tweet(7), "comments", 1, 10);
        let first = container.query_facade.query(&params).await.unwrap();
        assert!(!first.from_cache);
        assert_eq!(first.envelope().unwrap().pager.total_rows, 2);
        assert!(container.query_facade.query(&params).await.unwrap().from_cache);

        container
            .metric_store
            .update_metric(
                EntityRef::comment(3),
                MetricDelta::incentive(2)
                    .with_counter(Counter::ThumbsUp, 1)
                    .into(),
            )
            .unwrap();

        let cache = Arc::clone(&container.cache);
        let key = params.cache_key();
        assert!(eventually(|| async { cache.get(&key).await.is_none() }).await);
        assert!(!container.query_facade.query(&params).await.unwrap().from_cache);

        runtime.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_engagement_updates_are_not_lost() {
        let runtime = started_runtime(fast_config());
        let container = runtime.container();
        let entity = EntityRef::tweet(11);
        let initial = container.metric_store.add_metric(entity).unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&container.metric_store);
            handles.push(tokio::spawn(async move {
                for _ in 0..250 {
                    store
                        .update_metric(
                            entity,
                            MetricDelta::incentive(1)
                                .with_counter(Counter::Upvotes, 1)
                                .into(),
                        )
                        .unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let metric = container.metric_store.get_metric(entity).unwrap();
        assert_eq!(metric.incentive_score, initial.incentive_score + 2_000);
        assert_eq!(metric.version, initial.version + 2_000);
        match metric.counters {
            EngagementCounters::Tweet(counters) => assert_eq!(counters.upvotes, 2_000),
            other => panic!("expected tweet counters, got {other:?}"),
        }

        runtime.shutdown().await;
    }

    // =========================================================================
    // FLOW 2: MESSAGES → BUS → CACHE + LIVE SESSIONS
    // =========================================================================

    #[tokio::test]
    async fn test_new_message_reaches_live_channel() {
        let runtime = started_runtime(fast_config());
        let container = runtime.container();

        let mut channel = container.notifier.subscribe(2).unwrap();
        assert_eq!(next_count(&mut channel).await, 0);

        container.content_store.send_message(1, &[2]);
        assert_eq!(next_count(&mut channel).await, 1);

        container.content_store.send_message(3, &[2, 4]);
        assert_eq!(next_count(&mut channel).await, 2);

        container.content_store.read_messages(2);
        assert_eq!(next_count(&mut channel).await, 0);

        let report = runtime.shutdown().await;
        assert_eq!(report.sessions_drained, 1);
    }

    #[tokio::test]
    async fn test_session_limit_and_disconnect() {
        let mut config = fast_config();
        config.notifier.max_sessions_per_user = 2;
        let runtime = started_runtime(config);
        let notifier = runtime.container().notifier.clone();

        let _first = notifier.subscribe(8).unwrap();
        let _second = notifier.subscribe(8).unwrap();
        assert!(matches!(
            notifier.subscribe(8),
            Err(NotifierError::TooManySessions { user_id: 8, max: 2 })
        ));
        let _other_user = notifier.subscribe(9).unwrap();

        assert_eq!(notifier.disconnect_user(8), 2);
        let probe = Arc::clone(&notifier);
        assert!(eventually(|| {
            let notifier = Arc::clone(&probe);
            async move { notifier.user_sessions(8) == 0 }
        })
        .await);
        assert_eq!(notifier.user_sessions(9), 1);
        assert!(notifier.subscribe(8).is_ok());

        runtime.shutdown().await;
        assert!(matches!(
            notifier.subscribe(8),
            Err(NotifierError::ShuttingDown)
        ));
    }

    // =========================================================================
    // FLOW 3: USER METRICS → BUS → CACHE
    // =========================================================================

    #[tokio::test]
    async fn test_profile_change_evicts_user_entries() {
        let runtime = FeedRuntime::new(fast_config()).unwrap();
        let container = runtime.container();
        container.metric_store.add_user_metric(5).unwrap();
        runtime.start().unwrap();

        let profile = CacheKey::value(Subject::User(5), "profile");
        let other = CacheKey::value(Subject::User(6), "profile");
        for key in [&profile, &other] {
            container
                .cache
                .put(key, Bytes::from_static(b"{}"), Duration::from_secs(60))
                .await;
        }

        container.metric_store.grant_experience(5, 10).unwrap();

        let cache = Arc::clone(&container.cache);
        assert!(eventually(|| async { cache.get(&profile).await.is_none() }).await);
        assert!(container.cache.get(&other).await.is_some());

        runtime.shutdown().await;
    }

    // =========================================================================
    // FLOW 4: FILL GUARD
    // =========================================================================

    /// Source whose first read races with a write to the subject.
    struct RacingListings {
        cache: Arc<ResponseCache<InMemoryCacheBackend>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ListingSource for RacingListings {
        async fn fetch_page(&self, params: &QueryParams) -> Result<FetchedPage, SourceError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call == 0 {
                self.cache
                    .apply_event(&DomainEvent::ProfileChanged(42))
                    .await;
            }
            Ok(FetchedPage {
                items: vec![json!({ "version": call })],
                total_rows: 1,
                dependencies: Vec::new(),
            })
        }
    }

    #[tokio::test]
    async fn test_fill_overtaken_by_invalidation_is_not_stored() {
        let cache = Arc::new(
            ResponseCache::new(
                Arc::new(InMemoryCacheBackend::new(100)),
                CacheConfig::default(),
            )
            .unwrap(),
        );
        let source = Arc::new(RacingListings {
            cache: Arc::clone(&cache),
            calls: AtomicUsize::new(0),
        });
        let facade =
            QueryFacade::new(Arc::clone(&source), Arc::clone(&cache), FacadeConfig::default())
                .unwrap();
        let params = QueryParams::new(Subject::User(42), "list", 1, 10);

        let raced = facade.query(&params).await.unwrap();
        assert!(!raced.from_cache);
        assert_eq!(cache.metrics().snapshot().rejected_fills, 1);

        let refilled = facade.query(&params).await.unwrap();
        assert!(!refilled.from_cache);
        assert_eq!(refilled.envelope().unwrap().list[0]["version"], 1);

        let cached = facade.query(&params).await.unwrap();
        assert!(cached.from_cache);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    // =========================================================================
    // FLOW 5: LAG RECOVERY
    // =========================================================================

    #[tokio::test]
    async fn test_lagging_invalidator_flushes_cache() {
        let mut config = fast_config();
        config.runtime.bus_capacity = 4;
        let runtime = started_runtime(config);
        let container = runtime.container();

        let key = CacheKey::value(Subject::User(77), "profile");
        container
            .cache
            .put(&key, Bytes::from_static(b"{}"), Duration::from_secs(60))
            .await;

        // No await point: the invalidator cannot keep up
        for id in 0..32 {
            container
                .event_bus
                .publish(DomainEvent::MetricChanged(EntityRef::tweet(1_000 + id)));
        }

        let cache = Arc::clone(&container.cache);
        assert!(eventually(|| async { cache.metrics().snapshot().flushes >= 1 }).await);
        assert!(container.cache.get(&key).await.is_none());
        assert!(container.event_bus.events_lagged() > 0);

        runtime.shutdown().await;
    }
}
