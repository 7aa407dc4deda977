//! # End-to-End Scenarios
//!
//! The reference scenarios of the ranking and freshness core, each driven
//! through the public subsystem APIs:
//!
//! 1. Zero decay factor scores 0
//! 2. `incentive=100, decay=4, motivation=5` scores 125
//! 3. A cached page survives its TTL window but not a change to an entity
//!    it contains
//! 4. A live session emits a keepalive for an unchanged count and exactly
//!    one update for a changed one
//! 5. Closing a live connection mid-tick ends its loop before the next tick
//!    and releases its bus subscription

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use bytes::Bytes;
    use tokio::sync::watch;
    use tokio::time::{timeout, Instant};

    use fl_01_metric_store::{rank_score, ContentMetricApi, MetricDelta, MetricStoreService};
    use fl_02_response_cache::{
        CacheConfig, CacheInvalidator, CacheKey, InMemoryCacheBackend, ResponseCache,
    };
    use fl_03_realtime_notifier::{LiveUpdate, TickOutcome, UnreadCounterSession};
    use node_runtime::{FeedConfig, FeedRuntime};
    use shared_bus::InMemoryEventBus;
    use shared_types::{EntityRef, Subject};

    fn metric_store() -> MetricStoreService<InMemoryEventBus> {
        MetricStoreService::new(Arc::new(InMemoryEventBus::new()))
    }

    fn runtime_with_tick(tick_ms: u64) -> FeedRuntime {
        let mut config = FeedConfig::default();
        config.notifier.tick_interval_ms = tick_ms;
        FeedRuntime::new(config).expect("valid config")
    }

    // =========================================================================
    // SCENARIO 1: ZERO DECAY
    // =========================================================================

    #[test]
    fn test_scenario_zero_decay_scores_zero() {
        assert_eq!(rank_score(100, 0, 5), 0);

        let store = metric_store();
        let entity = EntityRef::tweet(1);
        store.add_metric(entity).unwrap();
        store
            .update_metric(
                entity,
                MetricDelta::incentive(100).with_decay_factor(0).into(),
            )
            .unwrap();

        assert_eq!(store.rank_score(entity, 5).unwrap(), 0);
    }

    // =========================================================================
    // SCENARIO 2: DECAY-WEIGHTED SCORE
    // =========================================================================

    #[test]
    fn test_scenario_decay_weighted_score() {
        assert_eq!(rank_score(100, 4, 5), 125);

        let store = metric_store();
        let entity = EntityRef::comment(2);
        store.add_metric(entity).unwrap();
        store
            .update_metric(
                entity,
                MetricDelta::incentive(100).with_decay_factor(4).into(),
            )
            .unwrap();

        assert_eq!(store.rank_score(entity, 5).unwrap(), 125);
    }

    // =========================================================================
    // SCENARIO 3: TTL AND EVENT INVALIDATION
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_scenario_cached_page_follows_entity_changes() {
        let bus = Arc::new(InMemoryEventBus::new());
        let store = MetricStoreService::new(Arc::clone(&bus));
        let tweet = EntityRef::tweet(7);
        store.add_metric(tweet).unwrap();

        let cache = Arc::new(
            ResponseCache::new(
                Arc::new(InMemoryCacheBackend::new(100)),
                CacheConfig::default(),
            )
            .unwrap(),
        );
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let invalidator =
            tokio::spawn(CacheInvalidator::new(Arc::clone(&cache), &bus).run(shutdown_rx));

        let key = CacheKey::list(Subject::User(42), "list", 10, 0);
        assert_eq!(key.render(), "u42:list:10:0");
        let payload = Bytes::from_static(br#"{"list":[{"tweet_id":7}]}"#);
        let ttl = Duration::from_secs(60);
        assert!(
            cache
                .put_with_dependencies(&key, payload.clone(), ttl, &[Subject::Tweet(7)])
                .await
        );

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get(&key).await, Some(payload));

        store
            .update_metric(tweet, MetricDelta::incentive(1).into())
            .unwrap();

        let evicted = timeout(Duration::from_secs(1), async {
            while cache.get(&key).await.is_some() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(evicted.is_ok(), "entry survived MetricChanged");

        shutdown_tx.send(true).unwrap();
        invalidator.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_scenario_cached_page_expires_after_ttl() {
        let cache = ResponseCache::new(
            Arc::new(InMemoryCacheBackend::new(100)),
            CacheConfig::default(),
        )
        .unwrap();
        let key = CacheKey::list(Subject::User(42), "list", 10, 0);
        cache
            .put(&key, Bytes::from_static(b"[]"), Duration::from_secs(60))
            .await;

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(cache.get(&key).await.is_some());
        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get(&key).await.is_none());
    }

    // =========================================================================
    // SCENARIO 4: CHANGE DETECTION
    // =========================================================================

    #[test]
    fn test_scenario_change_detection_rules() {
        let mut session = UnreadCounterSession::new(9).with_last_observed(3);

        assert_eq!(session.observe(3), TickOutcome::Unchanged);
        assert_eq!(LiveUpdate::from(TickOutcome::Unchanged), LiveUpdate::Keepalive);

        let outcome = session.observe(4);
        assert_eq!(outcome, TickOutcome::Changed(4));
        let update = LiveUpdate::from(outcome);
        assert_eq!(update.to_json().as_deref(), Some(r#"{"count":4}"#));
        assert_eq!(session.last_observed, Some(4));

        assert_eq!(session.observe(4), TickOutcome::Unchanged);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scenario_live_session_emits_once_per_change() {
        let runtime = runtime_with_tick(1_000);
        runtime.start().unwrap();
        let container = runtime.container();
        for _ in 0..3 {
            container.content_store.send_message(1, &[9]);
        }

        let mut channel = container.notifier.subscribe(9).unwrap();
        assert_eq!(channel.recv().await, Some(LiveUpdate::Count { count: 3 }));
        assert_eq!(channel.recv().await, Some(LiveUpdate::Keepalive));

        container.content_store.send_message(1, &[9]);

        let mut updates = Vec::new();
        for _ in 0..4 {
            updates.push(channel.recv().await.unwrap());
        }
        let counts: Vec<_> = updates
            .iter()
            .filter(|u| matches!(u, LiveUpdate::Count { .. }))
            .collect();
        assert_eq!(counts, vec![&LiveUpdate::Count { count: 4 }]);
        assert_eq!(updates.last(), Some(&LiveUpdate::Keepalive));

        runtime.shutdown().await;
    }

    // =========================================================================
    // SCENARIO 5: CONNECTION CLOSE MID-TICK
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_scenario_close_mid_tick_ends_loop_before_next_tick() {
        let runtime = runtime_with_tick(1_000);
        let container = runtime.container();
        let subscribers_before = container.event_bus.subscriber_count();

        let mut channel = container.notifier.subscribe(5).unwrap();
        assert_eq!(container.event_bus.subscriber_count(), subscribers_before + 1);
        assert!(channel.recv().await.is_some());
        let tick_started = Instant::now();

        tokio::time::sleep(Duration::from_millis(400)).await;
        drop(channel);

        while container.notifier.active_sessions() > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(tick_started.elapsed() < Duration::from_millis(1_000));
        assert_eq!(container.event_bus.subscriber_count(), subscribers_before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scenario_unsubscribe_mid_tick_closes_channel() {
        let runtime = runtime_with_tick(1_000);
        let container = runtime.container();

        let mut channel = container.notifier.subscribe(6).unwrap();
        assert!(channel.recv().await.is_some());
        let tick_started = Instant::now();

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(container.notifier.unsubscribe(&channel.session_id));

        assert_eq!(channel.recv().await, None);
        assert!(tick_started.elapsed() < Duration::from_millis(1_000));
        assert_eq!(container.notifier.metrics().snapshot().sessions_closed, 1);
    }
}
