//! # Feedline Benchmarks
//!
//! Hot paths of the ranking and freshness core:
//!
//! | Subsystem | Path | Target |
//! |-----------|------|--------|
//! | fl-01 Metric Store | `rank_score` | < 100ns |
//! | fl-01 Metric Store | `update_metric` on one entity | < 1µs |
//! | fl-01 Metric Store | `rank_entities` over 1000 ids | < 1ms |
//! | fl-02 Response Cache | cache hit | < 10µs |

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fl_01_metric_store::{rank_score, ContentMetricApi, Counter, MetricDelta, MetricStoreService};
use fl_02_response_cache::{CacheConfig, CacheKey, InMemoryCacheBackend, ResponseCache};
use shared_bus::InMemoryEventBus;
use shared_types::{ContentKind, EntityRef, Subject};

// ============================================================================
// FL-01: Metric Store
// ============================================================================

fn bench_rank_score(c: &mut Criterion) {
    let mut group = c.benchmark_group("fl-01-rank-score");

    group.bench_function("rank_score", |b| {
        b.iter(|| black_box(rank_score(black_box(12_345), black_box(7), black_box(3))))
    });
    group.bench_function("rank_score_zero_decay", |b| {
        b.iter(|| black_box(rank_score(black_box(12_345), black_box(0), black_box(3))))
    });

    group.finish();
}

fn bench_metric_updates(c: &mut Criterion) {
    let mut group = c.benchmark_group("fl-01-metric-store");
    let store = MetricStoreService::new(Arc::new(InMemoryEventBus::new()));
    let entity = EntityRef::tweet(1);
    let _ = store.add_metric(entity);

    group.bench_function("update_metric_upvote", |b| {
        b.iter(|| {
            black_box(store.update_metric(
                entity,
                MetricDelta::incentive(1)
                    .with_counter(Counter::Upvotes, 1)
                    .into(),
            ))
        })
    });

    for size in [100usize, 1_000] {
        let store = MetricStoreService::new(Arc::new(InMemoryEventBus::new()));
        let ids: Vec<i64> = (0..size as i64).collect();
        for id in &ids {
            let _ = store.add_metric(EntityRef::tweet(*id));
            let delta = MetricDelta::incentive(id % 97);
            let _ = store.update_metric(EntityRef::tweet(*id), delta.into());
        }

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("rank_entities", size), &ids, |b, ids| {
            b.iter(|| black_box(store.rank_entities(ContentKind::Tweet, ids, 2)))
        });
    }

    group.finish();
}

// ============================================================================
// FL-02: Response Cache
// ============================================================================

fn bench_cache_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("fl-02-response-cache");
    group.measurement_time(Duration::from_secs(5));

    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => panic!("cannot build runtime: {e}"),
    };
    let cache = match ResponseCache::new(
        Arc::new(InMemoryCacheBackend::new(10_000)),
        CacheConfig::default(),
    ) {
        Ok(cache) => cache,
        Err(e) => panic!("cannot build cache: {e}"),
    };
    let key = CacheKey::list(Subject::User(42), "list", 10, 0);
    rt.block_on(cache.put(
        &key,
        Bytes::from_static(br#"{"list":[],"pager":{"page":1,"page_size":10,"total_rows":0}}"#),
        Duration::from_secs(600),
    ));

    group.bench_function("get_hit", |b| {
        b.iter(|| black_box(rt.block_on(cache.get(&key))))
    });

    group.finish();
}

criterion_group!(benches, bench_rank_score, bench_metric_updates, bench_cache_hit);
criterion_main!(benches);
