//! Benchmarks for admission and aggregation with in-process stores.

#![allow(clippy::unwrap_used)]

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use fare_compare::application::services::{
    AggregationConfig, Aggregator, RateLimitConfig, RateLimiter,
};
use fare_compare::domain::value_objects::{ClientIdentity, Price, RouteKey};
use fare_compare::infrastructure::cache::InMemoryResponseCache;
use fare_compare::infrastructure::persistence::InMemoryPriceHistoryRepository;
use fare_compare::infrastructure::providers::{MockProvider, ProviderClient};
use fare_compare::infrastructure::window::InMemoryTokenWindow;
use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

fn aggregator(provider_count: usize, cache_ttl: Duration) -> Aggregator {
    let providers: Vec<Arc<dyn ProviderClient>> = (0..provider_count)
        .map(|i| {
            let provider: Arc<dyn ProviderClient> = Arc::new(MockProvider::quoting(
                format!("p{}", i).as_str(),
                Price::new(100.0 + i as f64).unwrap(),
            ));
            provider
        })
        .collect();
    Aggregator::new(
        providers,
        Arc::new(InMemoryResponseCache::new()),
        Arc::new(InMemoryPriceHistoryRepository::new()),
        AggregationConfig::with_cache_ttl(cache_ttl),
    )
}

fn bench_fan_out(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("fan_out");

    for providers in [1usize, 3, 10] {
        let agg = aggregator(providers, Duration::from_secs(1));
        let mut n = 0u64;
        group.bench_with_input(BenchmarkId::from_parameter(providers), &providers, |b, _| {
            b.to_async(&runtime).iter(|| {
                n += 1;
                let route = RouteKey::new(format!("pickup {}", n), "dropoff");
                let agg = &agg;
                async move { black_box(agg.aggregate(&route).await.unwrap()) }
            });
        });
    }

    group.finish();
}

fn bench_cache_hit(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let agg = aggregator(3, Duration::from_secs(300));
    let route = RouteKey::new("Koramangala", "Indiranagar");
    runtime.block_on(agg.aggregate(&route)).unwrap();

    c.bench_function("cache_hit", |b| {
        b.to_async(&runtime)
            .iter(|| async { black_box(agg.aggregate(&route).await.unwrap()) });
    });
}

fn bench_admission(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let limiter = RateLimiter::new(
        Arc::new(InMemoryTokenWindow::new()),
        RateLimitConfig::new(u32::MAX, Duration::from_secs(1)),
    );
    let clients: Vec<ClientIdentity> = (0..64)
        .map(|i| ClientIdentity::new(format!("10.0.0.{}", i)))
        .collect();
    let mut i = 0usize;

    c.bench_function("admit", |b| {
        b.to_async(&runtime).iter(|| {
            i = (i + 1) % clients.len();
            let client = clients.get(i).unwrap();
            let limiter = &limiter;
            async move { black_box(limiter.admit(client).await.unwrap()) }
        });
    });
}

criterion_group!(benches, bench_fan_out, bench_cache_hit, bench_admission);
criterion_main!(benches);
