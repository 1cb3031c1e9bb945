//! # Fare Aggregator
//!
//! Concurrent quote collection across every registered provider.
//!
//! The [`Aggregator`] validates the route, serves from the
//! [`ResponseCache`] when it can, and otherwise fans out one task per
//! provider into a [`JoinSet`]. Every provider gets an entry in the result:
//! a quote, or the kind and message of its failure. Nothing a single
//! provider does (error, hang, panic) can fail the whole request.
//!
//! Dropping the future returned by [`Aggregator::aggregate`] drops the
//! `JoinSet`, which aborts provider tasks still in flight. Persistence
//! tasks are detached and run to completion regardless.

use crate::application::error::AggregationError;
use crate::domain::entities::{AggregateResult, FailureKind, ProviderFailure, ProviderOutcome};
use crate::domain::value_objects::{ProviderId, RouteKey, Timestamp};
use crate::infrastructure::cache::ResponseCache;
use crate::infrastructure::persistence::PersistenceSink;
use crate::infrastructure::providers::ProviderClient;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

/// Default cache TTL for aggregate results.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Configuration for the aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationConfig {
    /// How long a result stays in the cache.
    pub cache_ttl: Duration,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }
}

impl AggregationConfig {
    /// Creates a configuration with the given cache TTL.
    #[must_use]
    pub fn with_cache_ttl(cache_ttl: Duration) -> Self {
        Self { cache_ttl }
    }
}

/// Fan-out/fan-in fare aggregator.
#[derive(Debug, Clone)]
pub struct Aggregator {
    providers: Vec<Arc<dyn ProviderClient>>,
    cache: Arc<dyn ResponseCache>,
    sink: Arc<dyn PersistenceSink>,
    config: AggregationConfig,
}

impl Aggregator {
    /// Creates an aggregator.
    #[must_use]
    pub fn new(
        providers: Vec<Arc<dyn ProviderClient>>,
        cache: Arc<dyn ResponseCache>,
        sink: Arc<dyn PersistenceSink>,
        config: AggregationConfig,
    ) -> Self {
        Self {
            providers,
            cache,
            sink,
            config,
        }
    }

    /// Returns the configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    /// Returns the names of the registered providers.
    #[must_use]
    pub fn provider_ids(&self) -> Vec<ProviderId> {
        self.providers
            .iter()
            .map(|p| p.provider_id().clone())
            .collect()
    }

    /// Aggregates quotes for an immediate ride.
    ///
    /// # Errors
    ///
    /// - `AggregationError::InvalidRoute` if pickup or dropoff is empty, or
    ///   both are the same place
    /// - `AggregationError::DependencyUnavailable` if the cache read fails
    pub async fn aggregate(&self, route: &RouteKey) -> Result<AggregateResult, AggregationError> {
        self.aggregate_at(route, None).await
    }

    /// Aggregates quotes for a ride at `at`, or now when `None`.
    ///
    /// Scheduled and immediate lookups are cached under different keys.
    ///
    /// # Errors
    ///
    /// See [`Aggregator::aggregate`].
    #[instrument(skip(self, route), fields(route = %route))]
    pub async fn aggregate_at(
        &self,
        route: &RouteKey,
        at: Option<Timestamp>,
    ) -> Result<AggregateResult, AggregationError> {
        route.validate()?;

        let cache_key = route.cache_key(at);
        if let Some(cached) = self.cache.get(&cache_key).await? {
            debug!(cache_key = %cache_key, "cache hit");
            return Ok(cached);
        }

        let prices = self.collect(route, at).await;
        let result = AggregateResult::new(route.clone(), Timestamp::now(), prices);
        info!(
            quoted = result.quoted_count(),
            failed = result.failed_count(),
            "aggregation complete"
        );

        if let Err(e) = self
            .cache
            .put(&cache_key, &result, self.config.cache_ttl)
            .await
        {
            warn!(cache_key = %cache_key, error = %e, "failed to cache aggregate result");
        }

        self.persist(route, &result);
        Ok(result)
    }

    /// Queries every provider concurrently and waits for all of them.
    async fn collect(
        &self,
        route: &RouteKey,
        at: Option<Timestamp>,
    ) -> BTreeMap<ProviderId, ProviderOutcome> {
        let mut tasks = JoinSet::new();
        let mut task_providers = HashMap::with_capacity(self.providers.len());

        for provider in &self.providers {
            let provider = Arc::clone(provider);
            let route = route.clone();
            let id = provider.provider_id().clone();
            let handle = tasks.spawn(async move { provider.fetch_quote(&route, at).await });
            task_providers.insert(handle.id(), id);
        }

        let mut prices = BTreeMap::new();
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((task_id, Ok(quote))) => {
                    if let Some(id) = task_providers.remove(&task_id) {
                        prices.insert(id, ProviderOutcome::Quoted(quote));
                    }
                }
                Ok((task_id, Err(error))) => {
                    if let Some(id) = task_providers.remove(&task_id) {
                        debug!(provider = %id, error = %error, "provider failed");
                        prices.insert(id, ProviderOutcome::Failed(error.to_failure()));
                    }
                }
                Err(join_error) => {
                    if let Some(id) = task_providers.remove(&join_error.id()) {
                        warn!(provider = %id, error = %join_error, "provider task panicked");
                        prices.insert(
                            id,
                            ProviderOutcome::Failed(ProviderFailure::new(
                                FailureKind::Unknown,
                                format!("provider task failed: {}", join_error),
                            )),
                        );
                    }
                }
            }
        }

        prices
    }

    /// Hands each successful quote to the sink on a detached task.
    fn persist(&self, route: &RouteKey, result: &AggregateResult) {
        for quote in result.quotes() {
            let sink = Arc::clone(&self.sink);
            let route = route.clone();
            let quote = quote.clone();
            tokio::spawn(async move {
                if let Err(e) = sink.record(&route, &quote).await {
                    warn!(
                        provider = %quote.provider(),
                        route = %route,
                        error = %e,
                        "failed to persist quote"
                    );
                }
            });
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::entities::Quote;
    use crate::domain::value_objects::Price;
    use crate::infrastructure::cache::{CacheError, CacheResult, InMemoryResponseCache};
    use crate::infrastructure::persistence::InMemoryPriceHistoryRepository;
    use crate::infrastructure::providers::{MockProvider, ProviderError, ProviderResult};
    use async_trait::async_trait;

    #[derive(Debug)]
    struct PanickingProvider {
        id: ProviderId,
    }

    #[async_trait]
    impl ProviderClient for PanickingProvider {
        fn provider_id(&self) -> &ProviderId {
            &self.id
        }

        #[allow(clippy::panic)]
        async fn fetch_quote(&self, _: &RouteKey, _: Option<Timestamp>) -> ProviderResult<Quote> {
            panic!("scraper crashed")
        }
    }

    #[derive(Debug)]
    struct BrokenCache;

    #[async_trait]
    impl ResponseCache for BrokenCache {
        async fn get(&self, _: &str) -> CacheResult<Option<AggregateResult>> {
            Err(CacheError::connection("refused"))
        }

        async fn put(&self, _: &str, _: &AggregateResult, _: Duration) -> CacheResult<()> {
            Err(CacheError::connection("refused"))
        }

        async fn invalidate(&self, _: &str) -> CacheResult<()> {
            Ok(())
        }
    }

    fn aggregator(providers: Vec<Arc<dyn ProviderClient>>) -> Aggregator {
        Aggregator::new(
            providers,
            Arc::new(InMemoryResponseCache::new()),
            Arc::new(InMemoryPriceHistoryRepository::new()),
            AggregationConfig::default(),
        )
    }

    fn quoting(name: &str, price: f64) -> Arc<MockProvider> {
        Arc::new(MockProvider::quoting(name, Price::new(price).unwrap()))
    }

    #[tokio::test]
    async fn partial_failure_is_tolerated() {
        let agg = aggregator(vec![
            quoting("uber", 250.0),
            quoting("ola", 230.0),
            Arc::new(MockProvider::failing(
                "rapido",
                ProviderError::parse_failure("bad json"),
            )),
        ]);

        let result = agg.aggregate(&RouteKey::new("a", "b")).await.unwrap();
        assert_eq!(result.quoted_count(), 2);
        assert_eq!(result.failed_count(), 1);
        let failure = result
            .outcome(&ProviderId::new("rapido"))
            .unwrap()
            .failure()
            .unwrap();
        assert_eq!(failure.error, FailureKind::ParseFailure);
        assert_eq!(result.cheapest().unwrap().provider().as_str(), "ola");
    }

    #[tokio::test]
    async fn all_failures_still_return_a_result() {
        let agg = aggregator(vec![Arc::new(MockProvider::failing(
            "uber",
            ProviderError::timeout("slow"),
        ))]);
        let result = agg.aggregate(&RouteKey::new("a", "b")).await.unwrap();
        assert_eq!(result.quoted_count(), 0);
        assert_eq!(result.failed_count(), 1);
    }

    #[tokio::test]
    async fn no_providers_gives_empty_result() {
        let result = aggregator(vec![]).aggregate(&RouteKey::new("a", "b")).await.unwrap();
        assert!(result.prices().is_empty());
    }

    #[tokio::test]
    async fn panic_is_recorded_as_unknown() {
        let agg = aggregator(vec![
            quoting("uber", 250.0),
            Arc::new(PanickingProvider {
                id: ProviderId::new("meru"),
            }),
        ]);
        let result = agg.aggregate(&RouteKey::new("a", "b")).await.unwrap();
        let failure = result
            .outcome(&ProviderId::new("meru"))
            .unwrap()
            .failure()
            .unwrap();
        assert_eq!(failure.error, FailureKind::Unknown);
        assert!(result.outcome(&ProviderId::new("uber")).unwrap().is_quoted());
    }

    #[tokio::test]
    async fn invalid_route_is_rejected_before_fan_out() {
        let uber = quoting("uber", 250.0);
        let agg = aggregator(vec![uber.clone()]);
        let error = agg.aggregate(&RouteKey::new("  ", "b")).await.unwrap_err();
        assert!(matches!(error, AggregationError::InvalidRoute(_)));
        let error = agg.aggregate(&RouteKey::new("A", " a ")).await.unwrap_err();
        assert!(matches!(error, AggregationError::InvalidRoute(_)));
        assert_eq!(uber.calls(), 0);
    }

    #[tokio::test]
    async fn second_call_is_served_from_cache() {
        let uber = quoting("uber", 250.0);
        let agg = aggregator(vec![uber.clone()]);
        let route = RouteKey::new("Koramangala", "Indiranagar");

        let first = agg.aggregate(&route).await.unwrap();
        let second = agg
            .aggregate(&RouteKey::new("koramangala ", "INDIRANAGAR"))
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(uber.calls(), 1);
    }

    #[tokio::test]
    async fn scheduled_lookups_use_their_own_cache_entry() {
        let uber = quoting("uber", 250.0);
        let agg = aggregator(vec![uber.clone()]);
        let route = RouteKey::new("a", "b");

        agg.aggregate(&route).await.unwrap();
        agg.aggregate_at(&route, Timestamp::from_secs(1_700_000_000))
            .await
            .unwrap();
        assert_eq!(uber.calls(), 2);
    }

    #[tokio::test]
    async fn cache_read_failure_is_dependency_error() {
        let agg = Aggregator::new(
            vec![quoting("uber", 250.0)],
            Arc::new(BrokenCache),
            Arc::new(InMemoryPriceHistoryRepository::new()),
            AggregationConfig::default(),
        );
        let error = agg.aggregate(&RouteKey::new("a", "b")).await.unwrap_err();
        assert!(matches!(error, AggregationError::DependencyUnavailable(_)));
    }

    #[tokio::test]
    async fn successful_quotes_are_persisted() {
        let history = Arc::new(InMemoryPriceHistoryRepository::new());
        let agg = Aggregator::new(
            vec![
                quoting("uber", 250.0),
                Arc::new(MockProvider::failing("ola", ProviderError::unknown("x"))),
            ],
            Arc::new(InMemoryResponseCache::new()),
            history.clone(),
            AggregationConfig::default(),
        );
        agg.aggregate(&RouteKey::new("a", "b")).await.unwrap();

        for _ in 0..50 {
            if history.record_count().await == 1 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(history.record_count().await, 1);
    }
}
