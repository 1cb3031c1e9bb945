//! Fare comparison service binary.
//!
//! Loads configuration, builds the stores and providers, and serves the
//! REST API until interrupted.

use anyhow::Context;
use fare_compare::api::rest::{AppState, create_router};
use fare_compare::application::services::{
    AggregationConfig, Aggregator, GuardedProvider, RateLimiter, RequestGovernor, RetryExecutor,
};
use fare_compare::config::{AppConfig, ProviderConfig, ProviderKind, StoreBackend};
use fare_compare::domain::value_objects::{Price, ProviderId};
use fare_compare::infrastructure::cache::{
    InMemoryResponseCache, RedisResponseCache, ResponseCache,
};
use fare_compare::infrastructure::persistence::{
    InMemoryPriceHistoryRepository, PersistenceSink, PostgresPriceHistoryRepository,
    PriceHistoryRepository,
};
use fare_compare::infrastructure::providers::{HttpProvider, MockProvider, ProviderClient};
use fare_compare::infrastructure::sweeper::spawn_memory_sweeper;
use fare_compare::infrastructure::window::{InMemoryTokenWindow, RedisTokenWindow, TokenWindow};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::load().context("loading configuration")?;
    let addr = config.server.socket_addr()?;

    let (window, cache) = build_stores(&config).await?;
    let (sink, history) = build_history(&config).await?;
    let providers = build_providers(&config)?;
    info!(
        providers = providers.len(),
        backend = ?config.store.backend,
        "service components ready"
    );

    let limiter = RateLimiter::new(window, config.rate_limit.to_rate_limit_config());
    let aggregator = Aggregator::new(
        providers,
        cache,
        sink,
        AggregationConfig::with_cache_ttl(config.cache.ttl()),
    );
    let governor = RequestGovernor::new(Arc::new(limiter), Arc::new(aggregator));
    let state = AppState::new(Arc::new(governor), history)
        .with_trusted_proxy_headers(config.server.trust_proxy_headers);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!(%addr, "listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("serving")?;

    info!("shut down");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn build_stores(
    config: &AppConfig,
) -> anyhow::Result<(Arc<dyn TokenWindow>, Arc<dyn ResponseCache>)> {
    match config.store.backend {
        StoreBackend::Memory => {
            let window = Arc::new(InMemoryTokenWindow::new());
            let cache = Arc::new(InMemoryResponseCache::new());
            let rate_window = Duration::from_secs(config.rate_limit.window_secs);
            spawn_memory_sweeper(Arc::clone(&window), Arc::clone(&cache), rate_window, rate_window);
            let window: Arc<dyn TokenWindow> = window;
            let cache: Arc<dyn ResponseCache> = cache;
            Ok((window, cache))
        }
        StoreBackend::Redis => {
            let client = redis::Client::open(config.store.redis_url.as_str())
                .context("parsing redis url")?;
            let connection = client
                .get_connection_manager()
                .await
                .context("connecting to redis")?;
            info!(url = %config.store.redis_url, "connected to redis");
            let window: Arc<dyn TokenWindow> = Arc::new(RedisTokenWindow::new(connection.clone()));
            let cache: Arc<dyn ResponseCache> = Arc::new(RedisResponseCache::new(
                connection,
                config.cache.key_prefix.clone(),
            ));
            Ok((window, cache))
        }
    }
}

async fn build_history(
    config: &AppConfig,
) -> anyhow::Result<(Arc<dyn PersistenceSink>, Arc<dyn PriceHistoryRepository>)> {
    let Some(url) = config.database.url.as_deref() else {
        let repository = Arc::new(InMemoryPriceHistoryRepository::new());
        let sink: Arc<dyn PersistenceSink> = repository.clone();
        let history: Arc<dyn PriceHistoryRepository> = repository;
        return Ok((sink, history));
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(url)
        .await
        .context("connecting to postgres")?;
    let repository = Arc::new(PostgresPriceHistoryRepository::new(pool));
    repository.migrate().await.context("creating schema")?;
    info!("price history stored in postgres");
    let sink: Arc<dyn PersistenceSink> = repository.clone();
    let history: Arc<dyn PriceHistoryRepository> = repository;
    Ok((sink, history))
}

fn build_providers(config: &AppConfig) -> anyhow::Result<Vec<Arc<dyn ProviderClient>>> {
    config
        .providers
        .iter()
        .map(|provider| {
            let inner = build_provider(provider)?;
            let guarded: Arc<dyn ProviderClient> = Arc::new(GuardedProvider::new(
                inner,
                provider.timeout(),
                RetryExecutor::new(config.retry.to_policy()),
            ));
            Ok(guarded)
        })
        .collect()
}

fn build_provider(provider: &ProviderConfig) -> anyhow::Result<Arc<dyn ProviderClient>> {
    let id = ProviderId::new(provider.name.as_str());
    match provider.kind {
        ProviderKind::Http => {
            let base_url = provider
                .base_url
                .as_deref()
                .with_context(|| format!("provider {} has no base_url", provider.name))?;
            let client = HttpProvider::new(
                id,
                base_url,
                provider.currency.as_str(),
                provider.timeout_ms,
            )
            .with_context(|| format!("building provider {}", provider.name))?;
            Ok(Arc::new(client))
        }
        ProviderKind::Mock => {
            let price = provider
                .mock_price
                .with_context(|| format!("provider {} has no mock_price", provider.name))?;
            let price = Price::new(price)
                .with_context(|| format!("provider {} mock_price", provider.name))?;
            let mut mock = MockProvider::quoting(id, price).with_currency(provider.currency.as_str());
            if let Some(eta) = provider.mock_eta_minutes {
                mock = mock.with_eta(eta);
            }
            Ok(Arc::new(mock))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
