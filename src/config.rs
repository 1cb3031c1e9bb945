//! # Configuration
//!
//! Layered service configuration.
//!
//! Sources, later ones overriding earlier ones:
//!
//! 1. built-in defaults
//! 2. `config/default.toml`, if present
//! 3. the file named by `FARE_CONFIG`, if set
//! 4. environment variables prefixed `FARE__`, with `__` between sections
//!    (`FARE__RATE_LIMIT__CAPACITY=50`)
//!
//! A `.env` file is loaded into the environment first when present.

use crate::application::services::rate_limiter::{
    DEFAULT_CAPACITY, DEFAULT_KEY_PREFIX, RateLimitConfig,
};
use crate::application::services::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

/// Error loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or deserialized.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// Values were read but are not usable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Creates a validation error.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Key rate limiting on `X-Forwarded-For` / `X-Real-IP` instead of the
    /// peer address. Only enable behind a proxy that overwrites them.
    pub trust_proxy_headers: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            trust_proxy_headers: false,
        }
    }
}

impl ServerConfig {
    /// Returns the socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if host and port do not form an address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::invalid(format!("server address: {}", e)))
    }
}

/// Where rate limit windows and cached responses live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Shared Redis instance.
    #[default]
    Redis,
    /// Process-local memory.
    Memory,
}

/// Shared store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend kind.
    pub backend: StoreBackend,
    /// Redis connection URL.
    pub redis_url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Redis,
            redis_url: "redis://localhost:6379".to_string(),
        }
    }
}

/// Price history database settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL URL. History is kept in memory when unset.
    pub url: Option<String>,
    /// Pool size.
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
        }
    }
}

/// Rate limit settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    /// Whether limiting is active.
    pub enabled: bool,
    /// Requests per window.
    pub capacity: u32,
    /// Window length in seconds.
    pub window_secs: u64,
    /// Store key prefix.
    pub key_prefix: String,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: DEFAULT_CAPACITY,
            window_secs: 60,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }
}

impl RateLimitSettings {
    /// Converts to the limiter's configuration.
    #[must_use]
    pub fn to_rate_limit_config(&self) -> RateLimitConfig {
        RateLimitConfig {
            enabled: self.enabled,
            capacity: self.capacity,
            window: Duration::from_secs(self.window_secs),
            key_prefix: self.key_prefix.clone(),
        }
    }
}

/// Response cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Entry lifetime in seconds.
    pub ttl_secs: u64,
    /// Store key prefix.
    pub key_prefix: String,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            key_prefix: crate::infrastructure::cache::redis::DEFAULT_PREFIX.to_string(),
        }
    }
}

impl CacheSettings {
    /// Returns the TTL.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Retry settings applied to every provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Attempts per provider call, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
        }
    }
}

impl RetrySettings {
    /// Converts to a retry policy.
    #[must_use]
    pub fn to_policy(self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.base_delay_ms))
    }
}

/// Kind of provider adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// JSON estimate API.
    Http,
    /// In-process fixture.
    Mock,
}

/// One upstream provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider name, used as the result key.
    pub name: String,
    /// Adapter kind.
    pub kind: ProviderKind,
    /// Base URL for `http` providers.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Per-attempt timeout in milliseconds.
    #[serde(default = "default_provider_timeout_ms")]
    pub timeout_ms: u64,
    /// Currency used when the upstream omits one.
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Fixed price for `mock` providers.
    #[serde(default)]
    pub mock_price: Option<f64>,
    /// Fixed trip estimate for `mock` providers.
    #[serde(default)]
    pub mock_eta_minutes: Option<u32>,
}

impl ProviderConfig {
    /// Creates a mock provider entry.
    #[must_use]
    pub fn mock(name: impl Into<String>, price: f64, eta_minutes: u32) -> Self {
        Self {
            name: name.into(),
            kind: ProviderKind::Mock,
            base_url: None,
            timeout_ms: default_provider_timeout_ms(),
            currency: default_currency(),
            mock_price: Some(price),
            mock_eta_minutes: Some(eta_minutes),
        }
    }

    /// Returns the per-attempt timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_provider_timeout_ms() -> u64 {
    30_000
}

fn default_currency() -> String {
    crate::domain::entities::DEFAULT_CURRENCY.to_string()
}

fn default_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig::mock("uber", 250.0, 12),
        ProviderConfig::mock("ola", 230.0, 14),
        ProviderConfig::mock("rapido", 120.0, 18),
    ]
}

/// Complete service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener.
    pub server: ServerConfig,
    /// Shared store.
    pub store: StoreConfig,
    /// Price history database.
    pub database: DatabaseConfig,
    /// Rate limiting.
    pub rate_limit: RateLimitSettings,
    /// Response cache.
    pub cache: CacheSettings,
    /// Provider retry.
    pub retry: RetrySettings,
    /// Upstream providers.
    pub providers: Vec<ProviderConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            store: StoreConfig::default(),
            database: DatabaseConfig::default(),
            rate_limit: RateLimitSettings::default(),
            cache: CacheSettings::default(),
            retry: RetrySettings::default(),
            providers: default_providers(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from every source and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a source is malformed or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false));
        if let Ok(path) = std::env::var("FARE_CONFIG") {
            builder = builder.add_source(config::File::with_name(&path).required(true));
        }
        let builder = builder.add_source(
            config::Environment::with_prefix("FARE")
                .prefix_separator("__")
                .separator("__"),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values that deserialize fine but cannot work.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first offending value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate_limit.capacity == 0 {
            return Err(ConfigError::invalid("rate_limit.capacity must be positive"));
        }
        if self.rate_limit.window_secs == 0 {
            return Err(ConfigError::invalid("rate_limit.window_secs must be positive"));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::invalid("retry.max_attempts must be positive"));
        }

        let mut seen = HashSet::new();
        for provider in &self.providers {
            let name = provider.name.trim().to_lowercase();
            if name.is_empty() {
                return Err(ConfigError::invalid("provider name is empty"));
            }
            if !seen.insert(name) {
                return Err(ConfigError::invalid(format!(
                    "duplicate provider name: {}",
                    provider.name
                )));
            }
            match provider.kind {
                ProviderKind::Http if provider.base_url.is_none() => {
                    return Err(ConfigError::invalid(format!(
                        "provider {} needs a base_url",
                        provider.name
                    )));
                }
                ProviderKind::Mock if provider.mock_price.is_none() => {
                    return Err(ConfigError::invalid(format!(
                        "provider {} needs a mock_price",
                        provider.name
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_mirror_service_limits() {
        let config = AppConfig::default();
        assert_eq!(config.rate_limit.capacity, 100);
        assert_eq!(config.rate_limit.window_secs, 60);
        assert_eq!(config.cache.ttl(), Duration::from_secs(300));
        assert_eq!(config.retry.to_policy().max_attempts(), 3);
        assert_eq!(
            config.retry.to_policy().base_delay(),
            Duration::from_secs(1)
        );
        assert!(config.providers.iter().all(|p| p.timeout() == Duration::from_secs(30)));
        assert_eq!(config.store.redis_url, "redis://localhost:6379");
        assert!(!config.server.trust_proxy_headers);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_capacity_and_window() {
        let mut config = AppConfig::default();
        config.rate_limit.capacity = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.rate_limit.window_secs = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_duplicate_providers() {
        let mut config = AppConfig::default();
        config.providers.push(ProviderConfig::mock("Uber", 1.0, 1));
        let error = config.validate().unwrap_err();
        assert!(error.to_string().contains("duplicate"));
    }

    #[test]
    fn http_provider_needs_url() {
        let mut config = AppConfig::default();
        config.providers = vec![ProviderConfig {
            kind: ProviderKind::Http,
            ..ProviderConfig::mock("uber", 1.0, 1)
        }];
        assert!(config.validate().is_err());
    }

    #[test]
    fn deserializes_partial_toml() {
        let source = r#"
            [rate_limit]
            capacity = 5

            [store]
            backend = "memory"

            [[providers]]
            name = "uber"
            kind = "http"
            base_url = "http://localhost:9000"
        "#;
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.rate_limit.capacity, 5);
        assert_eq!(config.rate_limit.window_secs, 60);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.providers.len(), 1);
        assert_eq!(config.providers.first().unwrap().timeout_ms, 30_000);
        assert_eq!(config.providers.first().unwrap().currency, "INR");
    }

    #[test]
    fn socket_addr() {
        let addr = ServerConfig::default().socket_addr().unwrap();
        assert_eq!(addr.port(), 8000);
    }
}
