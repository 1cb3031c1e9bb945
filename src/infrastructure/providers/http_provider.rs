//! # HTTP Provider
//!
//! [`ProviderClient`] for upstreams exposing a JSON fare estimate endpoint.
//!
//! The adapter calls `GET {base_url}/estimate` with `pickup`, `dropoff` and,
//! for scheduled rides, `timestamp` (RFC 3339) query parameters, and expects:
//!
//! ```json
//! { "price": 245.5, "currency": "INR", "surge_multiplier": 1.2, "estimate_minutes": 9 }
//! ```
//!
//! Only `price` is required.

use crate::domain::entities::{NO_SURGE, Quote, QuoteBuilder};
use crate::domain::value_objects::{Price, ProviderId, RouteKey, Timestamp};
use crate::infrastructure::providers::error::{ProviderError, ProviderResult};
use crate::infrastructure::providers::http_client::HttpClient;
use crate::infrastructure::providers::traits::ProviderClient;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

/// Wire format of an estimate response.
#[derive(Debug, Clone, Deserialize)]
struct EstimateResponse {
    price: f64,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    surge_multiplier: Option<f64>,
    #[serde(default)]
    estimate_minutes: Option<u32>,
}

/// Provider backed by a JSON estimate API.
#[derive(Debug, Clone)]
pub struct HttpProvider {
    id: ProviderId,
    base_url: String,
    currency: String,
    client: HttpClient,
}

impl HttpProvider {
    /// Creates a provider.
    ///
    /// `currency` is used when the upstream omits one.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Unknown` if the HTTP client cannot be built.
    pub fn new(
        id: ProviderId,
        base_url: impl Into<String>,
        currency: impl Into<String>,
        timeout_ms: u64,
    ) -> ProviderResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            id,
            base_url,
            currency: currency.into(),
            client: HttpClient::new(timeout_ms)?,
        })
    }

    /// Returns the base URL.
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn to_quote(&self, response: EstimateResponse) -> ProviderResult<Quote> {
        let price = Price::new(response.price)
            .map_err(|e| ProviderError::parse_failure(format!("invalid price: {}", e)))?;

        QuoteBuilder::new(self.id.clone(), price)
            .currency(response.currency.unwrap_or_else(|| self.currency.clone()))
            .surge_multiplier(response.surge_multiplier.unwrap_or(NO_SURGE))
            .estimate_minutes(response.estimate_minutes.unwrap_or_default())
            .build()
            .map_err(|e| ProviderError::parse_failure(e.to_string()))
    }
}

#[async_trait]
impl ProviderClient for HttpProvider {
    fn provider_id(&self) -> &ProviderId {
        &self.id
    }

    #[instrument(skip(self), fields(provider = %self.id))]
    async fn fetch_quote(&self, route: &RouteKey, at: Option<Timestamp>) -> ProviderResult<Quote> {
        let url = format!("{}/estimate", self.base_url);
        let mut params = vec![
            ("pickup", route.pickup_display().to_string()),
            ("dropoff", route.dropoff_display().to_string()),
        ];
        if let Some(at) = at {
            params.push(("timestamp", at.to_string()));
        }

        let response: EstimateResponse = self.client.get_with_params(&url, &params).await?;
        debug!(price = response.price, "estimate received");
        self.to_quote(response)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::entities::FailureKind;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn route() -> RouteKey {
        RouteKey::new("Koramangala", "Indiranagar")
    }

    async fn provider(server: &MockServer) -> HttpProvider {
        HttpProvider::new(ProviderId::new("uber"), server.uri(), "INR", 500).unwrap()
    }

    #[tokio::test]
    async fn decodes_full_estimate() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/estimate"))
            .and(query_param("pickup", "Koramangala"))
            .and(query_param("dropoff", "Indiranagar"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "price": 245.5,
                "currency": "inr",
                "surge_multiplier": 1.5,
                "estimate_minutes": 9
            })))
            .mount(&server)
            .await;

        let quote = provider(&server).await.fetch_quote(&route(), None).await.unwrap();
        assert_eq!(quote.provider().as_str(), "uber");
        assert!((quote.price().to_f64() - 245.5).abs() < 1e-9);
        assert_eq!(quote.currency(), "INR");
        assert!(quote.is_surging());
        assert_eq!(quote.estimate_minutes(), 9);
    }

    #[tokio::test]
    async fn fills_defaults_for_missing_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/estimate"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "price": 120 })),
            )
            .mount(&server)
            .await;

        let quote = provider(&server).await.fetch_quote(&route(), None).await.unwrap();
        assert_eq!(quote.currency(), "INR");
        assert!(!quote.is_surging());
        assert_eq!(quote.estimate_minutes(), 0);
    }

    #[tokio::test]
    async fn passes_scheduled_time() {
        let server = MockServer::start().await;
        let at = Timestamp::from_secs(1_700_000_000).unwrap();
        Mock::given(method("GET"))
            .and(path("/estimate"))
            .and(query_param("timestamp", at.to_string().as_str()))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "price": 99 })),
            )
            .mount(&server)
            .await;

        let result = provider(&server).await.fetch_quote(&route(), Some(at)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn malformed_body_is_parse_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/estimate"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "fare": "cheap" })),
            )
            .mount(&server)
            .await;

        let error = provider(&server).await.fetch_quote(&route(), None).await.unwrap_err();
        assert_eq!(error.kind(), FailureKind::ParseFailure);
    }

    #[tokio::test]
    async fn non_positive_price_is_parse_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/estimate"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "price": -4 })),
            )
            .mount(&server)
            .await;

        let error = provider(&server).await.fetch_quote(&route(), None).await.unwrap_err();
        assert_eq!(error.kind(), FailureKind::ParseFailure);
    }

    #[tokio::test]
    async fn server_error_is_upstream_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/estimate"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let error = provider(&server).await.fetch_quote(&route(), None).await.unwrap_err();
        assert_eq!(error.kind(), FailureKind::UpstreamRejected);
        assert_eq!(error.status(), Some(503));
    }

    #[tokio::test]
    async fn slow_upstream_is_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/estimate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "price": 1 }))
                    .set_delay(std::time::Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let error = provider(&server).await.fetch_quote(&route(), None).await.unwrap_err();
        assert_eq!(error.kind(), FailureKind::Timeout);
    }
}
