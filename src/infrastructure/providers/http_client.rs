//! # HTTP Client Utilities
//!
//! Shared HTTP client for JSON provider adapters.
//!
//! Wraps a `reqwest` client with a per-request timeout and maps transport
//! and status failures onto [`ProviderError`] kinds:
//!
//! | Condition | Kind |
//! |-----------|------|
//! | transport timeout, 408, 504 | `Timeout` |
//! | any other non-2xx status | `UpstreamRejected` |
//! | body does not decode | `ParseFailure` |
//! | connection refused, DNS, TLS | `Unknown` |
//!
//! # Examples
//!
//! ```ignore
//! use fare_compare::infrastructure::providers::http_client::HttpClient;
//!
//! let client = HttpClient::new(5000)?;
//! let response: MyResponse = client.get_with_params(url, &[("pickup", "a")]).await?;
//! ```

use crate::infrastructure::providers::error::{ProviderError, ProviderResult};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// HTTP client wrapper for provider adapters.
#[derive(Debug, Clone)]
pub struct HttpClient {
    /// Inner reqwest client.
    client: Client,
    /// Request timeout in milliseconds.
    timeout_ms: u64,
}

impl HttpClient {
    /// Creates a new HTTP client with the specified timeout.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Unknown` if the client cannot be created.
    pub fn new(timeout_ms: u64) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| ProviderError::unknown(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, timeout_ms })
    }

    /// Returns the configured timeout in milliseconds.
    #[inline]
    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Makes a GET request with query parameters and deserializes the JSON response.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] classified as described in the module docs.
    pub async fn get_with_params<T: DeserializeOwned, P: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        params: &P,
    ) -> ProviderResult<T> {
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        self.handle_response(response).await
    }

    /// Handles the HTTP response, checking status and deserializing JSON.
    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> ProviderResult<T> {
        let status = response.status();

        if status.is_success() {
            response.json::<T>().await.map_err(|e| {
                if e.is_timeout() {
                    self.map_reqwest_error(e)
                } else {
                    ProviderError::parse_failure(format!("Failed to parse response: {}", e))
                }
            })
        } else {
            let error_body = response.text().await.unwrap_or_default();
            Err(self.map_status_error(status, &error_body))
        }
    }

    /// Maps a reqwest error to a ProviderError.
    fn map_reqwest_error(&self, error: reqwest::Error) -> ProviderError {
        if error.is_timeout() {
            ProviderError::timeout_with_duration("Request timed out", self.timeout_ms)
        } else if error.is_connect() {
            ProviderError::unknown(format!("Connection failed: {}", error))
        } else {
            ProviderError::unknown(format!("HTTP request failed: {}", error))
        }
    }

    /// Maps an HTTP status code to a ProviderError.
    fn map_status_error(&self, status: StatusCode, body: &str) -> ProviderError {
        match status {
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                ProviderError::timeout(format!("Upstream timeout ({}): {}", status, body))
            }
            _ => ProviderError::upstream_rejected_with_status(
                format!("HTTP error ({}): {}", status, body),
                status.as_u16(),
            ),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn new_client() {
        let client = HttpClient::new(5000);
        assert!(client.is_ok());
        assert_eq!(client.unwrap().timeout_ms(), 5000);
    }

    #[test]
    fn gateway_statuses_are_timeouts() {
        let client = HttpClient::new(1000).unwrap();
        let error = client.map_status_error(StatusCode::GATEWAY_TIMEOUT, "");
        assert_eq!(error.kind(), crate::domain::entities::FailureKind::Timeout);
        let error = client.map_status_error(StatusCode::REQUEST_TIMEOUT, "");
        assert_eq!(error.kind(), crate::domain::entities::FailureKind::Timeout);
    }

    #[test]
    fn other_statuses_are_rejections() {
        let client = HttpClient::new(1000).unwrap();
        let error = client.map_status_error(StatusCode::SERVICE_UNAVAILABLE, "down");
        assert_eq!(error.status(), Some(503));
        assert!(error.message().contains("down"));
    }
}
