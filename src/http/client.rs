use governor::{DefaultDirectRateLimiter, Jitter, Quota, RateLimiter};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::host::errors::{HostError, HostErrorBody};
use crate::observability::host_metrics;

/// Rate-limited JSON client for the host REST API
#[derive(Debug, Clone)]
pub struct RateLimitedHttpClient {
    client: Client,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
    base_url: String,
    timeout: Duration,
}

impl RateLimitedHttpClient {
    /// Create a new rate-limited client.
    ///
    /// `default_headers` carries the host credentials and is sent on every request.
    pub fn new(
        base_url: &str,
        requests_per_second: u32,
        burst_capacity: u32,
        timeout: Duration,
        mut default_headers: HeaderMap,
    ) -> Result<Self, HostError> {
        let per_second = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(burst_capacity).unwrap_or(per_second);
        let quota = Quota::per_second(per_second).allow_burst(burst);
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder().default_headers(default_headers).build()?;

        Ok(Self {
            client,
            rate_limiter,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get_json<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T, HostError>
    where
        T: DeserializeOwned,
    {
        let request = self.client.get(self.url(path)).query(query);
        self.execute(&format!("GET {path}"), request).await
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T, HostError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.client.put(self.url(path)).json(body);
        self.execute(&format!("PUT {path}"), request).await
    }

    /// Send a request once the rate limiter allows it, bounded by the configured timeout
    async fn execute<T>(&self, operation: &str, request: RequestBuilder) -> Result<T, HostError>
    where
        T: DeserializeOwned,
    {
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(50)))
            .await;

        debug!("Executing host API request: {}", operation);
        host_metrics().record_request();

        let response = match tokio::time::timeout(self.timeout, request.send()).await {
            Ok(result) => result.inspect_err(|_| host_metrics().record_error())?,
            Err(_) => {
                host_metrics().record_error();
                return Err(HostError::Timeout {
                    operation: operation.to_string(),
                    duration_ms: self.timeout.as_millis() as u64,
                });
            }
        };

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            host_metrics().record_error();
            let body = serde_json::from_str::<HostErrorBody>(&text).unwrap_or_else(|_| HostErrorBody {
                message: Some(text.clone()).filter(|t| !t.is_empty()),
                ..Default::default()
            });
            warn!(
                operation = %operation,
                status = status.as_u16(),
                code = ?body.code,
                "Host API request failed"
            );
            return Err(HostError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}
