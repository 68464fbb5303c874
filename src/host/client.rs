use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::HostConfig;
use crate::host::errors::HostError;
use crate::host::types::{ProcessConfig, RecordResponse, StatusUpdate, StatusUpdateResponse};
use crate::http::RateLimitedHttpClient;
use crate::record::Record;

const API_TOKEN_HEADER: &str = "x-cybozu-api-token";

/// Host REST operations the core depends on; mocked in tests
#[async_trait]
pub trait HostApi: Send + Sync {
    /// Process-management settings of an app
    async fn fetch_process_config(&self, app: u64) -> Result<ProcessConfig, HostError>;

    /// A full record by id
    async fn fetch_record(&self, app: u64, id: &str) -> Result<Record, HostError>;

    /// Run a process action on a record
    async fn update_status(&self, update: &StatusUpdate) -> Result<StatusUpdateResponse, HostError>;
}

#[derive(Debug, Clone)]
pub struct HostClient {
    http: RateLimitedHttpClient,
    guest_space_id: Option<u64>,
}

impl HostClient {
    pub fn new(config: &HostConfig) -> Result<Self, HostError> {
        if config.base_url.trim().is_empty() {
            return Err(HostError::ConfigNotFound(
                "Host base URL is not configured.".to_string(),
            ));
        }

        let token = config
            .api_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                HostError::CredentialsNotFound(
                    "Host API token not found. Set host.api_token or LISTFLOW_HOST__API_TOKEN."
                        .to_string(),
                )
            })?;

        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(token).map_err(|_| {
            HostError::CredentialsNotFound("Host API token contains invalid characters".to_string())
        })?;
        headers.insert(HeaderName::from_static(API_TOKEN_HEADER), value);

        let http = RateLimitedHttpClient::new(
            &config.base_url,
            config.rate_limit.requests_per_second,
            config.rate_limit.burst_capacity,
            Duration::from_secs(config.timeout_seconds.max(1)),
            headers,
        )?;

        info!(base_url = %http.base_url(), "Host client ready");
        Ok(Self {
            http,
            guest_space_id: config.guest_space_id,
        })
    }

    /// REST path for an endpoint, honoring guest spaces
    pub fn api_path(&self, endpoint: &str) -> String {
        match self.guest_space_id {
            Some(space) => format!("/k/guest/{space}/v1/{endpoint}.json"),
            None => format!("/k/v1/{endpoint}.json"),
        }
    }
}

#[async_trait]
impl HostApi for HostClient {
    async fn fetch_process_config(&self, app: u64) -> Result<ProcessConfig, HostError> {
        debug!(app, "Fetching process management settings");
        self.http
            .get_json(&self.api_path("app/status"), &[("app", app.to_string())])
            .await
    }

    async fn fetch_record(&self, app: u64, id: &str) -> Result<Record, HostError> {
        debug!(app, record_id = %id, "Fetching record");
        let response: RecordResponse = self
            .http
            .get_json(
                &self.api_path("record"),
                &[("app", app.to_string()), ("id", id.to_string())],
            )
            .await?;
        Ok(response.record)
    }

    async fn update_status(&self, update: &StatusUpdate) -> Result<StatusUpdateResponse, HostError> {
        info!(
            app = update.app,
            record_id = %update.id,
            action = %update.action,
            assignee = ?update.assignee,
            "Updating record status"
        );
        self.http.put_json(&self.api_path("record/status"), update).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_config() -> HostConfig {
        HostConfig {
            base_url: "https://example.cybozu.com".to_string(),
            app_id: 1,
            api_token: Some("token".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_token_is_reported() {
        let config = HostConfig {
            api_token: None,
            ..host_config()
        };
        let err = HostClient::new(&config).unwrap_err();
        assert!(matches!(err, HostError::CredentialsNotFound(_)));
    }

    #[test]
    fn test_missing_base_url_is_reported() {
        let config = HostConfig {
            base_url: String::new(),
            ..host_config()
        };
        assert!(matches!(HostClient::new(&config).unwrap_err(), HostError::ConfigNotFound(_)));
    }

    #[test]
    fn test_api_path_for_guest_space() {
        let client = HostClient::new(&host_config()).unwrap();
        assert_eq!(client.api_path("record/status"), "/k/v1/record/status.json");

        let guest = HostClient::new(&HostConfig {
            guest_space_id: Some(3),
            ..host_config()
        })
        .unwrap();
        assert_eq!(guest.api_path("app/status"), "/k/guest/3/v1/app/status.json");
    }
}
