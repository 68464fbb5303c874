use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::config::LicenseConfig;
use crate::license::LicenseError;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct AuthRequest {
    pub domain: String,
    pub item_key: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct AuthResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub response: Option<AuthPayload>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct AuthPayload {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "Trial_enddate", default)]
    pub trial_enddate: Option<String>,
}

impl AuthResponse {
    pub fn is_valid(&self) -> bool {
        self.status == "success" && self.response.as_ref().is_some_and(|r| r.status == "valid")
    }

    pub fn message(&self) -> String {
        self.response
            .as_ref()
            .and_then(|r| r.message.clone())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "不明なエラー".to_string())
    }

    pub fn trial_enddate(&self) -> Option<&str> {
        self.response
            .as_ref()
            .and_then(|r| r.trial_enddate.as_deref())
            .filter(|d| !d.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorLog {
    pub domain: String,
    pub item_key: String,
    pub error_context: String,
    pub error_message: String,
    pub timestamp: String,
}

/// Client for the remote licensing service.
#[derive(Debug, Clone)]
pub struct AuthClient {
    client: reqwest::Client,
    endpoint: String,
    error_log_endpoint: Option<String>,
    domain: String,
    item_key: String,
}

impl AuthClient {
    pub fn new(config: &LicenseConfig, domain: impl Into<String>, timeout: Duration) -> Result<Self, LicenseError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = config.auth_token.as_deref().filter(|t| !t.is_empty()) {
            let value = HeaderValue::from_str(token).map_err(|_| LicenseError::InvalidToken)?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            error_log_endpoint: config.error_log_endpoint.clone().filter(|e| !e.is_empty()),
            domain: domain.into(),
            item_key: config.item_key.clone(),
        })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Ask the licensing service whether this domain may use the plugin
    pub async fn authenticate_domain(&self) -> Result<AuthResponse, LicenseError> {
        if self.endpoint.is_empty() {
            return Err(LicenseError::NotConfigured);
        }

        let request = AuthRequest {
            domain: self.domain.clone(),
            item_key: self.item_key.clone(),
        };
        debug!(domain = %self.domain, "Validating installation");

        let response = self.client.post(&self.endpoint).json(&request).send().await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Report a licensing failure. Best effort: failures are only logged.
    pub async fn send_error_log(&self, context: &str, message: &str) {
        let Some(endpoint) = &self.error_log_endpoint else {
            debug!(context, "No error-log endpoint configured");
            return;
        };

        let log = ErrorLog {
            domain: self.domain.clone(),
            item_key: self.item_key.clone(),
            error_context: context.to_string(),
            error_message: message.to_string(),
            timestamp: chrono::Local::now().format("%Y/%m/%d %H:%M:%S").to_string(),
        };

        match self.client.post(endpoint).json(&log).send().await {
            Ok(response) if response.status().is_success() => {
                info!(context, "Error log sent");
            }
            Ok(response) => {
                error!(context, status = %response.status(), "Error log rejected");
            }
            Err(e) => {
                error!(context, error = %e, "Error log could not be sent");
            }
        }
    }
}
