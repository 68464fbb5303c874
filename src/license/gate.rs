use chrono::NaiveDate;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::{LicenseConfig, ListFlowConfig};
use crate::license::client::{AuthClient, AuthResponse};
use crate::license::store::{LicenseStore, StoredAuth};
use crate::license::LicenseError;

pub const CONFIG_MISSING: &str = "プラグイン設定が取得できませんでした。";
pub const STATUS_INVALID: &str = "プラグイン認証ステータスが無効です。";
pub const TRIAL_EXPIRED: &str = "プラグインお試し期間が終了しています。";
pub const AUTH_EXCEPTION: &str = "認証中にエラーが発生しました。";

/// Result of a license check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthCheck {
    pub success: bool,
    pub errors: Vec<String>,
}

impl AuthCheck {
    fn ok() -> Self {
        Self {
            success: true,
            errors: Vec::new(),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            errors: vec![message.into()],
        }
    }
}

/// What the settings screen persists after a successful activation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub auth_status: String,
    pub trial_enddate: Option<String>,
}

/// `YYYYMMDD`, the format the licensing service and local store use
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Decides whether this installation may perform actions.
///
/// Validation against the remote service happens at most once per day; the
/// last successful date lives in the local store.
#[derive(Debug)]
pub struct LicenseGate {
    config: LicenseConfig,
    client: AuthClient,
    store: LicenseStore,
    authenticated: AtomicBool,
}

impl LicenseGate {
    pub fn new(config: LicenseConfig, client: AuthClient, store: LicenseStore) -> Self {
        Self {
            config,
            client,
            store,
            authenticated: AtomicBool::new(false),
        }
    }

    /// Gate for the configured plugin, reporting the host's domain
    pub fn from_config(config: &ListFlowConfig) -> Result<Self, LicenseError> {
        let domain = config.license.domain_for(&config.host.base_url);
        let timeout = Duration::from_secs(config.host.timeout_seconds.max(1));
        let client = AuthClient::new(&config.license, domain, timeout)?;
        let store = LicenseStore::new(&config.license.store_path, &config.plugin.plugin_id);
        Ok(Self::new(config.license.clone(), client, store))
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::Relaxed)
    }

    /// Run the check and remember the outcome for `is_authenticated`
    pub async fn initialize(&self) -> AuthCheck {
        let result = self.check_and_reauthenticate().await;
        self.authenticated.store(result.success, Ordering::Relaxed);
        result
    }

    pub async fn check_and_reauthenticate(&self) -> AuthCheck {
        self.check_and_reauthenticate_on(today()).await
    }

    pub async fn check_and_reauthenticate_on(&self, today: NaiveDate) -> AuthCheck {
        let today = date_key(today);

        if self.config.endpoint.is_empty() && self.config.item_key.is_empty() && self.config.auth_status.is_empty() {
            return AuthCheck::failed(CONFIG_MISSING);
        }
        if self.config.auth_status != "valid" {
            return AuthCheck::failed(STATUS_INVALID);
        }
        if !self.config.trial_enddate.is_empty() && self.config.trial_enddate < today {
            return AuthCheck::failed(TRIAL_EXPIRED);
        }

        let stored = self.store.load().await;
        if stored.last_auth_date.as_deref().is_some_and(|d| d >= today.as_str()) {
            info!("Installation already validated today");
            return AuthCheck::ok();
        }

        info!(domain = %self.client.domain(), "Validating installation with licensing service");
        let result = match self.client.authenticate_domain().await {
            Ok(response) if response.is_valid() => {
                let entry = StoredAuth {
                    last_auth_date: Some(today),
                };
                if let Err(e) = self.store.save(&entry).await {
                    warn!(error = %e, "Could not record validation date");
                }
                return AuthCheck::ok();
            }
            Ok(response) => AuthCheck::failed(format!("認証エラー: {}", response.message())),
            Err(e) => {
                error!(error = %e, "Licensing service call failed");
                AuthCheck::failed(AUTH_EXCEPTION)
            }
        };

        let message = result.errors.join("\n");
        error!(errors = %message, "Installation is not licensed");
        self.client.send_error_log("check_and_reauthenticate", &message).await;
        result
    }

    /// Activate the installation from the settings screen
    pub async fn activate(&self) -> Result<Activation, LicenseError> {
        let response: AuthResponse = match self.client.authenticate_domain().await {
            Ok(response) => response,
            Err(e) => {
                self.client.send_error_log("activate", &e.to_string()).await;
                return Err(e);
            }
        };

        if !response.is_valid() {
            let message = response.message();
            self.client.send_error_log("activate", &message).await;
            return Err(LicenseError::Rejected { message });
        }

        Ok(Activation {
            auth_status: "valid".to_string(),
            trial_enddate: response.trial_enddate().map(str::to_string),
        })
    }

    /// Header text shown while the installation is on trial
    pub fn trial_banner(&self, plugin_name: &str, today: NaiveDate) -> Option<String> {
        trial_banner(plugin_name, &self.config.trial_enddate, today)
    }
}

/// Banner text while the trial runs; hidden from the end date itself onward
pub fn trial_banner(plugin_name: &str, trial_enddate: &str, today: NaiveDate) -> Option<String> {
    if trial_enddate.len() != 8 || !trial_enddate.is_ascii() || trial_enddate <= date_key(today).as_str() {
        return None;
    }
    Some(format!(
        "{}　お試し期間中（～{}/{}/{}）",
        plugin_name,
        &trial_enddate[0..4],
        &trial_enddate[4..6],
        &trial_enddate[6..8]
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn gate(server: &MockServer, dir: &TempDir, config: LicenseConfig) -> LicenseGate {
        let config = LicenseConfig {
            endpoint: format!("{}/auth", server.uri()),
            error_log_endpoint: Some(format!("{}/errors", server.uri())),
            item_key: "ITEM".to_string(),
            ..config
        };
        let client = AuthClient::new(&config, "example.cybozu.com", Duration::from_secs(5)).unwrap();
        let store = LicenseStore::new(dir.path().join("license.json"), "listflow");
        LicenseGate::new(config, client, store)
    }

    fn valid() -> LicenseConfig {
        LicenseConfig {
            auth_status: "valid".to_string(),
            ..Default::default()
        }
    }

    async fn mount_auth(server: &MockServer, body: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/auth"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/errors"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_invalid_status_fails_without_network() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let gate = gate(&server, &dir, LicenseConfig::default());

        let result = gate.check_and_reauthenticate_on(date(2026, 10, 16)).await;
        assert_eq!(result, AuthCheck::failed(STATUS_INVALID));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_expired_trial_fails() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let config = LicenseConfig {
            trial_enddate: "20261015".to_string(),
            ..valid()
        };
        let gate = gate(&server, &dir, config);

        let result = gate.check_and_reauthenticate_on(date(2026, 10, 16)).await;
        assert_eq!(result, AuthCheck::failed(TRIAL_EXPIRED));
    }

    #[tokio::test]
    async fn test_success_is_remembered_for_the_day() {
        let server = MockServer::start().await;
        mount_auth(&server, json!({"status": "success", "response": {"status": "valid"}})).await;
        let dir = TempDir::new().unwrap();
        let gate = gate(&server, &dir, valid());

        assert!(gate.check_and_reauthenticate_on(date(2026, 10, 16)).await.success);
        assert!(gate.check_and_reauthenticate_on(date(2026, 10, 16)).await.success);
        assert_eq!(server.received_requests().await.unwrap().len(), 1);

        assert!(gate.check_and_reauthenticate_on(date(2026, 10, 17)).await.success);
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_rejection_reports_message_and_logs_error() {
        let server = MockServer::start().await;
        mount_auth(
            &server,
            json!({"status": "success", "response": {"status": "invalid", "message": "期限切れ"}}),
        )
        .await;
        let dir = TempDir::new().unwrap();
        let gate = gate(&server, &dir, valid());

        let result = gate.check_and_reauthenticate_on(date(2026, 10, 16)).await;
        assert_eq!(result, AuthCheck::failed("認証エラー: 期限切れ"));

        let requests = server.received_requests().await.unwrap();
        assert!(requests.iter().any(|r| r.url.path() == "/errors"));
    }

    #[tokio::test]
    async fn test_initialize_sets_flag() {
        let server = MockServer::start().await;
        mount_auth(&server, json!({"status": "success", "response": {"status": "valid"}})).await;
        let dir = TempDir::new().unwrap();
        let gate = gate(&server, &dir, valid());

        assert!(!gate.is_authenticated());
        gate.initialize().await;
        assert!(gate.is_authenticated());
    }

    #[tokio::test]
    async fn test_activate_returns_trial_end() {
        let server = MockServer::start().await;
        mount_auth(
            &server,
            json!({"status": "success", "response": {"status": "valid", "Trial_enddate": "20261231"}}),
        )
        .await;
        let dir = TempDir::new().unwrap();
        let gate = gate(&server, &dir, LicenseConfig::default());

        let activation = gate.activate().await.unwrap();
        assert_eq!(activation.auth_status, "valid");
        assert_eq!(activation.trial_enddate.as_deref(), Some("20261231"));
    }

    #[test]
    fn test_trial_banner() {
        let today = date(2026, 10, 16);
        assert_eq!(
            trial_banner("一覧アクション", "20261031", today).as_deref(),
            Some("一覧アクション　お試し期間中（～2026/10/31）")
        );
        assert!(trial_banner("p", "20261017", today).is_some());
        assert_eq!(trial_banner("p", "20261016", today), None);
        assert_eq!(trial_banner("p", "20261015", today), None);
        assert_eq!(trial_banner("p", "", today), None);
    }
}
