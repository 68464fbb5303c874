use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for listflow
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ListFlowConfig {
    /// Host platform connection
    pub host: HostConfig,
    /// List-action plugin settings (what the config screen persists)
    pub plugin: PluginConfig,
    /// Installation licensing
    pub license: LicenseConfig,
    /// Initial-status plugin settings
    pub initial_status: InitialStatusConfig,
    /// Observability settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HostConfig {
    /// Base URL of the host, e.g. https://example.cybozu.com
    pub base_url: String,
    /// Application id the plugin is installed in
    pub app_id: u64,
    /// API token (can be set via env var)
    pub api_token: Option<String>,
    /// Guest space id when the app lives in a guest space
    pub guest_space_id: Option<u64>,
    /// Identity code of the viewing user
    pub viewer: Option<String>,
    /// Rate limiting settings
    pub rate_limit: RateLimitConfig,
    /// Per-request timeout
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    pub requests_per_second: u32,
    pub burst_capacity: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PluginConfig {
    pub plugin_id: String,
    /// Display name used in the trial banner
    pub name: String,
    /// Field whose list cells host the action buttons
    pub op_field_code: String,
    /// JSON array of action names shown in the list; empty means all
    pub allowed_actions: String,
    /// Hide the operation field on create/edit screens
    pub hide_on_input: bool,
    pub status_field_code: Option<String>,
    pub assignee_field_code: Option<String>,
    pub creator_field_code: Option<String>,
    /// Field read for field-derived assignment when the process rule names none
    pub next_assignee_field_code: Option<String>,
    /// Scan records by field type and label when codes are not configured
    pub label_fallback: bool,
    pub return_to_creator: ReturnToCreatorConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReturnToCreatorConfig {
    pub enabled: bool,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LicenseConfig {
    /// Domain-validation endpoint
    pub endpoint: String,
    pub error_log_endpoint: Option<String>,
    pub auth_token: Option<String>,
    pub item_key: String,
    /// Domain reported to the licensing service; defaults to the host of `host.base_url`
    pub domain: Option<String>,
    /// `valid` once the config screen activated the installation
    pub auth_status: String,
    /// Trial end date as `YYYYMMDD`, empty when not on trial
    pub trial_enddate: String,
    /// Local store for the last successful validation date
    pub store_path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InitialStatusConfig {
    pub enabled: bool,
    pub action_to_complete: String,
    pub initial_status: String,
    pub draft_button_label: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level
    pub log_level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            app_id: 0,
            api_token: None,
            guest_space_id: None,
            viewer: None,
            rate_limit: RateLimitConfig {
                requests_per_second: 5,
                burst_capacity: 10,
            },
            timeout_seconds: 30,
        }
    }
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            plugin_id: "listflow".to_string(),
            name: "一覧アクションボタンプラグイン".to_string(),
            op_field_code: String::new(),
            allowed_actions: "[]".to_string(),
            hide_on_input: false,
            status_field_code: None,
            assignee_field_code: None,
            creator_field_code: None,
            next_assignee_field_code: None,
            label_fallback: true,
            return_to_creator: ReturnToCreatorConfig::default(),
        }
    }
}

impl Default for ReturnToCreatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            keywords: vec!["差し戻".to_string(), "戻".to_string()],
        }
    }
}

impl Default for LicenseConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            error_log_endpoint: None,
            auth_token: None,
            item_key: String::new(),
            domain: None,
            auth_status: String::new(),
            trial_enddate: String::new(),
            store_path: ".listflow/license.json".to_string(),
        }
    }
}

impl Default for InitialStatusConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            action_to_complete: String::new(),
            initial_status: String::new(),
            draft_button_label: "下書き保存".to_string(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}

impl LicenseConfig {
    /// Domain to validate, falling back to the host name of the base URL
    pub fn domain_for(&self, base_url: &str) -> String {
        if let Some(domain) = self.domain.as_ref().filter(|d| !d.is_empty()) {
            return domain.clone();
        }
        reqwest::Url::parse(base_url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .unwrap_or_default()
    }
}

impl ListFlowConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (listflow.toml, .listflow-rc)
    /// 3. Environment variables (prefixed with LISTFLOW_, nested with `__`)
    pub fn load() -> Result<Self> {
        Self::load_with(None)
    }

    pub fn load_with(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        match path {
            Some(path) => {
                builder = builder.add_source(File::from(path));
            }
            None => {
                if Path::new("listflow.toml").exists() {
                    builder = builder.add_source(File::with_name("listflow"));
                }
                if Path::new(".listflow-rc").exists() {
                    builder = builder.add_source(
                        File::with_name(".listflow-rc").format(config::FileFormat::Toml),
                    );
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("LISTFLOW")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut listflow_config: ListFlowConfig = builder.build()?.try_deserialize()?;

        // Host token may also come from the conventional variable
        if listflow_config.host.api_token.is_none() {
            if let Ok(token) = std::env::var("KINTONE_API_TOKEN") {
                listflow_config.host.api_token = Some(token);
            }
        }

        Ok(listflow_config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.as_ref().parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<ListFlowConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        let _ = ListFlowConfig::load_env_file();
        ListFlowConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static ListFlowConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Initialize configuration (called at startup)
pub fn init_config() -> Result<()> {
    let _config = config()?;
    tracing::info!("Configuration loaded successfully");
    Ok(())
}
