use serde::{Deserialize, Serialize};

/// Host error code returned when the record's state changed underneath the
/// caller or the action's conditions are not met.
pub const CONFLICT_CODE: &str = "GAIA_IL03";

pub const CONFLICT_MESSAGE: &str =
    "ステータス変更に失敗しました。ほかのユーザーがステータスを変更したか、アクションの実行条件を満たしていません。";

pub const UNKNOWN_ERROR_MESSAGE: &str = "不明なエラー";

/// Error payload the host sends alongside non-2xx responses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Option<serde_json::Value>,
}

#[derive(Debug)]
pub enum HostError {
    CredentialsNotFound(String),
    ConfigNotFound(String),
    Api { status: u16, body: HostErrorBody },
    Http(reqwest::Error),
    Decode(serde_json::Error),
    IoError(std::io::Error),
    Timeout { operation: String, duration_ms: u64 },
}

impl HostError {
    /// Host error code, when the host sent one
    pub fn code(&self) -> Option<&str> {
        match self {
            HostError::Api { body, .. } => body.code.as_deref(),
            _ => None,
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.code() == Some(CONFLICT_CODE)
    }

    /// Short message suitable for an alert shown to the viewer
    pub fn user_message(&self) -> String {
        if self.is_conflict() {
            return CONFLICT_MESSAGE.to_string();
        }
        match self {
            HostError::Api { body, .. } => body
                .message
                .clone()
                .filter(|m| !m.is_empty())
                .or_else(|| body.code.clone())
                .or_else(|| body.errors.as_ref().map(|e| e.to_string()))
                .unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string()),
            HostError::Http(err) => err.to_string(),
            HostError::Decode(err) => err.to_string(),
            HostError::IoError(err) => err.to_string(),
            HostError::CredentialsNotFound(msg) | HostError::ConfigNotFound(msg) => msg.clone(),
            HostError::Timeout { operation, duration_ms } => {
                format!("{operation} timed out after {duration_ms}ms")
            }
        }
    }
}

impl From<reqwest::Error> for HostError {
    fn from(err: reqwest::Error) -> Self {
        HostError::Http(err)
    }
}

impl From<serde_json::Error> for HostError {
    fn from(err: serde_json::Error) -> Self {
        HostError::Decode(err)
    }
}

impl From<std::io::Error> for HostError {
    fn from(err: std::io::Error) -> Self {
        HostError::IoError(err)
    }
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostError::CredentialsNotFound(msg) => {
                writeln!(f, "Host Authentication Error")?;
                writeln!(f, "─────────────────────────")?;
                write!(f, "🔑 {msg}\n\n")?;
                writeln!(f, "🔧 QUICK FIXES:")?;
                writeln!(f, "   → Set an API token: export LISTFLOW_HOST__API_TOKEN=your_token")?;
                write!(f, "   → Or set host.api_token in listflow.toml")
            }
            HostError::ConfigNotFound(msg) => {
                writeln!(f, "Host Configuration Error")?;
                writeln!(f, "────────────────────────")?;
                write!(f, "📂 {msg}\n\n")?;
                writeln!(f, "🔧 QUICK FIXES:")?;
                writeln!(f, "   → Set host.base_url and host.app_id in listflow.toml")?;
                write!(f, "   → Or export LISTFLOW_HOST__BASE_URL / LISTFLOW_HOST__APP_ID")
            }
            HostError::Api { status, body } => {
                writeln!(f, "Host API Error")?;
                writeln!(f, "──────────────")?;
                writeln!(
                    f,
                    "🌐 HTTP {}: {} ({})",
                    status,
                    body.message.as_deref().unwrap_or("no message"),
                    body.code.as_deref().unwrap_or("no code")
                )?;
                writeln!(f)?;

                if body.code.as_deref() == Some(CONFLICT_CODE) {
                    writeln!(f, "🔧 STATUS CONFLICT:")?;
                    writeln!(f, "   → Another user changed the record status")?;
                    write!(f, "   → Or the action's conditions are not met; reload and retry")
                } else {
                    match status {
                        401 => {
                            writeln!(f, "🔧 AUTHENTICATION FAILED:")?;
                            write!(f, "   → API token is invalid or lacks access to this app")
                        }
                        403 => {
                            writeln!(f, "🔧 PERMISSION DENIED:")?;
                            write!(f, "   → The token or user cannot run this operation")
                        }
                        404 => {
                            writeln!(f, "🔧 RESOURCE NOT FOUND:")?;
                            write!(f, "   → Check host.app_id and the record id")
                        }
                        _ => {
                            writeln!(f, "🔧 TROUBLESHOOTING:")?;
                            writeln!(f, "   → Check host.base_url and connectivity")?;
                            write!(f, "   → Inspect the error id with the host administrator")
                        }
                    }
                }
            }
            HostError::Http(err) => {
                writeln!(f, "Host Network Error")?;
                writeln!(f, "──────────────────")?;
                write!(f, "🌐 {err}\n\n")?;
                writeln!(f, "🔧 TROUBLESHOOTING:")?;
                writeln!(f, "   → Check internet connectivity")?;
                write!(f, "   → Verify host.base_url resolves and accepts HTTPS")
            }
            HostError::Decode(err) => {
                writeln!(f, "Host Response Error")?;
                writeln!(f, "───────────────────")?;
                write!(f, "📄 Unexpected response shape: {err}")
            }
            HostError::IoError(err) => {
                writeln!(f, "File System Error")?;
                writeln!(f, "─────────────────")?;
                write!(f, "📁 {err}")
            }
            HostError::Timeout { operation, duration_ms } => {
                writeln!(f, "Host Operation Timeout")?;
                writeln!(f, "──────────────────────")?;
                write!(f, "⏰ Operation '{operation}' timed out after {duration_ms}ms")
            }
        }
    }
}

impl std::error::Error for HostError {}
