// Installation licensing: remote validation, local cache of the last
// successful date, and the trial banner

pub mod client;
pub mod gate;
pub mod store;

use async_trait::async_trait;
use thiserror::Error;

pub use client::{AuthClient, AuthResponse};
pub use gate::{trial_banner, Activation, AuthCheck, LicenseGate};
pub use store::LicenseStore;

#[derive(Debug, Error)]
pub enum LicenseError {
    #[error("licensing service endpoint is not configured")]
    NotConfigured,
    #[error("licensing token is not a valid header value")]
    InvalidToken,
    #[error("認証失敗: {message}")]
    Rejected { message: String },
    #[error("licensing service request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("licensing service returned an unreadable response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("license store error: {0}")]
    Store(#[from] std::io::Error),
}

/// Whether this installation may perform actions
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LicenseCheck: Send + Sync {
    async fn is_licensed(&self) -> bool;
}

#[async_trait]
impl LicenseCheck for LicenseGate {
    async fn is_licensed(&self) -> bool {
        self.is_authenticated()
    }
}
