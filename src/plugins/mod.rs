// Plugins: event handlers wired to the host's record screens

pub mod configure;
pub mod initial_status;
pub mod list_action;
pub mod trial;

use thiserror::Error;

use crate::flow::FlowError;
use crate::host::HostError;
use crate::license::LicenseError;

pub use configure::{save_initial_status_settings, save_list_action_settings, InitialStatusSettings, ListActionSettings};
pub use initial_status::{InitialStatusPlugin, INITIAL_ACTION_FAILED};
pub use list_action::ListActionPlugin;
pub use trial::TrialBanner;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("プラグイン設定が未完了です。設定画面で操作フィールドを選択してください。")]
    MissingOperationField,
    #[error("表示するアクションを 1 つ以上選択してください。")]
    NoActionsSelected,
    #[error("自動で実施するアクションを選択してください。")]
    MissingInitialAction,
    #[error("event {0} carries no record")]
    MissingRecord(String),
    #[error("アプリのプロセス管理設定情報の取得に失敗しました。kintone管理者にご相談ください。")]
    ProcessUnavailable(#[source] FlowError),
    #[error(transparent)]
    Flow(#[from] FlowError),
    #[error(transparent)]
    Host(#[from] HostError),
    #[error(transparent)]
    License(#[from] LicenseError),
}
