// Process-management flow: the state graph fetched from the host

pub mod resolver;
pub mod types;

use thiserror::Error;

use crate::host::HostError;

pub use resolver::StatusFlowResolver;
pub use types::{
    normalize_assignee_type, AssigneeType, AssignmentRule, FlowEntry, FlowMap, ProcessAction,
    ProcessFlow, ProcessState,
};

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("process settings unavailable: {0}")]
    Unavailable(#[from] HostError),
    #[error("action `{0}` is not part of the app's process")]
    UnknownAction(String),
    #[error("status `{0}` is not part of the app's process")]
    UnknownState(String),
}
