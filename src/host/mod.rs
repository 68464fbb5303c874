pub mod client;
pub mod errors;
pub mod types;

#[cfg(test)]
pub mod mocks;

pub use client::{HostApi, HostClient};
pub use errors::{HostError, HostErrorBody, CONFLICT_CODE};
pub use types::{ProcessConfig, StatusUpdate};
