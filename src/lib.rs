// listflow - process-management actions for kintone list views
// This exposes the core components for the CLI, testing and integration

pub mod assignee;
pub mod cli;
pub mod config;
pub mod events;
pub mod flow;
pub mod host;
pub mod http;
pub mod license;
pub mod listview;
pub mod observability;
pub mod plugins;
pub mod record;
pub mod telemetry;

// Re-export key types for easy access
pub use assignee::{AssigneeResolver, ReturnToCreatorPolicy};
pub use config::{config, init_config, ListFlowConfig};
pub use events::{EventDispatcher, EventEffects, EventHandler, EventType, PluginEvent};
pub use flow::{AssigneeType, FlowEntry, FlowError, FlowMap, ProcessFlow, StatusFlowResolver};
pub use host::{HostApi, HostClient, HostError, StatusUpdate};
pub use http::RateLimitedHttpClient;
pub use license::{LicenseCheck, LicenseError, LicenseGate};
pub use listview::{ActionButton, AllowedActions, ClickOutcome, ListActionRenderer, ListView, RenderedRow};
pub use observability::{host_metrics, HostApiMetrics, OperationTimer};
pub use plugins::{InitialStatusPlugin, ListActionPlugin, PluginError, TrialBanner};
pub use record::{Record, RecordStatusInfo, StatusFieldLocator};
pub use telemetry::{generate_correlation_id, init_telemetry};
