use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::flow::types::ProcessFlow;
use crate::flow::FlowError;
use crate::host::HostApi;
use crate::observability::OperationTimer;

/// Fetches the app's process-management settings once per session.
///
/// A successful fetch is cached for the life of the resolver. Failures are
/// not cached and degrade to an empty flow.
pub struct StatusFlowResolver {
    host: Arc<dyn HostApi>,
    app_id: u64,
    flow: OnceCell<Arc<ProcessFlow>>,
}

impl std::fmt::Debug for StatusFlowResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusFlowResolver")
            .field("app_id", &self.app_id)
            .field("cached", &self.flow.initialized())
            .finish()
    }
}

impl StatusFlowResolver {
    pub fn new(host: Arc<dyn HostApi>, app_id: u64) -> Self {
        Self {
            host,
            app_id,
            flow: OnceCell::new(),
        }
    }

    pub fn app_id(&self) -> u64 {
        self.app_id
    }

    /// The flow, or an empty one when the host could not be read
    pub async fn fetch_flow(&self) -> Arc<ProcessFlow> {
        match self.try_fetch_flow().await {
            Ok(flow) => flow,
            Err(e) => {
                warn!(app = self.app_id, error = %e, "Process settings unavailable, no actions will render");
                Arc::new(ProcessFlow::empty())
            }
        }
    }

    pub async fn try_fetch_flow(&self) -> Result<Arc<ProcessFlow>, FlowError> {
        if let Some(flow) = self.flow.get() {
            debug!(app = self.app_id, "Process flow cache hit");
            return Ok(flow.clone());
        }

        let flow = self
            .flow
            .get_or_try_init(|| async {
                let timer = OperationTimer::new("fetch_process_flow");
                let config = self.host.fetch_process_config(self.app_id).await?;
                let flow = ProcessFlow::build(&config);
                timer.finish();
                info!(
                    app = self.app_id,
                    states = flow.states().count(),
                    actions = flow.actions().len(),
                    open_actions = flow.open_actions().len(),
                    "Process flow loaded"
                );
                Ok::<_, FlowError>(Arc::new(flow))
            })
            .await?;
        Ok(flow.clone())
    }

    /// Flow cached by an earlier successful fetch
    pub fn cached(&self) -> Option<Arc<ProcessFlow>> {
        self.flow.get().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::mocks::MockHostApi;
    use crate::host::types::{ActionConfig, ProcessConfig};

    fn config() -> ProcessConfig {
        ProcessConfig {
            enable: Some(true),
            actions: vec![ActionConfig {
                name: "承認".to_string(),
                from: "申請中".to_string(),
                to: "承認済".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_fetch_flow_is_cached_after_success() {
        let host = Arc::new(MockHostApi::with_process_config(config()));
        let resolver = StatusFlowResolver::new(host.clone(), 1);

        let first = resolver.fetch_flow().await;
        let second = resolver.fetch_flow().await;

        assert_eq!(first.actions_for("申請中").len(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(host.process_config_calls(), 1);
    }

    #[tokio::test]
    async fn test_failure_degrades_to_empty_and_is_not_cached() {
        let host = Arc::new(MockHostApi::new());
        let resolver = StatusFlowResolver::new(host.clone(), 1);

        let flow = resolver.fetch_flow().await;
        assert!(flow.is_empty());
        assert!(flow.actions_for("申請中").is_empty());
        assert!(resolver.cached().is_none());

        host.set_process_config(Some(config()));
        let flow = resolver.fetch_flow().await;
        assert_eq!(flow.actions_for("申請中").len(), 1);
        assert_eq!(host.process_config_calls(), 2);
    }
}
