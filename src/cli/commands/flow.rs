use anyhow::Result;
use std::path::PathBuf;

use crate::cli::commands::{with_session, Command};
use crate::flow::StatusFlowResolver;

pub struct FlowCommand {
    pub config_path: Option<PathBuf>,
}

impl FlowCommand {
    pub fn new(config_path: Option<PathBuf>) -> Self {
        Self { config_path }
    }
}

impl Command for FlowCommand {
    async fn execute(&self) -> Result<()> {
        with_session(self.config_path.clone(), |session| async move {
            let resolver = StatusFlowResolver::new(session.host.clone(), session.config.host.app_id);
            let flow = resolver.try_fetch_flow().await?;

            println!();
            println!("🔀 PROCESS FLOW (app {})", session.config.host.app_id);
            println!("────────────────────");

            if flow.is_empty() {
                println!("   Process management is disabled or has no actions.");
                return Ok(());
            }

            let mut states: Vec<_> = flow.states().collect();
            states.sort_by_key(|s| s.index.unwrap_or(u32::MAX));
            for state in states {
                let assignment = state
                    .rule
                    .assignee_type
                    .as_ref()
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("📍 {} [{}]", state.name, assignment);
                for entry in flow.actions_for(&state.name) {
                    let open = if flow.is_open(&entry.action) { " (open)" } else { "" };
                    println!("   └─ {} → {}{}", entry.action, entry.to, open);
                }
            }
            Ok(())
        })
        .await
    }
}
