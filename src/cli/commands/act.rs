use anyhow::{anyhow, Result};
use std::path::PathBuf;

use crate::cli::commands::render::print_row;
use crate::cli::commands::{with_session, Command};
use crate::listview::{ClickOutcome, ListView};
use crate::plugins::ListActionPlugin;

/// Prints what the list screen would do
struct ConsoleListView;

impl ListView for ConsoleListView {
    fn refresh(&self) {
        println!("🔄 List refreshed");
    }

    fn alert(&self, message: &str) {
        println!("❌ {message}");
    }
}

pub struct ActCommand {
    pub config_path: Option<PathBuf>,
    pub record_id: String,
    pub action: String,
    pub viewer: Option<String>,
}

impl ActCommand {
    pub fn new(config_path: Option<PathBuf>, record_id: String, action: String) -> Self {
        Self {
            config_path,
            record_id,
            action,
            viewer: None,
        }
    }

    pub fn with_viewer(mut self, viewer: Option<String>) -> Self {
        self.viewer = viewer;
        self
    }
}

impl Command for ActCommand {
    async fn execute(&self) -> Result<()> {
        with_session(self.config_path.clone(), |session| async move {
            let check = session.gate.initialize().await;
            for error in &check.errors {
                println!("⚠️  {error}");
            }

            let app = session.config.host.app_id;
            let record = session.host.fetch_record(app, &self.record_id).await?;
            let plugin = ListActionPlugin::from_config(&session.config, session.host.clone(), session.gate.clone())?;
            let viewer = self.viewer.clone().or_else(|| session.config.host.viewer.clone());

            let rows = plugin.renderer().render_rows(&[record], viewer.as_deref()).await;
            let row = rows
                .first()
                .ok_or_else(|| anyhow!("Record {} has no id", self.record_id))?;
            print_row(row);

            let button = row
                .button(&self.action)
                .ok_or_else(|| anyhow!("Action '{}' is not available on record {}", self.action, self.record_id))?;

            match plugin.renderer().click(row, button, &ConsoleListView).await {
                ClickOutcome::Refreshed => {
                    println!("✅ {} → {}", self.record_id, self.action);
                    Ok(())
                }
                ClickOutcome::Failed { message, .. } => Err(anyhow!(message)),
                ClickOutcome::Ignored => Err(anyhow!(
                    "Action '{}' is disabled: {}",
                    self.action,
                    button.tooltip.clone().unwrap_or_default()
                )),
                ClickOutcome::Unlicensed => Err(anyhow!("This installation is not licensed")),
            }
        })
        .await
    }
}
