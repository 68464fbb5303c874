use anyhow::Result;
use std::path::PathBuf;

use crate::cli::commands::{fetch_records, read_records, with_session, Command};
use crate::listview::RenderedRow;
use crate::plugins::ListActionPlugin;

pub struct RenderCommand {
    pub config_path: Option<PathBuf>,
    pub file: Option<PathBuf>,
    pub ids: Vec<String>,
    pub viewer: Option<String>,
}

impl RenderCommand {
    pub fn new(config_path: Option<PathBuf>) -> Self {
        Self {
            config_path,
            file: None,
            ids: Vec::new(),
            viewer: None,
        }
    }

    pub fn with_file(mut self, file: Option<PathBuf>) -> Self {
        self.file = file;
        self
    }

    pub fn with_ids(mut self, ids: Vec<String>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_viewer(mut self, viewer: Option<String>) -> Self {
        self.viewer = viewer;
        self
    }
}

impl Command for RenderCommand {
    async fn execute(&self) -> Result<()> {
        with_session(self.config_path.clone(), |session| async move {
            let app = session.config.host.app_id;
            let mut records = match &self.file {
                Some(file) => read_records(file)?,
                None => Vec::new(),
            };
            records.extend(fetch_records(session.host.as_ref(), app, &self.ids).await?);

            if records.is_empty() {
                println!("ℹ️  No records given. Use --file or --id.");
                return Ok(());
            }

            let plugin = ListActionPlugin::from_config(&session.config, session.host.clone(), session.gate.clone())?;
            let viewer = self.viewer.clone().or_else(|| session.config.host.viewer.clone());
            let rows = plugin.renderer().render_rows(&records, viewer.as_deref()).await;

            println!();
            for row in &rows {
                print_row(row);
            }
            Ok(())
        })
        .await
    }
}

pub fn print_row(row: &RenderedRow) {
    println!("🗂️  #{} [{}]", row.record_id, row.status);
    if row.buttons.is_empty() {
        println!("   (no actions)");
    }
    for button in &row.buttons {
        let marker = if button.enabled { "🟢" } else { "⚪" };
        print!("   {} {}", marker, button.label);
        if let Some(assignee) = &button.assignee {
            print!(" → {assignee}");
        }
        if let Some(tooltip) = &button.tooltip {
            print!("  ({tooltip})");
        }
        println!();
    }
}
