use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::commands::render::print_row;
use crate::cli::commands::{read_records, with_session, Command};
use crate::events::{EventDispatcher, EventEffects, EventType, PluginEvent};
use crate::plugins::{InitialStatusPlugin, ListActionPlugin, TrialBanner};
use crate::record::Record;

pub struct EventCommand {
    pub config_path: Option<PathBuf>,
    pub event: String,
    pub file: Option<PathBuf>,
    pub record_id: Option<String>,
    pub draft: bool,
    pub viewer: Option<String>,
}

impl EventCommand {
    pub fn new(config_path: Option<PathBuf>, event: String) -> Self {
        Self {
            config_path,
            event,
            file: None,
            record_id: None,
            draft: false,
            viewer: None,
        }
    }

    pub fn with_file(mut self, file: Option<PathBuf>) -> Self {
        self.file = file;
        self
    }

    pub fn with_record_id(mut self, record_id: Option<String>) -> Self {
        self.record_id = record_id;
        self
    }

    pub fn with_draft(mut self, draft: bool) -> Self {
        self.draft = draft;
        self
    }

    pub fn with_viewer(mut self, viewer: Option<String>) -> Self {
        self.viewer = viewer;
        self
    }
}

impl Command for EventCommand {
    async fn execute(&self) -> Result<()> {
        let event_type: EventType = self.event.parse()?;
        let records = match &self.file {
            Some(file) => read_records(file)?,
            None => Vec::new(),
        };

        with_session(self.config_path.clone(), |session| async move {
            session.gate.initialize().await;

            let mut dispatcher = EventDispatcher::new();
            match ListActionPlugin::from_config(&session.config, session.host.clone(), session.gate.clone()) {
                Ok(plugin) => {
                    dispatcher.register(Arc::new(plugin));
                }
                Err(e) => println!("⚠️  {e}"),
            }
            let initial = &session.config.initial_status;
            let mut initial_plugin = None;
            if initial.enabled {
                let plugin = Arc::new(InitialStatusPlugin::new(
                    session.host.clone(),
                    session.gate.clone(),
                    session.config.host.app_id,
                    initial.clone(),
                )?);
                dispatcher.register(plugin.clone());
                initial_plugin = Some(plugin);
            }
            dispatcher.register(Arc::new(TrialBanner::new(
                session.config.plugin.name.clone(),
                session.config.license.trial_enddate.clone(),
            )));

            if self.draft {
                if let Some(plugin) = &initial_plugin {
                    plugin.request_draft_save();
                }
            }

            let viewer = self.viewer.clone().or_else(|| session.config.host.viewer.clone());
            let event = if event_type.is_list_render() || event_type == EventType::IndexEditSubmitSuccess {
                PluginEvent::list(event_type, records, viewer)
            } else {
                let record: Record = records
                    .into_iter()
                    .next()
                    .with_context(|| format!("{event_type} needs a record (--file)"))?;
                let mut event = PluginEvent::record(event_type, record);
                if let Some(id) = &self.record_id {
                    event = event.with_record_id(id.clone());
                }
                event
            };

            let effects = dispatcher.dispatch(&event).await;
            print_effects(&effects);
            Ok(())
        })
        .await
    }
}

fn print_effects(effects: &EventEffects) {
    if effects.is_empty() {
        println!("ℹ️  No changes");
        return;
    }
    for message in &effects.header_messages {
        println!("🕒 {message}");
    }
    for label in &effects.header_buttons {
        println!("🔘 Header button: {label}");
    }
    for field in &effects.hidden_fields {
        println!("🙈 Hidden field: {field}");
    }
    for row in &effects.rows {
        print_row(row);
    }
    for alert in &effects.alerts {
        println!("❌ {alert}");
    }
    if effects.refresh {
        println!("🔄 List refresh requested");
    }
}
