use anyhow::Result;
use std::path::PathBuf;

use crate::cli::commands::{with_session, Command};
use crate::flow::StatusFlowResolver;
use crate::plugins::{
    save_initial_status_settings, save_list_action_settings, InitialStatusSettings, ListActionSettings, PluginError,
};

pub struct ConfigureCommand {
    pub config_path: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub list_action: Option<ListActionSettings>,
    pub initial_status: Option<InitialStatusSettings>,
}

impl ConfigureCommand {
    pub fn new(config_path: Option<PathBuf>) -> Self {
        Self {
            config_path,
            output: None,
            list_action: None,
            initial_status: None,
        }
    }

    pub fn with_output(mut self, output: Option<PathBuf>) -> Self {
        self.output = output;
        self
    }

    pub fn with_list_action(mut self, settings: ListActionSettings) -> Self {
        self.list_action = Some(settings);
        self
    }

    pub fn with_initial_status(mut self, settings: InitialStatusSettings) -> Self {
        self.initial_status = Some(settings);
        self
    }

    fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .or_else(|| self.config_path.clone())
            .unwrap_or_else(|| PathBuf::from("listflow.toml"))
    }
}

impl Command for ConfigureCommand {
    async fn execute(&self) -> Result<()> {
        if self.list_action.is_none() && self.initial_status.is_none() {
            println!("ℹ️  Nothing to configure. Pass --op-field/--action or --initial-action/--initial-status.");
            return Ok(());
        }

        with_session(self.config_path.clone(), |mut session| async move {
            let resolver = StatusFlowResolver::new(session.host.clone(), session.config.host.app_id);
            let flow = resolver.try_fetch_flow().await.map_err(PluginError::ProcessUnavailable)?;

            let result = async {
                if let Some(settings) = &self.list_action {
                    save_list_action_settings(&mut session.config, settings, &flow, &session.gate).await?;
                }
                if let Some(settings) = &self.initial_status {
                    save_initial_status_settings(&mut session.config, settings, &flow, &session.gate).await?;
                }
                Ok::<_, PluginError>(())
            }
            .await;

            // A rejected activation still records the invalid status
            let path = self.output_path();
            session.config.save_to_file(&path)?;

            match result {
                Ok(()) => {
                    println!("✅ 設定を保存しました。 ({})", path.display());
                    Ok(())
                }
                Err(e) => {
                    println!("❌ {e}");
                    Err(e.into())
                }
            }
        })
        .await
    }
}
