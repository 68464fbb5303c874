use anyhow::Result;
use clap::Parser;

use listflow::cli::commands::{
    act::ActCommand, auth::AuthCommand, configure::ConfigureCommand, event::EventCommand, flow::FlowCommand,
    load_config, render::RenderCommand, show_how_to_get_started, Command,
};
use listflow::cli::{Cli, Commands};
use listflow::config::ListFlowConfig;
use listflow::observability::host_metrics;
use listflow::plugins::{InitialStatusSettings, ListActionSettings};
use listflow::telemetry::init_telemetry;

fn main() -> Result<()> {
    let _ = ListFlowConfig::load_env_file();
    let cli = Cli::parse();

    let observability = load_config(cli.config.as_deref())
        .map(|c| c.observability)
        .unwrap_or_default();
    init_telemetry(&observability)?;

    let config_path = cli.config.clone();
    let result = tokio::runtime::Runtime::new()?.block_on(async move {
        match cli.command {
            None => show_how_to_get_started().await,
            Some(Commands::Flow) => FlowCommand::new(config_path).execute().await,
            Some(Commands::Render { file, ids, viewer }) => {
                RenderCommand::new(config_path)
                    .with_file(file)
                    .with_ids(ids)
                    .with_viewer(viewer)
                    .execute()
                    .await
            }
            Some(Commands::Act { record, action, viewer }) => {
                ActCommand::new(config_path, record, action)
                    .with_viewer(viewer)
                    .execute()
                    .await
            }
            Some(Commands::Auth) => AuthCommand::new(config_path).execute().await,
            Some(Commands::Configure {
                op_field,
                actions,
                hide_on_input,
                initial_action,
                initial_status,
                draft_label,
                output,
            }) => {
                let mut command = ConfigureCommand::new(config_path).with_output(output);
                if op_field.is_some() || !actions.is_empty() {
                    command = command.with_list_action(ListActionSettings {
                        op_field_code: op_field.unwrap_or_default(),
                        allowed_actions: actions,
                        hide_on_input,
                    });
                }
                if initial_action.is_some() || initial_status.is_some() {
                    command = command.with_initial_status(InitialStatusSettings {
                        action_to_complete: initial_action.unwrap_or_default(),
                        initial_status: initial_status.unwrap_or_default(),
                        draft_button_label: draft_label,
                    });
                }
                command.execute().await
            }
            Some(Commands::Event {
                event,
                file,
                record_id,
                draft,
                viewer,
            }) => {
                EventCommand::new(config_path, event)
                    .with_file(file)
                    .with_record_id(record_id)
                    .with_draft(draft)
                    .with_viewer(viewer)
                    .execute()
                    .await
            }
        }
    });

    host_metrics().log_stats();
    result
}
