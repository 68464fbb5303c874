use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

#[derive(Parser)]
#[command(name = "listflow")]
#[command(about = "Process-action buttons for kintone list views")]
#[command(long_about = "listflow resolves an app's process-management flow, works out who each \
                       transition hands a record to, and renders the allowed actions as buttons for \
                       each list row. Start with 'listflow flow' to inspect the app's process.")]
pub struct Cli {
    /// Configuration file (defaults to listflow.toml / .listflow-rc in the working directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the app's process flow: states, actions and open actions
    Flow,
    /// Render the action buttons each list row would show
    Render {
        /// JSON file holding records (an array, or an object with a `records` array)
        #[arg(long, help = "Read list rows from a JSON file")]
        file: Option<PathBuf>,
        /// Record ids to fetch from the host
        #[arg(long = "id", help = "Fetch this record from the host (repeatable)")]
        ids: Vec<String>,
        /// Viewer identity code (overrides host.viewer)
        #[arg(long, help = "Identity code of the viewing user")]
        viewer: Option<String>,
    },
    /// Click a row's action button: run the transition on the host
    Act {
        /// Record id
        #[arg(long, help = "Record to act on")]
        record: String,
        /// Action name as shown on the button
        #[arg(long, help = "Process action to run")]
        action: String,
        #[arg(long, help = "Identity code of the viewing user")]
        viewer: Option<String>,
    },
    /// Check the installation's license and show the trial banner
    Auth,
    /// Validate and save the list-action or initial-status settings
    Configure {
        /// Operation field whose list cells host the buttons
        #[arg(long, help = "Field code of the operation field")]
        op_field: Option<String>,
        /// Actions to show in the list
        #[arg(long = "action", help = "Action to show in the list (repeatable)")]
        actions: Vec<String>,
        #[arg(long, help = "Hide the operation field on create/edit screens")]
        hide_on_input: bool,
        /// Configure the initial-status plugin instead
        #[arg(long, help = "Action the initial-status plugin runs after save")]
        initial_action: Option<String>,
        #[arg(long, help = "Status the initial action starts from")]
        initial_status: Option<String>,
        #[arg(long, help = "Label of the draft-save button")]
        draft_label: Option<String>,
        /// Where to write the configuration (defaults to --config or listflow.toml)
        #[arg(long, help = "Configuration file to write")]
        output: Option<PathBuf>,
    },
    /// Dispatch a screen event through the registered plugins
    Event {
        /// Event name, e.g. app.record.index.show
        #[arg(help = "Host event name")]
        event: String,
        #[arg(long, help = "JSON file with the event's record(s)")]
        file: Option<PathBuf>,
        #[arg(long, help = "Id of the saved record (submit-success events)")]
        record_id: Option<String>,
        #[arg(long, help = "Treat this submit as a draft save")]
        draft: bool,
        #[arg(long, help = "Identity code of the viewing user")]
        viewer: Option<String>,
    },
}
