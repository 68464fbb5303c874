use tracing::{info, warn};

use crate::config::ListFlowConfig;
use crate::flow::ProcessFlow;
use crate::license::{LicenseError, LicenseGate};
use crate::listview::AllowedActions;
use crate::plugins::PluginError;

/// What the list-action settings screen submits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListActionSettings {
    pub op_field_code: String,
    pub allowed_actions: Vec<String>,
    pub hide_on_input: bool,
}

/// What the initial-status settings screen submits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitialStatusSettings {
    pub action_to_complete: String,
    pub initial_status: String,
    pub draft_button_label: Option<String>,
}

/// Validate, activate the installation, then apply the list-action settings.
///
/// `config` is left untouched on validation errors. A rejected activation
/// marks the installation invalid.
pub async fn save_list_action_settings(
    config: &mut ListFlowConfig,
    settings: &ListActionSettings,
    flow: &ProcessFlow,
    gate: &LicenseGate,
) -> Result<(), PluginError> {
    if settings.op_field_code.is_empty() {
        return Err(PluginError::MissingOperationField);
    }
    if settings.allowed_actions.is_empty() {
        return Err(PluginError::NoActionsSelected);
    }
    for action in &settings.allowed_actions {
        flow.require_action(action)?;
    }

    activate(config, gate).await?;

    config.plugin.op_field_code = settings.op_field_code.clone();
    config.plugin.allowed_actions = AllowedActions::from_names(settings.allowed_actions.iter().cloned()).to_json();
    config.plugin.hide_on_input = settings.hide_on_input;
    info!(
        op_field = %config.plugin.op_field_code,
        allowed = %config.plugin.allowed_actions,
        "List-action settings saved"
    );
    Ok(())
}

pub async fn save_initial_status_settings(
    config: &mut ListFlowConfig,
    settings: &InitialStatusSettings,
    flow: &ProcessFlow,
    gate: &LicenseGate,
) -> Result<(), PluginError> {
    if settings.action_to_complete.is_empty() || settings.initial_status.is_empty() {
        return Err(PluginError::MissingInitialAction);
    }
    flow.require_action(&settings.action_to_complete)?;
    flow.require_state(&settings.initial_status)?;

    activate(config, gate).await?;

    let initial = &mut config.initial_status;
    initial.enabled = true;
    initial.action_to_complete = settings.action_to_complete.clone();
    initial.initial_status = settings.initial_status.clone();
    if let Some(label) = settings.draft_button_label.as_ref().filter(|l| !l.trim().is_empty()) {
        initial.draft_button_label = label.trim().to_string();
    }
    info!(action = %initial.action_to_complete, status = %initial.initial_status, "Initial-status settings saved");
    Ok(())
}

async fn activate(config: &mut ListFlowConfig, gate: &LicenseGate) -> Result<(), PluginError> {
    match gate.activate().await {
        Ok(activation) => {
            config.license.auth_status = activation.auth_status;
            if let Some(end) = activation.trial_enddate {
                config.license.trial_enddate = end;
            }
            Ok(())
        }
        Err(e @ LicenseError::Rejected { .. }) => {
            warn!(error = %e, "Activation rejected");
            config.license.auth_status = "invalid".to_string();
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}
