use statig::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn, Instrument};

use crate::assignee::AssigneeResolver;
use crate::flow::{FlowEntry, ProcessFlow, StatusFlowResolver};
use crate::host::{HostApi, StatusUpdate};
use crate::license::LicenseCheck;
use crate::listview::allowed::AllowedActions;
use crate::listview::button::{ButtonEvent, ButtonMachine};
use crate::observability::host_metrics;
use crate::record::{Record, RecordStatusInfo, StatusFieldLocator};
use crate::telemetry::{create_click_span, generate_correlation_id};

pub const ASSIGNEE_REQUIRED_TOOLTIP: &str = "作業者の選択が必要です（プロセスの割当設定をご確認ください）";

/// Host UI surface the renderer reports back to
pub trait ListView: Send + Sync {
    fn refresh(&self);
    fn alert(&self, message: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionButton {
    pub label: String,
    pub action: String,
    pub enabled: bool,
    pub tooltip: Option<String>,
    /// Sent with the transition; only set when the destination needs a single user
    pub assignee: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedRow {
    pub record_id: String,
    pub cell_field: String,
    pub status: String,
    pub buttons: Vec<ActionButton>,
}

impl RenderedRow {
    pub fn button(&self, action: &str) -> Option<&ActionButton> {
        self.buttons.iter().find(|b| b.action == action)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    Refreshed,
    Failed { message: String, conflict: bool },
    Ignored,
    Unlicensed,
}

/// Flow entries a viewer may act on for a record in `info.status`.
///
/// Nobody assigned, or the viewer among the assignees, keeps every entry;
/// otherwise only open actions survive.
pub fn filter_actions<'a>(
    flow: &'a ProcessFlow,
    info: &RecordStatusInfo,
    viewer: Option<&str>,
    allowed: &AllowedActions,
) -> Vec<&'a FlowEntry> {
    let viewer_may_act = !info.has_assignees() || viewer.is_some_and(|v| info.is_assignee(v));

    flow.actions_for(&info.status)
        .iter()
        .filter(|entry| allowed.permits(&entry.action))
        .filter(|entry| viewer_may_act || flow.is_open(&entry.action))
        .collect()
}

type ButtonKey = (String, String);

/// Renders process-action buttons into the list view's operation cells and
/// executes them on click.
pub struct ListActionRenderer {
    host: Arc<dyn HostApi>,
    flow: Arc<StatusFlowResolver>,
    assignees: Arc<AssigneeResolver>,
    license: Arc<dyn LicenseCheck>,
    locator: StatusFieldLocator,
    allowed: AllowedActions,
    cell_field: String,
    buttons: Mutex<HashMap<ButtonKey, StateMachine<ButtonMachine>>>,
}

impl std::fmt::Debug for ListActionRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListActionRenderer")
            .field("app_id", &self.flow.app_id())
            .field("allowed", &self.allowed)
            .field("cell_field", &self.cell_field)
            .finish()
    }
}

impl ListActionRenderer {
    pub fn new(
        host: Arc<dyn HostApi>,
        flow: Arc<StatusFlowResolver>,
        assignees: Arc<AssigneeResolver>,
        license: Arc<dyn LicenseCheck>,
        cell_field: impl Into<String>,
    ) -> Self {
        Self {
            host,
            flow,
            assignees,
            license,
            locator: StatusFieldLocator::default(),
            allowed: AllowedActions::default(),
            cell_field: cell_field.into(),
            buttons: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_locator(mut self, locator: StatusFieldLocator) -> Self {
        self.locator = locator;
        self
    }

    pub fn with_allowed(mut self, allowed: AllowedActions) -> Self {
        self.allowed = allowed;
        self
    }

    pub fn flow(&self) -> &StatusFlowResolver {
        &self.flow
    }

    pub fn cell_field(&self) -> &str {
        &self.cell_field
    }

    pub async fn render_rows(&self, records: &[Record], viewer: Option<&str>) -> Vec<RenderedRow> {
        let flow = self.flow.fetch_flow().await;
        let mut rows = Vec::with_capacity(records.len());

        for record in records {
            let Some(record_id) = record.id() else {
                warn!("Skipping list row without a record id");
                continue;
            };
            let info = self.locator.status_info(record);
            let mut buttons = Vec::new();

            for entry in filter_actions(&flow, &info, viewer, &self.allowed) {
                buttons.push(self.render_button(record, entry).await);
            }
            debug!(record_id = %record_id, status = %info.status, buttons = buttons.len(), "Rendered row");

            self.sync_machines(&record_id, &buttons).await;
            rows.push(RenderedRow {
                record_id,
                cell_field: self.cell_field.clone(),
                status: info.status,
                buttons,
            });
        }

        self.prune_machines(&rows).await;
        rows
    }

    async fn render_button(&self, record: &Record, entry: &FlowEntry) -> ActionButton {
        let requires_assignee = entry.requires_single_assignee();
        let assignee = if requires_assignee {
            self.assignees.derive_assignee_for_action(record, entry).await
        } else {
            None
        };
        let enabled = !requires_assignee || assignee.is_some();

        ActionButton {
            label: entry.label.clone(),
            action: entry.action.clone(),
            enabled,
            tooltip: (!enabled).then(|| ASSIGNEE_REQUIRED_TOOLTIP.to_string()),
            assignee,
        }
    }

    /// Fresh machines for re-rendered buttons; in-flight ones are left alone
    async fn sync_machines(&self, record_id: &str, buttons: &[ActionButton]) {
        let mut machines = self.buttons.lock().await;
        for button in buttons {
            let key = (record_id.to_string(), button.action.clone());
            let in_flight = machines.get(&key).is_some_and(|sm| sm.inner().is_pending());
            if !in_flight {
                machines.insert(
                    key,
                    ButtonMachine::new(record_id, button.action.clone(), button.enabled).state_machine(),
                );
            }
        }
    }

    /// Drop machines of records no longer on screen; in-flight ones stay
    async fn prune_machines(&self, rows: &[RenderedRow]) {
        let visible: HashSet<&str> = rows.iter().map(|r| r.record_id.as_str()).collect();
        let mut machines = self.buttons.lock().await;
        let before = machines.len();
        machines.retain(|(record_id, _), sm| visible.contains(record_id.as_str()) || sm.inner().is_pending());
        if machines.len() < before {
            debug!(dropped = before - machines.len(), "Pruned button machines");
        }
    }

    /// Run the button's transition and report back through `view`
    pub async fn click(&self, row: &RenderedRow, button: &ActionButton, view: &dyn ListView) -> ClickOutcome {
        if !button.enabled {
            return ClickOutcome::Ignored;
        }
        if !self.license.is_licensed().await {
            warn!(record_id = %row.record_id, action = %button.action, "Installation is not licensed, click ignored");
            return ClickOutcome::Unlicensed;
        }

        let key = (row.record_id.clone(), button.action.clone());
        {
            let mut machines = self.buttons.lock().await;
            let sm = machines.entry(key.clone()).or_insert_with(|| {
                ButtonMachine::new(row.record_id.clone(), button.action.clone(), button.enabled).state_machine()
            });
            if sm.inner().is_pending() {
                return ClickOutcome::Ignored;
            }
            sm.handle(&ButtonEvent::Click);
            if !sm.inner().is_pending() {
                return ClickOutcome::Ignored;
            }
        }

        let update = StatusUpdate::new(self.flow.app_id(), row.record_id.clone(), button.action.clone())
            .with_assignee(button.assignee.clone());
        let correlation_id = generate_correlation_id();
        let span = create_click_span(&row.record_id, &button.action, button.assignee.as_deref(), &correlation_id);

        let result = self.host.update_status(&update).instrument(span).await;

        let (event, outcome) = match result {
            Ok(response) => {
                host_metrics().record_status_update();
                info!(
                    record_id = %row.record_id,
                    action = %button.action,
                    revision = ?response.revision,
                    "Status updated"
                );
                (ButtonEvent::Succeeded, ClickOutcome::Refreshed)
            }
            Err(e) => {
                let conflict = e.is_conflict();
                if conflict {
                    host_metrics().record_conflict();
                }
                let message = e.user_message();
                warn!(record_id = %row.record_id, action = %button.action, error = %e, "Status update failed");
                (
                    ButtonEvent::Failed {
                        message: message.clone(),
                    },
                    ClickOutcome::Failed { message, conflict },
                )
            }
        };

        if let Some(sm) = self.buttons.lock().await.get_mut(&key) {
            sm.handle(&event);
        }

        match &outcome {
            ClickOutcome::Refreshed => view.refresh(),
            ClickOutcome::Failed { message, .. } => view.alert(message),
            _ => {}
        }
        outcome
    }

    /// Error kept by the button after its last failed click
    pub async fn last_error(&self, record_id: &str, action: &str) -> Option<String> {
        let machines = self.buttons.lock().await;
        machines
            .get(&(record_id.to_string(), action.to_string()))
            .and_then(|sm| sm.inner().last_error().map(str::to_string))
    }
}
