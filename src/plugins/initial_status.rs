use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::InitialStatusConfig;
use crate::events::{EventEffects, EventHandler, EventType, PluginEvent};
use crate::host::{HostApi, StatusUpdate};
use crate::license::LicenseCheck;
use crate::plugins::PluginError;
use crate::record::StatusFieldLocator;

pub const INITIAL_ACTION_FAILED: &str = "アクションが実施できません。設定や権限を確認してください。";

/// Advances freshly saved records out of their initial status.
///
/// A draft save marks the next submit as a draft; that one submit is left
/// in its current status.
pub struct InitialStatusPlugin {
    host: Arc<dyn HostApi>,
    license: Arc<dyn LicenseCheck>,
    app_id: u64,
    settings: InitialStatusConfig,
    locator: StatusFieldLocator,
    draft_pending: AtomicBool,
}

impl std::fmt::Debug for InitialStatusPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitialStatusPlugin")
            .field("app_id", &self.app_id)
            .field("settings", &self.settings)
            .field("draft_pending", &self.draft_pending)
            .finish()
    }
}

impl InitialStatusPlugin {
    pub fn new(
        host: Arc<dyn HostApi>,
        license: Arc<dyn LicenseCheck>,
        app_id: u64,
        settings: InitialStatusConfig,
    ) -> Result<Self, PluginError> {
        if settings.action_to_complete.is_empty() {
            return Err(PluginError::MissingInitialAction);
        }
        Ok(Self {
            host,
            license,
            app_id,
            settings,
            locator: StatusFieldLocator {
                label_fallback: true,
                ..Default::default()
            },
            draft_pending: AtomicBool::new(false),
        })
    }

    /// The draft-save button was pressed; skip the next submit
    pub fn request_draft_save(&self) {
        self.draft_pending.store(true, Ordering::SeqCst);
    }

    fn applies_to(&self, event: &PluginEvent) -> bool {
        if event.event_type.is_create() {
            return true;
        }
        let status = event
            .record
            .as_ref()
            .map(|r| self.locator.status_info(r).status)
            .unwrap_or_default();
        status == self.settings.initial_status
    }

    async fn after_save(&self, event: &PluginEvent) -> Result<EventEffects, PluginError> {
        let mut effects = EventEffects::default();

        if self.draft_pending.swap(false, Ordering::SeqCst) {
            debug!("Draft save, leaving status unchanged");
            return Ok(effects);
        }
        if !self.license.is_licensed().await {
            warn!("Installation is not licensed, initial action skipped");
            return Ok(effects);
        }
        if !self.applies_to(event) {
            return Ok(effects);
        }

        let record_id = event
            .record_id
            .clone()
            .ok_or_else(|| PluginError::MissingRecord(event.event_type.to_string()))?;
        let update = StatusUpdate::new(self.app_id, record_id.clone(), self.settings.action_to_complete.clone())
            .with_revision(-1);

        match self.host.update_status(&update).await {
            Ok(_) => {
                info!(record_id = %record_id, action = %self.settings.action_to_complete, "Initial action completed");
            }
            Err(e) => {
                warn!(record_id = %record_id, error = %e, "Initial action failed");
                effects.alerts.push(INITIAL_ACTION_FAILED.to_string());
            }
        }
        Ok(effects)
    }
}

#[async_trait]
impl EventHandler for InitialStatusPlugin {
    fn name(&self) -> &str {
        "initial_status"
    }

    fn handles(&self, event_type: EventType) -> bool {
        event_type.is_record_show() || event_type.is_record_submit_success()
    }

    async fn handle(&self, event: &PluginEvent) -> Result<EventEffects, PluginError> {
        if event.event_type.is_record_submit_success() {
            return self.after_save(event).await;
        }

        let mut effects = EventEffects::default();
        if self.applies_to(event) {
            effects.header_buttons.push(self.settings.draft_button_label.clone());
        }
        Ok(effects)
    }
}
