use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use crate::assignee::{AssigneeResolver, ReturnToCreatorPolicy};
use crate::config::ListFlowConfig;
use crate::events::{EventEffects, EventHandler, EventType, PluginEvent};
use crate::flow::StatusFlowResolver;
use crate::host::HostApi;
use crate::license::LicenseCheck;
use crate::listview::{AllowedActions, ListActionRenderer};
use crate::plugins::PluginError;
use crate::record::StatusFieldLocator;

/// Renders action buttons into the list and keeps them fresh.
#[derive(Debug)]
pub struct ListActionPlugin {
    renderer: ListActionRenderer,
    op_field_code: String,
    hide_on_input: bool,
}

impl ListActionPlugin {
    pub fn new(renderer: ListActionRenderer, hide_on_input: bool) -> Result<Self, PluginError> {
        let op_field_code = renderer.cell_field().to_string();
        if op_field_code.is_empty() {
            return Err(PluginError::MissingOperationField);
        }
        Ok(Self {
            renderer,
            op_field_code,
            hide_on_input,
        })
    }

    /// Wire resolvers and renderer from the loaded configuration
    pub fn from_config(
        config: &ListFlowConfig,
        host: Arc<dyn HostApi>,
        license: Arc<dyn LicenseCheck>,
    ) -> Result<Self, PluginError> {
        let settings = &config.plugin;
        if settings.op_field_code.is_empty() {
            return Err(PluginError::MissingOperationField);
        }

        let locator = StatusFieldLocator {
            status_field_code: settings.status_field_code.clone(),
            assignee_field_code: settings.assignee_field_code.clone(),
            creator_field_code: settings.creator_field_code.clone(),
            label_fallback: settings.label_fallback,
        };
        let app_id = config.host.app_id;

        let flow = Arc::new(StatusFlowResolver::new(host.clone(), app_id));
        let assignees = Arc::new(
            AssigneeResolver::new(host.clone(), app_id)
                .with_locator(locator.clone())
                .with_fallback_field(settings.next_assignee_field_code.clone())
                .with_policy(ReturnToCreatorPolicy::from_config(&settings.return_to_creator)),
        );
        let renderer = ListActionRenderer::new(host, flow, assignees, license, settings.op_field_code.clone())
            .with_locator(locator)
            .with_allowed(AllowedActions::parse(&settings.allowed_actions));

        Self::new(renderer, settings.hide_on_input)
    }

    pub fn renderer(&self) -> &ListActionRenderer {
        &self.renderer
    }
}

#[async_trait]
impl EventHandler for ListActionPlugin {
    fn name(&self) -> &str {
        "list_action"
    }

    fn handles(&self, event_type: EventType) -> bool {
        event_type.is_list_render() || event_type.is_record_show() || event_type == EventType::IndexEditSubmitSuccess
    }

    async fn handle(&self, event: &PluginEvent) -> Result<EventEffects, PluginError> {
        let mut effects = EventEffects::default();

        match event.event_type {
            t if t.is_list_render() => {
                if matches!(t, EventType::IndexShow | EventType::MobileIndexShow) {
                    // Warm the flow before rows render
                    self.renderer.flow().fetch_flow().await;
                }
                effects.rows = self
                    .renderer
                    .render_rows(&event.records, event.viewer.as_deref())
                    .await;
                info!(event = %t, rows = effects.rows.len(), "Rendered list actions");
            }
            EventType::IndexEditSubmitSuccess => {
                effects.refresh = true;
            }
            t if t.is_record_show() => {
                if self.hide_on_input {
                    debug!(field = %self.op_field_code, "Hiding operation field on input screen");
                    effects.hidden_fields.push(self.op_field_code.clone());
                }
            }
            _ => {}
        }

        Ok(effects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::mocks::MockHostApi;
    use crate::host::types::{ActionConfig, ProcessConfig};
    use crate::license::MockLicenseCheck;
    use crate::record::Record;
    use serde_json::json;

    fn config(op_field: &str, hide: bool) -> ListFlowConfig {
        let mut config = ListFlowConfig::default();
        config.host.app_id = 3;
        config.plugin.op_field_code = op_field.to_string();
        config.plugin.hide_on_input = hide;
        config
    }

    fn host() -> Arc<MockHostApi> {
        Arc::new(MockHostApi::with_process_config(ProcessConfig {
            enable: Some(true),
            actions: vec![ActionConfig {
                name: "承認".to_string(),
                from: "申請中".to_string(),
                to: "完了".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        }))
    }

    fn license() -> Arc<MockLicenseCheck> {
        let mut license = MockLicenseCheck::new();
        license.expect_is_licensed().returning(|| true);
        Arc::new(license)
    }

    #[test]
    fn test_missing_operation_field_is_rejected() {
        let err = ListActionPlugin::from_config(&config("", false), host(), license()).unwrap_err();
        assert!(matches!(err, PluginError::MissingOperationField));
        assert_eq!(
            err.to_string(),
            "プラグイン設定が未完了です。設定画面で操作フィールドを選択してください。"
        );
    }

    #[tokio::test]
    async fn test_index_show_renders_rows() {
        let host = host();
        let plugin = ListActionPlugin::from_config(&config("操作", false), host.clone(), license()).unwrap();
        let record = Record::from_value(json!({
            "$id": {"value": "1"},
            "$status": {"value": "申請中", "assignee": []}
        }))
        .unwrap();

        let effects = plugin
            .handle(&PluginEvent::list(EventType::IndexShow, vec![record], Some("me".to_string())))
            .await
            .unwrap();

        assert_eq!(effects.rows.len(), 1);
        assert_eq!(effects.rows[0].cell_field, "操作");
        assert_eq!(effects.rows[0].buttons[0].label, "承認");
        assert_eq!(host.process_config_calls(), 1);
    }

    #[tokio::test]
    async fn test_unassigned_row_keeps_actions_despite_user_fields() {
        let plugin = ListActionPlugin::from_config(&config("操作", false), host(), license()).unwrap();
        let record = Record::from_value(json!({
            "$id": {"value": "1"},
            "$status": {"value": "申請中", "assignee": []},
            "作業者": {"type": "STATUS_ASSIGNEE", "value": []},
            "承認者": {"type": "USER_SELECT", "value": [{"code": "u9"}]}
        }))
        .unwrap();

        let effects = plugin
            .handle(&PluginEvent::list(EventType::IndexShow, vec![record], Some("me".to_string())))
            .await
            .unwrap();

        assert_eq!(effects.rows[0].buttons.len(), 1);
        assert_eq!(effects.rows[0].buttons[0].action, "承認");
    }

    #[tokio::test]
    async fn test_inline_edit_requests_refresh() {
        let plugin = ListActionPlugin::from_config(&config("操作", false), host(), license()).unwrap();
        let effects = plugin
            .handle(&PluginEvent::list(EventType::IndexEditSubmitSuccess, vec![], None))
            .await
            .unwrap();
        assert!(effects.refresh);
    }

    #[tokio::test]
    async fn test_hide_on_input() {
        let record = Record::default();
        let hidden = ListActionPlugin::from_config(&config("操作", true), host(), license()).unwrap();
        let effects = hidden
            .handle(&PluginEvent::record(EventType::CreateShow, record.clone()))
            .await
            .unwrap();
        assert_eq!(effects.hidden_fields, vec!["操作".to_string()]);

        let shown = ListActionPlugin::from_config(&config("操作", false), host(), license()).unwrap();
        let effects = shown
            .handle(&PluginEvent::record(EventType::EditShow, record))
            .await
            .unwrap();
        assert!(effects.hidden_fields.is_empty());
    }
}
