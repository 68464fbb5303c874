// Lifecycle events raised by the host's record screens

use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error, Instrument};

use crate::listview::RenderedRow;
use crate::observability::create_event_span;
use crate::plugins::PluginError;
use crate::record::Record;
use crate::telemetry::generate_correlation_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    IndexShow,
    IndexRefresh,
    IndexEditSubmitSuccess,
    CreateShow,
    EditShow,
    CreateSubmitSuccess,
    EditSubmitSuccess,
    MobileIndexShow,
    MobileCreateShow,
    MobileEditShow,
    MobileCreateSubmitSuccess,
    MobileEditSubmitSuccess,
}

impl EventType {
    pub const ALL: [EventType; 12] = [
        EventType::IndexShow,
        EventType::IndexRefresh,
        EventType::IndexEditSubmitSuccess,
        EventType::CreateShow,
        EventType::EditShow,
        EventType::CreateSubmitSuccess,
        EventType::EditSubmitSuccess,
        EventType::MobileIndexShow,
        EventType::MobileCreateShow,
        EventType::MobileEditShow,
        EventType::MobileCreateSubmitSuccess,
        EventType::MobileEditSubmitSuccess,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::IndexShow => "app.record.index.show",
            EventType::IndexRefresh => "app.record.index.refresh",
            EventType::IndexEditSubmitSuccess => "app.record.index.edit.submit.success",
            EventType::CreateShow => "app.record.create.show",
            EventType::EditShow => "app.record.edit.show",
            EventType::CreateSubmitSuccess => "app.record.create.submit.success",
            EventType::EditSubmitSuccess => "app.record.edit.submit.success",
            EventType::MobileIndexShow => "mobile.app.record.index.show",
            EventType::MobileCreateShow => "mobile.app.record.create.show",
            EventType::MobileEditShow => "mobile.app.record.edit.show",
            EventType::MobileCreateSubmitSuccess => "mobile.app.record.create.submit.success",
            EventType::MobileEditSubmitSuccess => "mobile.app.record.edit.submit.success",
        }
    }

    pub fn is_mobile(&self) -> bool {
        self.as_str().starts_with("mobile.")
    }

    pub fn is_create(&self) -> bool {
        self.as_str().contains(".create.")
    }

    /// List screens whose rows get action buttons
    pub fn is_list_render(&self) -> bool {
        matches!(
            self,
            EventType::IndexShow | EventType::IndexRefresh | EventType::MobileIndexShow
        )
    }

    /// Create/edit screens
    pub fn is_record_show(&self) -> bool {
        matches!(
            self,
            EventType::CreateShow | EventType::EditShow | EventType::MobileCreateShow | EventType::MobileEditShow
        )
    }

    pub fn is_record_submit_success(&self) -> bool {
        matches!(
            self,
            EventType::CreateSubmitSuccess
                | EventType::EditSubmitSuccess
                | EventType::MobileCreateSubmitSuccess
                | EventType::MobileEditSubmitSuccess
        )
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEventType(pub String);

impl fmt::Display for UnknownEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown event type `{}`", self.0)
    }
}

impl std::error::Error for UnknownEventType {}

impl FromStr for EventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| UnknownEventType(s.to_string()))
    }
}

/// Payload handed to handlers
#[derive(Debug, Clone)]
pub struct PluginEvent {
    pub event_type: EventType,
    /// Rows of a list screen
    pub records: Vec<Record>,
    /// Record of a create/edit screen
    pub record: Option<Record>,
    /// Id of the saved record on submit success
    pub record_id: Option<String>,
    pub viewer: Option<String>,
}

impl PluginEvent {
    pub fn list(event_type: EventType, records: Vec<Record>, viewer: Option<String>) -> Self {
        Self {
            event_type,
            records,
            record: None,
            record_id: None,
            viewer,
        }
    }

    pub fn record(event_type: EventType, record: Record) -> Self {
        let record_id = record.id();
        Self {
            event_type,
            records: Vec::new(),
            record: Some(record),
            record_id,
            viewer: None,
        }
    }

    pub fn with_record_id(mut self, record_id: impl Into<String>) -> Self {
        self.record_id = Some(record_id.into());
        self
    }
}

/// UI changes the host should apply after an event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventEffects {
    pub rows: Vec<RenderedRow>,
    pub hidden_fields: Vec<String>,
    pub header_messages: Vec<String>,
    /// Extra header-menu buttons, by label
    pub header_buttons: Vec<String>,
    pub alerts: Vec<String>,
    pub refresh: bool,
}

impl EventEffects {
    pub fn merge(&mut self, other: EventEffects) {
        self.rows.extend(other.rows);
        self.hidden_fields.extend(other.hidden_fields);
        self.header_messages.extend(other.header_messages);
        self.header_buttons.extend(other.header_buttons);
        self.alerts.extend(other.alerts);
        self.refresh |= other.refresh;
    }

    pub fn is_empty(&self) -> bool {
        *self == EventEffects::default()
    }
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn name(&self) -> &str;

    fn handles(&self, event_type: EventType) -> bool;

    async fn handle(&self, event: &PluginEvent) -> Result<EventEffects, PluginError>;
}

/// Runs registered handlers one at a time, in registration order
#[derive(Default)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.handlers.iter().map(|h| h.name()).collect();
        f.debug_struct("EventDispatcher").field("handlers", &names).finish()
    }
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Arc<dyn EventHandler>) -> &mut Self {
        self.handlers.push(handler);
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Handler failures become alerts; later handlers still run
    pub async fn dispatch(&self, event: &PluginEvent) -> EventEffects {
        let correlation_id = generate_correlation_id();
        let span = create_event_span(event.event_type.as_str(), &correlation_id);

        async {
            let mut effects = EventEffects::default();
            for handler in self.handlers.iter().filter(|h| h.handles(event.event_type)) {
                debug!(handler = handler.name(), "Dispatching event");
                match handler.handle(event).await {
                    Ok(result) => effects.merge(result),
                    Err(e) => {
                        error!(handler = handler.name(), error = %e, "Event handler failed");
                        effects.alerts.push(e.to_string());
                    }
                }
            }
            effects
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
        fail: bool,
    }

    #[async_trait]
    impl EventHandler for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn handles(&self, event_type: EventType) -> bool {
            event_type.is_list_render()
        }

        async fn handle(&self, _event: &PluginEvent) -> Result<EventEffects, PluginError> {
            self.log.lock().unwrap().push(self.name);
            if self.fail {
                return Err(PluginError::MissingOperationField);
            }
            Ok(EventEffects {
                header_messages: vec![self.name.to_string()],
                ..Default::default()
            })
        }
    }

    #[test]
    fn test_event_names_round_trip() {
        for event in EventType::ALL {
            assert_eq!(event.as_str().parse::<EventType>().unwrap(), event);
        }
        assert!("app.record.detail.show".parse::<EventType>().is_err());
        assert!(EventType::MobileCreateShow.is_mobile());
        assert!(EventType::MobileCreateShow.is_create());
        assert!(!EventType::EditSubmitSuccess.is_create());
    }

    #[tokio::test]
    async fn test_dispatch_runs_handlers_in_order_and_collects_failures() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = EventDispatcher::new();
        dispatcher
            .register(Arc::new(Recorder { name: "first", log: log.clone(), fail: false }))
            .register(Arc::new(Recorder { name: "broken", log: log.clone(), fail: true }))
            .register(Arc::new(Recorder { name: "last", log: log.clone(), fail: false }));

        let effects = dispatcher
            .dispatch(&PluginEvent::list(EventType::IndexShow, vec![], None))
            .await;

        assert_eq!(*log.lock().unwrap(), vec!["first", "broken", "last"]);
        assert_eq!(effects.header_messages, vec!["first".to_string(), "last".to_string()]);
        assert_eq!(effects.alerts, vec![PluginError::MissingOperationField.to_string()]);
    }

    #[tokio::test]
    async fn test_unhandled_event_has_no_effects() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register(Arc::new(Recorder { name: "list", log: log.clone(), fail: false }));

        let record = Record::default();
        let effects = dispatcher
            .dispatch(&PluginEvent::record(EventType::EditShow, record))
            .await;

        assert!(effects.is_empty());
        assert!(log.lock().unwrap().is_empty());
    }
}
