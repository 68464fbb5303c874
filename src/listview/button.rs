use statig::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonEvent {
    Click,
    Succeeded,
    Failed { message: String },
}

/// Per-button click lifecycle: `idle -> pending -> idle`.
///
/// Disabled buttons swallow clicks, as does a button whose request is still
/// in flight.
#[derive(Debug, Default)]
pub struct ButtonMachine {
    pub record_id: String,
    pub action: String,
    enabled: bool,
    pending: bool,
    last_error: Option<String>,
    accepted_clicks: u32,
}

impl ButtonMachine {
    pub fn new(record_id: impl Into<String>, action: impl Into<String>, enabled: bool) -> Self {
        Self {
            record_id: record_id.into(),
            action: action.into(),
            enabled,
            ..Default::default()
        }
    }
}

#[state_machine(initial = "State::idle()")]
impl ButtonMachine {
    #[state]
    fn idle(&mut self, event: &ButtonEvent) -> Outcome<State> {
        match event {
            ButtonEvent::Click if self.enabled => {
                self.pending = true;
                self.last_error = None;
                self.accepted_clicks += 1;
                tracing::debug!(record_id = %self.record_id, action = %self.action, "Button pending");
                Transition(State::pending())
            }
            _ => Handled,
        }
    }

    #[state]
    fn pending(&mut self, event: &ButtonEvent) -> Outcome<State> {
        match event {
            ButtonEvent::Succeeded => {
                self.pending = false;
                Transition(State::idle())
            }
            ButtonEvent::Failed { message } => {
                self.pending = false;
                self.last_error = Some(message.clone());
                Transition(State::idle())
            }
            ButtonEvent::Click => {
                tracing::debug!(record_id = %self.record_id, action = %self.action, "Click ignored while pending");
                Handled
            }
        }
    }
}

impl ButtonMachine {
    pub fn is_enabled(&self) -> bool {
        self.enabled && !self.pending
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn accepted_clicks(&self) -> u32 {
        self.accepted_clicks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_then_success_returns_to_idle() {
        let mut sm = ButtonMachine::new("1", "承認", true).state_machine();

        sm.handle(&ButtonEvent::Click);
        assert!(sm.inner().is_pending());
        assert!(!sm.inner().is_enabled());

        sm.handle(&ButtonEvent::Succeeded);
        assert!(!sm.inner().is_pending());
        assert!(sm.inner().is_enabled());
        assert_eq!(sm.inner().last_error(), None);
    }

    #[test]
    fn test_failure_keeps_error_and_reenables() {
        let mut sm = ButtonMachine::new("1", "承認", true).state_machine();

        sm.handle(&ButtonEvent::Click);
        sm.handle(&ButtonEvent::Failed {
            message: "conflict".to_string(),
        });

        assert!(sm.inner().is_enabled());
        assert_eq!(sm.inner().last_error(), Some("conflict"));

        sm.handle(&ButtonEvent::Click);
        assert_eq!(sm.inner().last_error(), None);
        assert_eq!(sm.inner().accepted_clicks(), 2);
    }

    #[test]
    fn test_clicks_ignored_while_pending_or_disabled() {
        let mut sm = ButtonMachine::new("1", "承認", true).state_machine();
        sm.handle(&ButtonEvent::Click);
        sm.handle(&ButtonEvent::Click);
        assert_eq!(sm.inner().accepted_clicks(), 1);

        let mut disabled = ButtonMachine::new("2", "承認", false).state_machine();
        disabled.handle(&ButtonEvent::Click);
        assert!(!disabled.inner().is_pending());
        assert_eq!(disabled.inner().accepted_clicks(), 0);
    }

    #[test]
    fn test_outcome_events_ignored_when_idle() {
        let mut sm = ButtonMachine::new("1", "承認", true).state_machine();
        sm.handle(&ButtonEvent::Failed {
            message: "late".to_string(),
        });
        assert_eq!(sm.inner().last_error(), None);
    }
}
