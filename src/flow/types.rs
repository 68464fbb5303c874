use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::flow::FlowError;
use crate::host::types::{AssigneeConfig, EntityEntry, ProcessConfig};

/// Normalized assignment rule type of a process state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AssigneeType {
    Anyone,
    /// Assignee is picked dynamically, typically from a record field
    FieldEntity,
    /// Fixed single user
    User,
    Organization,
    Group,
    Other(String),
}

impl AssigneeType {
    /// Whether a transition into this state must name exactly one assignee
    pub fn requires_single_assignee(&self) -> bool {
        matches!(self, AssigneeType::User | AssigneeType::FieldEntity)
    }
}

impl fmt::Display for AssigneeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AssigneeType::Anyone => "ANYONE",
            AssigneeType::FieldEntity => "FIELD_ENTITY",
            AssigneeType::User => "USER",
            AssigneeType::Organization => "ORGANIZATION",
            AssigneeType::Group => "GROUP",
            AssigneeType::Other(raw) => raw,
        };
        write!(f, "{label}")
    }
}

/// Map the host's assignment type onto [`AssigneeType`].
///
/// `ANY` means anyone; `ONE` means a fixed user when entities are configured
/// and a dynamically chosen one otherwise. Other types pass through.
pub fn normalize_assignee_type(raw: Option<&str>, entity_count: usize) -> Option<AssigneeType> {
    let normalized = match raw.filter(|t| !t.is_empty())? {
        "ANY" => AssigneeType::Anyone,
        "ONE" if entity_count == 0 => AssigneeType::FieldEntity,
        "ONE" => AssigneeType::User,
        "ORGANIZATION" => AssigneeType::Organization,
        "GROUP" => AssigneeType::Group,
        other => AssigneeType::Other(other.to_string()),
    };
    Some(normalized)
}

/// Assignment rule of a state: normalized type plus the raw entity list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssignmentRule {
    pub assignee_type: Option<AssigneeType>,
    pub entities: Vec<EntityEntry>,
}

impl AssignmentRule {
    pub fn from_config(config: Option<&AssigneeConfig>) -> Self {
        let entities = config.map(|c| c.entities.clone()).unwrap_or_default();
        let assignee_type = normalize_assignee_type(
            config.and_then(|c| c.assignee_type.as_deref()),
            entities.len(),
        );
        Self {
            assignee_type,
            entities,
        }
    }

    /// Code of the single fixed user, when the rule names exactly one USER entity
    pub fn fixed_user(&self) -> Option<&str> {
        match self.entities.as_slice() {
            [only] if only.kind() == Some("USER") => only.entity_code(),
            _ => None,
        }
    }

    /// Field the next assignee is read from, when the rule names exactly one
    pub fn designated_field(&self) -> Option<&str> {
        let mut fields = self
            .entities
            .iter()
            .filter(|e| e.kind() == Some("FIELD_ENTITY"))
            .filter_map(EntityEntry::entity_code);
        match (fields.next(), fields.next()) {
            (Some(field), None) => Some(field),
            _ => None,
        }
    }

    pub fn is_field_derived(&self) -> bool {
        self.assignee_type == Some(AssigneeType::FieldEntity) || self.designated_field().is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessState {
    pub name: String,
    pub rule: AssignmentRule,
    pub index: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessAction {
    pub name: String,
    pub from: String,
    pub to: String,
    /// Executable by anyone regardless of the current assignee
    pub open: bool,
}

/// One available transition out of a state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowEntry {
    pub action: String,
    pub label: String,
    pub from: String,
    pub to: String,
    pub next_assignee_type: Option<AssigneeType>,
    pub to_assignee: AssignmentRule,
}

impl FlowEntry {
    pub fn requires_single_assignee(&self) -> bool {
        self.next_assignee_type
            .as_ref()
            .is_some_and(AssigneeType::requires_single_assignee)
    }
}

/// State name to the ordered actions leaving it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlowMap(BTreeMap<String, Vec<FlowEntry>>);

impl FlowMap {
    /// Actions leaving `state`; empty for unknown states
    pub fn actions_for(&self, state: &str) -> &[FlowEntry] {
        self.0.get(state).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn states(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn push(&mut self, entry: FlowEntry) {
        self.0.entry(entry.from.clone()).or_default().push(entry);
    }
}

/// The process graph of an app, derived once per session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessFlow {
    states: BTreeMap<String, ProcessState>,
    actions: Vec<ProcessAction>,
    flow_map: FlowMap,
    open_actions: BTreeSet<String>,
}

impl ProcessFlow {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn build(config: &ProcessConfig) -> Self {
        if config.enable == Some(false) {
            return Self::empty();
        }

        let states: BTreeMap<String, ProcessState> = config
            .states
            .iter()
            .map(|(name, state)| {
                let process_state = ProcessState {
                    name: name.clone(),
                    rule: AssignmentRule::from_config(state.assignee.as_ref()),
                    index: state.index.as_deref().and_then(|i| i.parse().ok()),
                };
                (name.clone(), process_state)
            })
            .collect();

        let mut flow_map = FlowMap::default();
        let mut actions = Vec::new();
        let mut open_actions = BTreeSet::new();

        for action in &config.actions {
            if action.from.is_empty() || action.to.is_empty() {
                continue;
            }

            let to_assignee = states
                .get(&action.to)
                .map(|s| s.rule.clone())
                .unwrap_or_default();
            flow_map.push(FlowEntry {
                action: action.name.clone(),
                label: action.name.clone(),
                from: action.from.clone(),
                to: action.to.clone(),
                next_assignee_type: to_assignee.assignee_type.clone(),
                to_assignee,
            });

            let open = action
                .executable_user
                .as_ref()
                .and_then(|u| u.entities.as_ref())
                .is_some_and(Vec::is_empty);
            if open {
                open_actions.insert(action.name.clone());
            }
            actions.push(ProcessAction {
                name: action.name.clone(),
                from: action.from.clone(),
                to: action.to.clone(),
                open,
            });
        }

        Self {
            states,
            actions,
            flow_map,
            open_actions,
        }
    }

    pub fn actions_for(&self, state: &str) -> &[FlowEntry] {
        self.flow_map.actions_for(state)
    }

    pub fn flow_map(&self) -> &FlowMap {
        &self.flow_map
    }

    pub fn open_actions(&self) -> &BTreeSet<String> {
        &self.open_actions
    }

    pub fn is_open(&self, action: &str) -> bool {
        self.open_actions.contains(action)
    }

    pub fn states(&self) -> impl Iterator<Item = &ProcessState> {
        self.states.values()
    }

    pub fn state(&self, name: &str) -> Option<&ProcessState> {
        self.states.get(name)
    }

    pub fn actions(&self) -> &[ProcessAction] {
        &self.actions
    }

    pub fn has_action(&self, name: &str) -> bool {
        self.actions.iter().any(|a| a.name == name)
    }

    pub fn require_action(&self, name: &str) -> Result<&ProcessAction, FlowError> {
        self.actions
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| FlowError::UnknownAction(name.to_string()))
    }

    pub fn require_state(&self, name: &str) -> Result<&ProcessState, FlowError> {
        self.states
            .get(name)
            .ok_or_else(|| FlowError::UnknownState(name.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.flow_map.is_empty()
    }
}
