use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::record::Record;

/// Response of `GET /k/v1/app/status.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessConfig {
    #[serde(default)]
    pub enable: Option<bool>,
    #[serde(default)]
    pub states: BTreeMap<String, StateConfig>,
    #[serde(default)]
    pub actions: Vec<ActionConfig>,
    #[serde(default)]
    pub revision: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateConfig {
    #[serde(default)]
    pub name: String,
    /// The host sends the ordinal as a string
    #[serde(default)]
    pub index: Option<String>,
    #[serde(default)]
    pub assignee: Option<AssigneeConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssigneeConfig {
    #[serde(rename = "type", default)]
    pub assignee_type: Option<String>,
    #[serde(default)]
    pub entities: Vec<EntityEntry>,
}

/// One entity of an assignment or executor list.
///
/// The host nests the identity under `entity`; older payloads carried
/// `type`/`code` inline, so both shapes are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<Entity>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(rename = "includeSubs", default)]
    pub include_subs: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "type")]
    pub entity_type: String,
    #[serde(default)]
    pub code: Option<String>,
}

impl EntityEntry {
    pub fn user(code: &str) -> Self {
        Self::nested("USER", code)
    }

    pub fn field(code: &str) -> Self {
        Self::nested("FIELD_ENTITY", code)
    }

    pub fn nested(entity_type: &str, code: &str) -> Self {
        Self {
            entity: Some(Entity {
                entity_type: entity_type.to_string(),
                code: Some(code.to_string()),
            }),
            ..Default::default()
        }
    }

    /// Entity type, whichever shape the host used
    pub fn kind(&self) -> Option<&str> {
        self.entity
            .as_ref()
            .map(|e| e.entity_type.as_str())
            .or(self.entity_type.as_deref())
    }

    pub fn entity_code(&self) -> Option<&str> {
        self.entity
            .as_ref()
            .and_then(|e| e.code.as_deref())
            .or(self.code.as_deref())
            .filter(|code| !code.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(rename = "filterCond", default)]
    pub filter_cond: Option<String>,
    #[serde(rename = "executableUser", default)]
    pub executable_user: Option<ExecutableUser>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutableUser {
    #[serde(default)]
    pub entities: Option<Vec<EntityEntry>>,
}

/// Response of `GET /k/v1/record.json`
#[derive(Debug, Clone, Deserialize)]
pub struct RecordResponse {
    pub record: Record,
}

/// Body of `PUT /k/v1/record/status.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub app: u64,
    pub id: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<i64>,
}

impl StatusUpdate {
    pub fn new(app: u64, id: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            app,
            id: id.into(),
            action: action.into(),
            assignee: None,
            revision: None,
        }
    }

    pub fn with_assignee(mut self, assignee: Option<String>) -> Self {
        self.assignee = assignee;
        self
    }

    pub fn with_revision(mut self, revision: i64) -> Self {
        self.revision = Some(revision);
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdateResponse {
    #[serde(default)]
    pub revision: Option<String>,
}
