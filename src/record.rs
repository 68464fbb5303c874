//! Record snapshots as the host delivers them, and the status information the
//! list renderer derives from them.
//!
//! A record is a map from field code to `{ "type": ..., "value": ... }`.
//! List views additionally carry a `$status` entry with `value` and `assignee`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const STATUS_KEY: &str = "$status";
pub const ID_KEY: &str = "$id";
pub const STATUS_LABEL: &str = "ステータス";
pub const CREATOR_LABEL: &str = "作成者";
pub const STATUS_ASSIGNEE_TYPE: &str = "STATUS_ASSIGNEE";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Record identifier from `$id`, accepting string or numeric values
    pub fn id(&self) -> Option<String> {
        match self.0.get(ID_KEY).and_then(|f| f.get("value"))? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn field_type(&self, code: &str) -> Option<&str> {
        self.0.get(code).and_then(|f| f.get("type")).and_then(Value::as_str)
    }

    pub fn field_value(&self, code: &str) -> Option<&Value> {
        self.0.get(code).and_then(|f| f.get("value"))
    }

    /// Resolve a field to exactly one identity code.
    ///
    /// Top-level fields may hold an identity object or a list of identities that
    /// share one code. Fields inside subtables resolve only when every row yields
    /// the same single code.
    pub fn single_identity(&self, code: &str) -> Option<String> {
        if let Some(value) = self.field_value(code) {
            return single_code(value);
        }

        let mut resolved: Option<String> = None;
        let mut seen_rows = false;
        for row in self.subtable_rows() {
            let Some(value) = row.get(code).and_then(|f| f.get("value")) else {
                continue;
            };
            seen_rows = true;
            let row_code = single_code(value)?;
            match &resolved {
                Some(existing) if *existing != row_code => return None,
                Some(_) => {}
                None => resolved = Some(row_code),
            }
        }

        if seen_rows {
            resolved
        } else {
            None
        }
    }

    fn subtable_rows(&self) -> impl Iterator<Item = &Map<String, Value>> {
        self.0
            .values()
            .filter(|f| f.get("type").and_then(Value::as_str) == Some("SUBTABLE"))
            .filter_map(|f| f.get("value").and_then(Value::as_array))
            .flatten()
            .filter_map(|row| row.get("value").and_then(Value::as_object))
    }
}

/// Identity codes held by a value: a single `{code}` object or a list of them
pub fn identity_codes(value: &Value) -> Vec<String> {
    match value {
        Value::Object(obj) => obj
            .get("code")
            .and_then(Value::as_str)
            .filter(|c| !c.is_empty())
            .map(|c| vec![c.to_string()])
            .unwrap_or_default(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.get("code").and_then(Value::as_str))
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn single_code(value: &Value) -> Option<String> {
    let mut codes = identity_codes(value);
    codes.sort();
    codes.dedup();
    match codes.as_slice() {
        [only] => Some(only.clone()),
        _ => None,
    }
}

/// Which fields carry the process status, its assignees and the creator.
///
/// Explicit codes win. `label_fallback` enables the scan by field type and the
/// `ステータス` label for apps whose status field code is not configured.
#[derive(Debug, Clone, Default)]
pub struct StatusFieldLocator {
    pub status_field_code: Option<String>,
    pub assignee_field_code: Option<String>,
    pub creator_field_code: Option<String>,
    pub label_fallback: bool,
}

/// Status information derived from a record at render time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordStatusInfo {
    pub status: String,
    pub assignees: Vec<String>,
    pub creator: Option<String>,
}

impl RecordStatusInfo {
    pub fn has_assignees(&self) -> bool {
        !self.assignees.is_empty()
    }

    pub fn is_assignee(&self, viewer: &str) -> bool {
        self.assignees.iter().any(|a| a == viewer)
    }
}

impl StatusFieldLocator {
    pub fn status_info(&self, record: &Record) -> RecordStatusInfo {
        let status_entry = record.fields().get(STATUS_KEY);

        let mut status = status_entry
            .and_then(|s| s.get("value"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        // A located assignee entry is final even when empty
        let mut assignees = status_entry
            .and_then(|s| s.get("assignee"))
            .map(identity_codes);

        if status.is_empty() {
            if let Some(code) = &self.status_field_code {
                status = record
                    .field_value(code)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
            }
        }

        if assignees.is_none() {
            assignees = match &self.assignee_field_code {
                Some(code) => record.field_value(code).map(identity_codes),
                None => record
                    .fields()
                    .values()
                    .find(|f| f.get("type").and_then(Value::as_str) == Some(STATUS_ASSIGNEE_TYPE))
                    .map(|f| f.get("value").map(identity_codes).unwrap_or_default()),
            };
        }

        if self.label_fallback && (status.is_empty() || assignees.is_none()) {
            scan_fields(record.fields(), &mut status, &mut assignees);
        }

        let assignees = assignees.unwrap_or_default();
        RecordStatusInfo {
            status,
            assignees,
            creator: self.creator(record),
        }
    }

    pub fn creator(&self, record: &Record) -> Option<String> {
        let value = match &self.creator_field_code {
            Some(code) => record.field_value(code),
            None => record
                .fields()
                .values()
                .find(|f| f.get("type").and_then(Value::as_str) == Some("CREATOR"))
                .and_then(|f| f.get("value"))
                .or_else(|| record.field_value("CREATOR"))
                .or_else(|| record.field_value(CREATOR_LABEL)),
        }?;
        identity_codes(value).into_iter().next()
    }
}

/// Depth-first scan used when field codes are not configured.
///
/// Only `STATUS_ASSIGNEE` fields count as assignees; ordinary user fields
/// never do.
fn scan_fields(fields: &Map<String, Value>, status: &mut String, assignees: &mut Option<Vec<String>>) {
    for (key, field) in fields {
        let field_type = field.get("type").and_then(Value::as_str);
        let value = field.get("value");

        if status.is_empty() && (field_type == Some("STATUS") || key == STATUS_LABEL) {
            if let Some(v) = value.and_then(Value::as_str) {
                *status = v.to_string();
            }
        }
        if assignees.is_none() && field_type == Some(STATUS_ASSIGNEE_TYPE) {
            *assignees = Some(value.map(identity_codes).unwrap_or_default());
        }
        if field_type == Some("SUBTABLE") {
            let rows = value.and_then(Value::as_array).into_iter().flatten();
            for row in rows {
                if let Some(row_fields) = row.get("value").and_then(Value::as_object) {
                    scan_fields(row_fields, status, assignees);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        Record::from_value(value).unwrap()
    }

    #[test]
    fn test_id_accepts_string_and_number() {
        assert_eq!(record(json!({"$id": {"value": "12"}})).id(), Some("12".to_string()));
        assert_eq!(record(json!({"$id": {"value": 12}})).id(), Some("12".to_string()));
        assert_eq!(record(json!({})).id(), None);
    }

    #[test]
    fn test_status_from_list_view_entry() {
        let rec = record(json!({
            "$status": {"value": "申請中", "assignee": {"code": "u1", "name": "User 1"}}
        }));
        let info = StatusFieldLocator::default().status_info(&rec);
        assert_eq!(info.status, "申請中");
        assert_eq!(info.assignees, vec!["u1"]);
    }

    #[test]
    fn test_status_from_configured_fields() {
        let rec = record(json!({
            "Status": {"type": "STATUS", "value": "承認済"},
            "Assignee": {"type": "STATUS_ASSIGNEE", "value": [{"code": "u1"}, {"code": "u2"}]},
            "Approver": {"type": "USER_SELECT", "value": [{"code": "u9"}]}
        }));
        let locator = StatusFieldLocator {
            status_field_code: Some("Status".to_string()),
            assignee_field_code: Some("Assignee".to_string()),
            ..Default::default()
        };
        let info = locator.status_info(&rec);
        assert_eq!(info.status, "承認済");
        assert_eq!(info.assignees, vec!["u1", "u2"]);
    }

    #[test]
    fn test_label_fallback_scans_subtables() {
        let rec = record(json!({
            "Table": {"type": "SUBTABLE", "value": [
                {"id": "1", "value": {"ステータス": {"type": "SINGLE_LINE_TEXT", "value": "処理中"}}}
            ]}
        }));
        let without = StatusFieldLocator::default().status_info(&rec);
        assert_eq!(without.status, "");

        let with = StatusFieldLocator {
            label_fallback: true,
            ..Default::default()
        }
        .status_info(&rec);
        assert_eq!(with.status, "処理中");
    }

    #[test]
    fn test_empty_assignee_entry_is_final() {
        let rec = record(json!({
            "$status": {"value": "申請中", "assignee": []},
            "作業者": {"type": "STATUS_ASSIGNEE", "value": []},
            "承認者": {"type": "USER_SELECT", "value": [{"code": "u9"}]}
        }));
        let locator = StatusFieldLocator {
            label_fallback: true,
            ..Default::default()
        };
        let info = locator.status_info(&rec);
        assert_eq!(info.status, "申請中");
        assert!(info.assignees.is_empty());
    }

    #[test]
    fn test_label_fallback_ignores_plain_user_fields() {
        let rec = record(json!({
            "ステータス": {"type": "STATUS", "value": "申請中"},
            "承認者": {"type": "USER_SELECT", "value": [{"code": "u9"}]},
            "Table": {"type": "SUBTABLE", "value": [
                {"id": "1", "value": {"担当": {"type": "STATUS_ASSIGNEE", "value": [{"code": "u3"}]}}}
            ]}
        }));
        let locator = StatusFieldLocator {
            label_fallback: true,
            ..Default::default()
        };
        let info = locator.status_info(&rec);
        assert_eq!(info.status, "申請中");
        assert_eq!(info.assignees, vec!["u3"]);
    }

    #[test]
    fn test_creator_lookup() {
        let rec = record(json!({
            "作成者": {"type": "CREATOR", "value": {"code": "author", "name": "Author"}}
        }));
        assert_eq!(StatusFieldLocator::default().creator(&rec), Some("author".to_string()));
    }

    #[test]
    fn test_single_identity_variants() {
        let rec = record(json!({
            "One": {"type": "USER_SELECT", "value": [{"code": "u1"}]},
            "Object": {"type": "CREATOR", "value": {"code": "u2"}},
            "Same": {"type": "USER_SELECT", "value": [{"code": "u3"}, {"code": "u3"}]},
            "Two": {"type": "USER_SELECT", "value": [{"code": "u1"}, {"code": "u2"}]},
            "Empty": {"type": "USER_SELECT", "value": []}
        }));
        assert_eq!(rec.single_identity("One"), Some("u1".to_string()));
        assert_eq!(rec.single_identity("Object"), Some("u2".to_string()));
        assert_eq!(rec.single_identity("Same"), Some("u3".to_string()));
        assert_eq!(rec.single_identity("Two"), None);
        assert_eq!(rec.single_identity("Empty"), None);
        assert_eq!(rec.single_identity("Missing"), None);
    }

    #[test]
    fn test_single_identity_in_subtable_rows() {
        let agreeing = record(json!({
            "Table": {"type": "SUBTABLE", "value": [
                {"id": "1", "value": {"Reviewer": {"type": "USER_SELECT", "value": [{"code": "u5"}]}}},
                {"id": "2", "value": {"Reviewer": {"type": "USER_SELECT", "value": [{"code": "u5"}]}}}
            ]}
        }));
        assert_eq!(agreeing.single_identity("Reviewer"), Some("u5".to_string()));

        let disagreeing = record(json!({
            "Table": {"type": "SUBTABLE", "value": [
                {"id": "1", "value": {"Reviewer": {"type": "USER_SELECT", "value": [{"code": "u5"}]}}},
                {"id": "2", "value": {"Reviewer": {"type": "USER_SELECT", "value": [{"code": "u6"}]}}}
            ]}
        }));
        assert_eq!(disagreeing.single_identity("Reviewer"), None);
    }
}
