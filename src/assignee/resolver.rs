use moka::future::Cache;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::assignee::policy::ReturnToCreatorPolicy;
use crate::flow::{AssigneeType, FlowEntry};
use crate::host::HostApi;
use crate::observability::host_metrics;
use crate::record::{Record, StatusFieldLocator};

/// (record id, field code)
type ResolutionKey = (String, String);

/// Works out who a transition hands the record to.
///
/// Field lookups are memoized per (record id, field code) for the session and
/// never invalidated.
pub struct AssigneeResolver {
    host: Arc<dyn HostApi>,
    app_id: u64,
    locator: StatusFieldLocator,
    fallback_field: Option<String>,
    policy: ReturnToCreatorPolicy,
    cache: Cache<ResolutionKey, Option<String>>,
}

impl std::fmt::Debug for AssigneeResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssigneeResolver")
            .field("app_id", &self.app_id)
            .field("fallback_field", &self.fallback_field)
            .field("policy", &self.policy)
            .field("cached_entries", &self.cache.entry_count())
            .finish()
    }
}

impl AssigneeResolver {
    pub fn new(host: Arc<dyn HostApi>, app_id: u64) -> Self {
        Self {
            host,
            app_id,
            locator: StatusFieldLocator::default(),
            fallback_field: None,
            policy: ReturnToCreatorPolicy::disabled(),
            cache: Cache::builder().max_capacity(10_000).build(),
        }
    }

    pub fn with_locator(mut self, locator: StatusFieldLocator) -> Self {
        self.locator = locator;
        self
    }

    /// Field read when a field-derived rule does not name one
    pub fn with_fallback_field(mut self, field: Option<String>) -> Self {
        self.fallback_field = field.filter(|f| !f.is_empty());
        self
    }

    pub fn with_policy(mut self, policy: ReturnToCreatorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The single identity the transition hands the record to, if one can be determined
    pub async fn derive_assignee_for_action(&self, record: &Record, entry: &FlowEntry) -> Option<String> {
        if let Some(user) = entry.to_assignee.fixed_user() {
            return Some(user.to_string());
        }

        if let Some(field) = self.designated_field(entry) {
            if let Some(code) = self.resolve_field(record, field).await {
                return Some(code);
            }
        }

        let creator = self.locator.creator(record);
        if let Some(code) = self.policy.next_assignee(&entry.action, creator.as_deref()) {
            debug!(action = %entry.action, assignee = %code, "Returning record to its creator");
            return Some(code);
        }

        None
    }

    fn designated_field<'a>(&'a self, entry: &'a FlowEntry) -> Option<&'a str> {
        entry.to_assignee.designated_field().or_else(|| {
            if entry.next_assignee_type == Some(AssigneeType::FieldEntity) {
                self.fallback_field.as_deref()
            } else {
                None
            }
        })
    }

    async fn resolve_field(&self, record: &Record, field: &str) -> Option<String> {
        let Some(record_id) = record.id() else {
            return record.single_identity(field);
        };

        let key = (record_id.clone(), field.to_string());
        if let Some(cached) = self.cache.get(&key).await {
            host_metrics().record_cache_hit();
            return cached;
        }
        host_metrics().record_cache_miss();

        let resolved = match record.single_identity(field) {
            Some(code) => Some(code),
            // List rows may be a partial projection of the record
            None => match self.host.fetch_record(self.app_id, &record_id).await {
                Ok(full) => full.single_identity(field),
                Err(e) => {
                    warn!(
                        record_id = %record_id,
                        field = %field,
                        error = %e.user_message(),
                        "Could not fetch record to resolve next assignee"
                    );
                    return None;
                }
            },
        };

        self.cache.insert(key, resolved.clone()).await;
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::AssignmentRule;
    use crate::host::mocks::MockHostApi;
    use crate::host::types::EntityEntry;
    use serde_json::json;

    fn entry(action: &str, rule_type: Option<AssigneeType>, entities: Vec<EntityEntry>) -> FlowEntry {
        FlowEntry {
            action: action.to_string(),
            label: action.to_string(),
            from: "申請中".to_string(),
            to: "承認済".to_string(),
            next_assignee_type: rule_type.clone(),
            to_assignee: AssignmentRule {
                assignee_type: rule_type,
                entities,
            },
        }
    }

    fn record(value: serde_json::Value) -> Record {
        Record::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_fixed_user_needs_no_fetch() {
        let host = Arc::new(MockHostApi::new());
        let resolver = AssigneeResolver::new(host.clone(), 1);
        let flow = entry("承認", Some(AssigneeType::User), vec![EntityEntry::user("u100")]);

        let resolved = resolver
            .derive_assignee_for_action(&record(json!({"$id": {"value": "1"}})), &flow)
            .await;

        assert_eq!(resolved, Some("u100".to_string()));
        assert!(host.record_fetches().is_empty());
    }

    #[tokio::test]
    async fn test_field_derived_from_snapshot() {
        let host = Arc::new(MockHostApi::new());
        let resolver = AssigneeResolver::new(host.clone(), 1);
        let flow = entry("承認", Some(AssigneeType::User), vec![EntityEntry::field("承認者")]);
        let rec = record(json!({
            "$id": {"value": "5"},
            "承認者": {"type": "USER_SELECT", "value": [{"code": "u7"}]}
        }));

        assert_eq!(resolver.derive_assignee_for_action(&rec, &flow).await, Some("u7".to_string()));
        assert!(host.record_fetches().is_empty());
    }

    #[tokio::test]
    async fn test_falls_back_to_full_record_and_memoizes() {
        let host = Arc::new(MockHostApi::new());
        host.set_record(
            "9",
            record(json!({
                "$id": {"value": "9"},
                "次の担当": {"type": "USER_SELECT", "value": [{"code": "u3"}]}
            })),
        );
        let resolver =
            AssigneeResolver::new(host.clone(), 1).with_fallback_field(Some("次の担当".to_string()));
        let flow = entry("回覧", Some(AssigneeType::FieldEntity), vec![]);
        let partial = record(json!({"$id": {"value": "9"}}));

        assert_eq!(resolver.derive_assignee_for_action(&partial, &flow).await, Some("u3".to_string()));
        assert_eq!(resolver.derive_assignee_for_action(&partial, &flow).await, Some("u3".to_string()));
        assert_eq!(host.record_fetches(), vec!["9".to_string()]);
    }

    #[tokio::test]
    async fn test_ambiguous_field_resolves_to_none() {
        let host = Arc::new(MockHostApi::new());
        let rec = record(json!({
            "$id": {"value": "3"},
            "承認者": {"type": "USER_SELECT", "value": [{"code": "u1"}, {"code": "u2"}]}
        }));
        host.set_record("3", rec.clone());
        let resolver = AssigneeResolver::new(host.clone(), 1);
        let flow = entry("承認", Some(AssigneeType::User), vec![EntityEntry::field("承認者")]);

        assert_eq!(resolver.derive_assignee_for_action(&rec, &flow).await, None);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_not_memoized() {
        let host = Arc::new(MockHostApi::new());
        let resolver = AssigneeResolver::new(host.clone(), 1);
        let flow = entry("承認", Some(AssigneeType::User), vec![EntityEntry::field("承認者")]);
        let partial = record(json!({"$id": {"value": "4"}}));

        assert_eq!(resolver.derive_assignee_for_action(&partial, &flow).await, None);
        host.set_record(
            "4",
            record(json!({"承認者": {"type": "USER_SELECT", "value": [{"code": "u8"}]}})),
        );
        assert_eq!(resolver.derive_assignee_for_action(&partial, &flow).await, Some("u8".to_string()));
    }

    #[tokio::test]
    async fn test_return_policy_uses_creator() {
        let host = Arc::new(MockHostApi::new());
        let rec = record(json!({
            "$id": {"value": "2"},
            "作成者": {"type": "CREATOR", "value": {"code": "author"}}
        }));
        let flow = entry("差し戻す", Some(AssigneeType::User), vec![EntityEntry::user("a"), EntityEntry::user("b")]);

        let without = AssigneeResolver::new(host.clone(), 1);
        assert_eq!(without.derive_assignee_for_action(&rec, &flow).await, None);

        let with = AssigneeResolver::new(host, 1).with_policy(ReturnToCreatorPolicy::default());
        assert_eq!(with.derive_assignee_for_action(&rec, &flow).await, Some("author".to_string()));
    }
}
