use std::collections::BTreeSet;
use tracing::warn;

/// Actions the installer ticked on the settings screen.
///
/// Stored as a JSON array string. An empty or unreadable list permits every
/// action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedActions(BTreeSet<String>);

impl AllowedActions {
    pub fn parse(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::default();
        }
        match serde_json::from_str::<Vec<String>>(raw) {
            Ok(names) => Self(names.into_iter().filter(|n| !n.is_empty()).collect()),
            Err(e) => {
                warn!(error = %e, "Ignoring malformed allowed-actions setting");
                Self::default()
            }
        }
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn permits(&self, action: &str) -> bool {
        self.0.is_empty() || self.0.contains(action)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "[]".to_string())
    }
}
