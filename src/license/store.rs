use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::license::LicenseError;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredAuth {
    #[serde(rename = "lastAuthDate", default, skip_serializing_if = "Option::is_none")]
    pub last_auth_date: Option<String>,
}

/// JSON file of per-plugin entries keyed `PLUGIN_{id}_config`.
#[derive(Debug, Clone)]
pub struct LicenseStore {
    path: PathBuf,
    key: String,
}

impl LicenseStore {
    pub fn new(path: impl Into<PathBuf>, plugin_id: &str) -> Self {
        Self {
            path: path.into(),
            key: format!("PLUGIN_{plugin_id}_config"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Unreadable or missing stores read as empty
    pub async fn load(&self) -> StoredAuth {
        self.load_all().await.remove(&self.key).unwrap_or_default()
    }

    pub async fn save(&self, entry: &StoredAuth) -> Result<(), LicenseError> {
        let mut all = self.load_all().await;
        all.insert(self.key.clone(), entry.clone());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_string_pretty(&all)?;
        tokio::fs::write(&self.path, body).await?;
        Ok(())
    }

    async fn load_all(&self) -> BTreeMap<String, StoredAuth> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(body) => serde_json::from_str(&body).unwrap_or_else(|e| {
                tracing::warn!(path = %self.path.display(), error = %e, "Ignoring unreadable license store");
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_and_load_keeps_other_plugins() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("license.json");

        let a = LicenseStore::new(&path, "a");
        let b = LicenseStore::new(&path, "b");
        a.save(&StoredAuth { last_auth_date: Some("20261016".into()) }).await.unwrap();
        b.save(&StoredAuth { last_auth_date: Some("20261001".into()) }).await.unwrap();

        assert_eq!(a.load().await.last_auth_date.as_deref(), Some("20261016"));
        assert_eq!(b.load().await.last_auth_date.as_deref(), Some("20261001"));

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("PLUGIN_a_config"));
        assert!(raw.contains("lastAuthDate"));
    }

    #[tokio::test]
    async fn test_missing_or_corrupt_store_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("license.json");
        let store = LicenseStore::new(&path, "a");
        assert_eq!(store.load().await, StoredAuth::default());

        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(store.load().await, StoredAuth::default());
    }
}
