use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{self, ListFlowConfig};
use crate::host::{HostApi, HostClient};
use crate::license::LicenseGate;
use crate::record::Record;

pub mod act;
pub mod auth;
pub mod configure;
pub mod event;
pub mod flow;
pub mod render;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}

/// Everything a command needs to talk to the host
pub struct Session {
    pub config: ListFlowConfig,
    pub host: Arc<dyn HostApi>,
    pub gate: Arc<LicenseGate>,
}

pub fn load_config(path: Option<&Path>) -> Result<ListFlowConfig> {
    match path {
        Some(path) => ListFlowConfig::load_with(Some(path))
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Ok(config::config()?.clone()),
    }
}

pub async fn with_session<F, Fut, R>(config_path: Option<PathBuf>, f: F) -> Result<R>
where
    F: FnOnce(Session) -> Fut,
    Fut: std::future::Future<Output = Result<R>>,
{
    let config = load_config(config_path.as_deref())?;

    print!("🔄 Connecting to {}... ", config.host.base_url);
    std::io::Write::flush(&mut std::io::stdout())?;

    match HostClient::new(&config.host) {
        Ok(client) => {
            println!("✅");
            let gate = Arc::new(LicenseGate::from_config(&config)?);
            f(Session {
                host: Arc::new(client),
                gate,
                config,
            })
            .await
        }
        Err(e) => {
            println!("❌");
            println!("{e}");
            Err(e.into())
        }
    }
}

/// Records from a JSON file: an array, a `{records: [...]}` list response,
/// a `{record: {...}}` single response, or a bare record
pub fn read_records(path: &Path) -> Result<Vec<Record>> {
    let body = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&body).with_context(|| format!("{} is not valid JSON", path.display()))?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            if let Some(Value::Array(items)) = map.remove("records") {
                items
            } else if let Some(record) = map.remove("record") {
                vec![record]
            } else {
                vec![Value::Object(map)]
            }
        }
        _ => anyhow::bail!("{} does not contain records", path.display()),
    };

    Ok(items.into_iter().filter_map(Record::from_value).collect())
}

pub async fn fetch_records(host: &dyn HostApi, app: u64, ids: &[String]) -> Result<Vec<Record>> {
    let mut records = Vec::with_capacity(ids.len());
    for id in ids {
        let record = host
            .fetch_record(app, id)
            .await
            .with_context(|| format!("Failed to fetch record {id}"))?;
        records.push(record);
    }
    Ok(records)
}

pub async fn show_how_to_get_started() -> Result<()> {
    println!("📋 listflow - process actions for list views");
    println!();
    println!("To get started:");
    println!("  🔎 listflow flow                      # Inspect the app's process");
    println!("  🖼️  listflow render --id 1 --id 2      # Preview row buttons");
    println!("  ▶️  listflow act --record 1 --action 承認");
    println!();
    println!("Setup:");
    println!("  🔐 listflow auth                      # Check the license");
    println!("  ⚙️  listflow configure --op-field 操作 --action 承認");
    println!();
    println!("💡 Settings come from listflow.toml and LISTFLOW_* environment variables.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_records_accepts_common_shapes() {
        let dir = TempDir::new().unwrap();

        let list = dir.path().join("list.json");
        std::fs::write(&list, r#"{"records": [{"$id": {"value": "1"}}, {"$id": {"value": "2"}}]}"#).unwrap();
        assert_eq!(read_records(&list).unwrap().len(), 2);

        let single = dir.path().join("single.json");
        std::fs::write(&single, r#"{"record": {"$id": {"value": "3"}}}"#).unwrap();
        assert_eq!(read_records(&single).unwrap()[0].id().as_deref(), Some("3"));

        let array = dir.path().join("array.json");
        std::fs::write(&array, r#"[{"$id": {"value": "4"}}, 5]"#).unwrap();
        assert_eq!(read_records(&array).unwrap().len(), 1);

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "42").unwrap();
        assert!(read_records(&bad).is_err());
    }
}
