// Mock host for unit tests - records every call, no network

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::host::client::HostApi;
use crate::host::errors::{HostError, HostErrorBody};
use crate::host::types::{ProcessConfig, StatusUpdate, StatusUpdateResponse};
use crate::record::Record;

#[derive(Debug, Default)]
pub struct MockHostApi {
    pub process_config: Mutex<Option<ProcessConfig>>,
    pub records: Mutex<HashMap<String, Record>>,
    pub status_error: Mutex<Option<HostErrorBody>>,
    pub process_config_calls: AtomicUsize,
    pub record_fetches: Mutex<Vec<String>>,
    pub status_updates: Mutex<Vec<StatusUpdate>>,
}

impl MockHostApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_process_config(config: ProcessConfig) -> Self {
        let mock = Self::new();
        mock.set_process_config(Some(config));
        mock
    }

    /// `None` makes the process-config call fail
    pub fn set_process_config(&self, config: Option<ProcessConfig>) {
        *self.process_config.lock().unwrap() = config;
    }

    pub fn set_record(&self, id: &str, record: Record) {
        self.records.lock().unwrap().insert(id.to_string(), record);
    }

    pub fn fail_status_updates(&self, body: Option<HostErrorBody>) {
        *self.status_error.lock().unwrap() = body;
    }

    pub fn process_config_calls(&self) -> usize {
        self.process_config_calls.load(Ordering::SeqCst)
    }

    pub fn record_fetches(&self) -> Vec<String> {
        self.record_fetches.lock().unwrap().clone()
    }

    pub fn status_updates(&self) -> Vec<StatusUpdate> {
        self.status_updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl HostApi for MockHostApi {
    async fn fetch_process_config(&self, _app: u64) -> Result<ProcessConfig, HostError> {
        self.process_config_calls.fetch_add(1, Ordering::SeqCst);
        self.process_config.lock().unwrap().clone().ok_or_else(|| HostError::Api {
            status: 403,
            body: HostErrorBody {
                code: Some("CB_NO02".to_string()),
                message: Some("No privilege to proceed.".to_string()),
                ..Default::default()
            },
        })
    }

    async fn fetch_record(&self, _app: u64, id: &str) -> Result<Record, HostError> {
        self.record_fetches.lock().unwrap().push(id.to_string());
        self.records.lock().unwrap().get(id).cloned().ok_or_else(|| HostError::Api {
            status: 404,
            body: HostErrorBody {
                code: Some("GAIA_RE01".to_string()),
                message: Some("指定したレコードが見つかりません。".to_string()),
                ..Default::default()
            },
        })
    }

    async fn update_status(&self, update: &StatusUpdate) -> Result<StatusUpdateResponse, HostError> {
        self.status_updates.lock().unwrap().push(update.clone());
        match self.status_error.lock().unwrap().clone() {
            Some(body) => Err(HostError::Api { status: 400, body }),
            None => Ok(StatusUpdateResponse {
                revision: Some("2".to_string()),
            }),
        }
    }
}
