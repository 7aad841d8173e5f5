//! In-crate test fakes for the token store and workflow engine ports.
//!
//! `choreo-infra` ships the real implementations; these minimal fakes keep
//! core tests free of infrastructure dependencies.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use choreo_types::correlation::CorrelationRecord;
use choreo_types::error::{EngineError, TokenStoreError};
use serde_json::Value;

use crate::engine::WorkflowEngine;
use crate::repository::token::TokenStore;

/// HashMap-backed token store keyed by `(entity_id, branch_key)`.
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    records: Mutex<HashMap<(String, String), CorrelationRecord>>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&self, record: CorrelationRecord) {
        self.records.lock().unwrap().insert(
            (record.entity_id.clone(), record.branch_key.clone()),
            record,
        );
    }

    pub(crate) fn record(&self, entity_id: &str, branch_key: &str) -> Option<CorrelationRecord> {
        self.records
            .lock()
            .unwrap()
            .get(&(entity_id.to_string(), branch_key.to_string()))
            .cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

impl TokenStore for MemoryStore {
    async fn get(&self, entity_id: &str) -> Result<Vec<CorrelationRecord>, TokenStoreError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.entity_id == entity_id)
            .cloned()
            .collect())
    }

    async fn put(&self, record: &CorrelationRecord) -> Result<(), TokenStoreError> {
        self.insert(record.clone());
        Ok(())
    }

    async fn delete(&self, entity_id: &str, branch_key: &str) -> Result<(), TokenStoreError> {
        self.records
            .lock()
            .unwrap()
            .remove(&(entity_id.to_string(), branch_key.to_string()));
        Ok(())
    }
}

/// A token store whose every operation fails, for error-propagation tests.
pub(crate) struct BrokenStore;

impl TokenStore for BrokenStore {
    async fn get(&self, _entity_id: &str) -> Result<Vec<CorrelationRecord>, TokenStoreError> {
        Err(TokenStoreError::Connection)
    }

    async fn put(&self, _record: &CorrelationRecord) -> Result<(), TokenStoreError> {
        Err(TokenStoreError::Connection)
    }

    async fn delete(&self, _entity_id: &str, _branch_key: &str) -> Result<(), TokenStoreError> {
        Err(TokenStoreError::Connection)
    }
}

/// Engine fake that records every call and hands out sequential ids.
pub(crate) struct RecordingEngine {
    /// When false, `start` succeeds but returns no execution id.
    issue_execution_ids: bool,
    next_id: AtomicU64,
    starts: Mutex<Vec<(String, String, Value)>>,
    signals: Mutex<Vec<(String, Value)>>,
    aborts: Mutex<Vec<(String, String)>>,
}

impl RecordingEngine {
    pub(crate) fn new() -> Self {
        Self {
            issue_execution_ids: true,
            next_id: AtomicU64::new(1),
            starts: Mutex::new(Vec::new()),
            signals: Mutex::new(Vec::new()),
            aborts: Mutex::new(Vec::new()),
        }
    }

    /// An engine that accepts starts without assigning execution ids.
    pub(crate) fn without_execution_ids() -> Self {
        Self {
            issue_execution_ids: false,
            ..Self::new()
        }
    }

    pub(crate) fn starts(&self) -> Vec<(String, String, Value)> {
        self.starts.lock().unwrap().clone()
    }

    pub(crate) fn signals(&self) -> Vec<(String, Value)> {
        self.signals.lock().unwrap().clone()
    }

    pub(crate) fn aborts(&self) -> Vec<(String, String)> {
        self.aborts.lock().unwrap().clone()
    }
}

impl WorkflowEngine for RecordingEngine {
    async fn start(
        &self,
        name: &str,
        definition_id: &str,
        input: &Value,
    ) -> Result<Option<String>, EngineError> {
        self.starts.lock().unwrap().push((
            name.to_string(),
            definition_id.to_string(),
            input.clone(),
        ));
        if self.issue_execution_ids {
            let n = self.next_id.fetch_add(1, Ordering::Relaxed);
            Ok(Some(format!("exec-{n}")))
        } else {
            Ok(None)
        }
    }

    async fn signal(&self, token: &str, payload: &Value) -> Result<(), EngineError> {
        self.signals
            .lock()
            .unwrap()
            .push((token.to_string(), payload.clone()));
        Ok(())
    }

    async fn abort(&self, execution_id: &str, cause: &str) -> Result<(), EngineError> {
        self.aborts
            .lock()
            .unwrap()
            .push((execution_id.to_string(), cause.to_string()));
        Ok(())
    }
}
