//! In-memory workflow engine for test suites and local harnesses.
//!
//! Backs the `WorkflowEngine` capability with nothing but maps: executions
//! are records, resumption tokens are issued on demand, and a token is
//! terminal -- the second signal on the same token is rejected, which is the
//! engine-side behavior the correlator's at-least-once model relies on.
//!
//! This is not an execution engine: it never walks a state graph. Harnesses
//! drive wait-state entries themselves by issuing a token and calling
//! `WaitState::on_entry` with it.

use choreo_core::engine::WorkflowEngine;
use choreo_types::error::EngineError;
use dashmap::DashMap;
use serde_json::Value;
use uuid::Uuid;

/// Status of an execution held by the in-memory engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    Running,
    Aborted { cause: String },
}

/// A started execution.
#[derive(Debug, Clone)]
pub struct Execution {
    pub execution_id: String,
    pub name: String,
    pub definition_id: String,
    pub input: Value,
    pub status: ExecutionStatus,
}

#[derive(Debug)]
struct IssuedToken {
    consumed: bool,
    payload: Option<Value>,
}

/// Map-backed fake of the workflow engine capability.
pub struct InMemoryEngine {
    /// When true (the default), `start` assigns execution ids.
    issue_execution_ids: bool,
    executions: DashMap<String, Execution>,
    tokens: DashMap<String, IssuedToken>,
}

impl Default for InMemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEngine {
    pub fn new() -> Self {
        Self {
            issue_execution_ids: true,
            executions: DashMap::new(),
            tokens: DashMap::new(),
        }
    }

    /// An engine that accepts starts but never returns an execution id,
    /// for exercising the initiator's fatal path.
    pub fn without_execution_ids() -> Self {
        Self {
            issue_execution_ids: false,
            ..Self::new()
        }
    }

    /// Issue a fresh resumption token, as a real engine would on entering a
    /// wait-state.
    pub fn issue_token(&self) -> String {
        let token = format!("tok-{}", Uuid::now_v7());
        self.tokens.insert(
            token.clone(),
            IssuedToken {
                consumed: false,
                payload: None,
            },
        );
        token
    }

    /// Snapshot of a started execution.
    pub fn execution(&self, execution_id: &str) -> Option<Execution> {
        self.executions.get(execution_id).map(|e| e.value().clone())
    }

    /// The payload delivered to a consumed token, if any.
    pub fn delivered_payload(&self, token: &str) -> Option<Value> {
        self.tokens
            .get(token)
            .and_then(|t| t.payload.clone())
    }

    pub fn is_consumed(&self, token: &str) -> bool {
        self.tokens.get(token).is_some_and(|t| t.consumed)
    }
}

impl WorkflowEngine for InMemoryEngine {
    async fn start(
        &self,
        name: &str,
        definition_id: &str,
        input: &Value,
    ) -> Result<Option<String>, EngineError> {
        if !self.issue_execution_ids {
            return Ok(None);
        }

        let execution_id = format!("exec-{}", Uuid::now_v7());
        self.executions.insert(
            execution_id.clone(),
            Execution {
                execution_id: execution_id.clone(),
                name: name.to_string(),
                definition_id: definition_id.to_string(),
                input: input.clone(),
                status: ExecutionStatus::Running,
            },
        );
        tracing::debug!(
            name,
            definition_id,
            execution_id = execution_id.as_str(),
            "started in-memory execution"
        );
        Ok(Some(execution_id))
    }

    async fn signal(&self, token: &str, payload: &Value) -> Result<(), EngineError> {
        let mut entry = self
            .tokens
            .get_mut(token)
            .ok_or_else(|| EngineError::SignalRejected {
                token: token.to_string(),
                reason: "unknown token".to_string(),
            })?;

        if entry.consumed {
            return Err(EngineError::SignalRejected {
                token: token.to_string(),
                reason: "token already consumed".to_string(),
            });
        }

        entry.consumed = true;
        entry.payload = Some(payload.clone());
        Ok(())
    }

    async fn abort(&self, execution_id: &str, cause: &str) -> Result<(), EngineError> {
        let mut entry = self
            .executions
            .get_mut(execution_id)
            .ok_or_else(|| EngineError::AbortRejected {
                execution_id: execution_id.to_string(),
                reason: "unknown execution".to_string(),
            })?;

        if entry.status != ExecutionStatus::Running {
            return Err(EngineError::AbortRejected {
                execution_id: execution_id.to_string(),
                reason: "execution is not running".to_string(),
            });
        }

        entry.status = ExecutionStatus::Aborted {
            cause: cause.to_string(),
        };
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
