//! Workflow initiator: starts a new instance and registers its fallback
//! correlation record.
//!
//! The Default record written here is the only place an instance's execution
//! id is persisted -- the correlator finds the execution to abort through it
//! and through nothing else.

use std::sync::Arc;

use choreo_types::correlation::CorrelationRecord;
use choreo_types::error::{EngineError, TokenStoreError};
use serde_json::Value;
use thiserror::Error;

use crate::engine::WorkflowEngine;
use crate::repository::token::TokenStore;

/// Errors from starting a workflow instance.
#[derive(Debug, Error)]
pub enum InitiatorError {
    /// The engine accepted the start but returned no execution identifier.
    /// No correlation record is written in this case.
    #[error("engine returned no execution id for entity '{entity_id}'")]
    ExecutionNotStarted { entity_id: String },

    #[error(transparent)]
    Store(#[from] TokenStoreError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Starts workflow instances and writes their Default correlation records.
pub struct WorkflowInitiator<S: TokenStore, E: WorkflowEngine> {
    store: Arc<S>,
    engine: Arc<E>,
}

impl<S: TokenStore, E: WorkflowEngine> WorkflowInitiator<S, E> {
    pub fn new(store: Arc<S>, engine: Arc<E>) -> Self {
        Self { store, engine }
    }

    /// Start an instance of `definition_id` for the given entity.
    ///
    /// The entity id doubles as the engine-side execution name. On success
    /// the Default record carrying the execution id is upserted, which makes
    /// the whole operation idempotent against caller-level retries. Engine
    /// and store errors propagate unwrapped; no retry happens here.
    pub async fn start(
        &self,
        entity_id: &str,
        definition_id: &str,
        input: &Value,
    ) -> Result<String, InitiatorError> {
        let execution_id = self
            .engine
            .start(entity_id, definition_id, input)
            .await?
            .ok_or_else(|| InitiatorError::ExecutionNotStarted {
                entity_id: entity_id.to_string(),
            })?;

        self.store
            .put(&CorrelationRecord::instance(entity_id, execution_id.clone()))
            .await?;

        tracing::info!(
            entity_id,
            definition_id,
            execution_id = execution_id.as_str(),
            "started workflow instance"
        );
        Ok(execution_id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
