//! Wait-state construction and entry bookkeeping.
//!
//! A `WaitState` is the runtime side of a `State::Wait` graph node: when the
//! engine enters the state and issues a resumption token, `on_entry` resolves
//! the entity id from the state input and persists the correlation record
//! that later lets the correlator resume this exact branch. The suspension
//! itself happens inside the engine; this module only does the bookkeeping.
//!
//! Construction goes through `WaitStateBuilder`, which is configured once
//! with the token store and an optional default entity-id path. Each state is
//! then described by a one-shot `WaitStateConfig` consumed by `build()` --
//! successive builds share nothing, so no state can leak between them.

use std::sync::Arc;

use choreo_types::correlation::{CorrelationRecord, DEFAULT_BRANCH_KEY};
use choreo_types::error::TokenStoreError;
use choreo_types::graph::State;
use choreo_types::path;
use serde_json::Value;
use thiserror::Error;

use crate::repository::token::TokenStore;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors from building a wait-state.
#[derive(Debug, Error)]
pub enum WaitStateBuildError {
    /// Neither the state nor the builder defaults provide an entity id path.
    #[error("wait-state '{name}' has no entity id path and the builder has no default")]
    MissingEntityIdPath { name: String },
}

/// Errors from entering a wait-state.
#[derive(Debug, Error)]
pub enum WaitEntryError {
    /// The entity id path did not resolve to a string in the state input.
    #[error("entity id path '{path}' did not resolve to a string in the state input")]
    EntityIdUnresolved { path: String },

    #[error(transparent)]
    Store(#[from] TokenStoreError),
}

// ---------------------------------------------------------------------------
// WaitState
// ---------------------------------------------------------------------------

/// A wait-state bound to a token store.
#[derive(Debug)]
pub struct WaitState<S: TokenStore> {
    name: String,
    entity_id_path: String,
    branch_key: Option<String>,
    store: Arc<S>,
}

impl<S: TokenStore> WaitState<S> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The branch key this state's record is keyed on; the reserved Default
    /// key when the state has no explicit discriminator.
    pub fn branch_key(&self) -> &str {
        self.branch_key.as_deref().unwrap_or(DEFAULT_BRANCH_KEY)
    }

    pub fn entity_id_path(&self) -> &str {
        &self.entity_id_path
    }

    /// Persist the correlation record for this state on entry.
    ///
    /// `token` is the resumption handle issued by the engine for this entry;
    /// `input` is the state input the entity id is resolved from. The write
    /// is an upsert: a sole-pending wait (no explicit discriminator) lands
    /// on the Default key and overwrites the initiator's record with its
    /// token.
    pub async fn on_entry(
        &self,
        token: &str,
        input: &Value,
    ) -> Result<CorrelationRecord, WaitEntryError> {
        let entity_id = path::resolve_string(input, &self.entity_id_path).ok_or_else(|| {
            WaitEntryError::EntityIdUnresolved {
                path: self.entity_id_path.clone(),
            }
        })?;

        let record = CorrelationRecord::branch(entity_id, self.branch_key(), token);
        self.store.put(&record).await?;

        tracing::debug!(
            state = self.name.as_str(),
            entity_id = record.entity_id.as_str(),
            branch_key = record.branch_key.as_str(),
            "registered wait-state correlation record"
        );
        Ok(record)
    }

    /// The declarative graph node corresponding to this state.
    pub fn as_graph_state(&self, next: Option<String>) -> State {
        State::Wait {
            entity_id_path: self.entity_id_path.clone(),
            branch_key: self.branch_key.clone(),
            next,
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Factory for wait-states sharing a token store and default entity path.
pub struct WaitStateBuilder<S: TokenStore> {
    store: Arc<S>,
    default_entity_id_path: Option<String>,
}

impl<S: TokenStore> WaitStateBuilder<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            default_entity_id_path: None,
        }
    }

    /// Entity id path applied to states that do not set their own.
    pub fn with_default_entity_id_path(mut self, path: impl Into<String>) -> Self {
        self.default_entity_id_path = Some(path.into());
        self
    }

    /// Begin describing one wait-state. The returned config is one-shot:
    /// it is consumed by `build()` and shares nothing with later states.
    pub fn state(&self, name: impl Into<String>) -> WaitStateConfig<S> {
        WaitStateConfig {
            store: Arc::clone(&self.store),
            default_entity_id_path: self.default_entity_id_path.clone(),
            name: name.into(),
            entity_id_path: None,
            branch_key: None,
        }
    }
}

/// One-shot configuration for a single wait-state.
pub struct WaitStateConfig<S: TokenStore> {
    store: Arc<S>,
    default_entity_id_path: Option<String>,
    name: String,
    entity_id_path: Option<String>,
    branch_key: Option<String>,
}

impl<S: TokenStore> WaitStateConfig<S> {
    /// Override the entity id extraction path for this state only.
    pub fn entity_id(mut self, path: impl Into<String>) -> Self {
        self.entity_id_path = Some(path.into());
        self
    }

    /// Set the event discriminator. When omitted, the state uses the
    /// reserved Default key and must be the sole pending wait.
    pub fn event_name(mut self, branch_key: impl Into<String>) -> Self {
        self.branch_key = Some(branch_key.into());
        self
    }

    /// Construct the wait-state.
    pub fn build(self) -> Result<WaitState<S>, WaitStateBuildError> {
        let entity_id_path = self
            .entity_id_path
            .or(self.default_entity_id_path)
            .ok_or_else(|| WaitStateBuildError::MissingEntityIdPath {
                name: self.name.clone(),
            })?;

        Ok(WaitState {
            name: self.name,
            entity_id_path,
            branch_key: self.branch_key,
            store: self.store,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
