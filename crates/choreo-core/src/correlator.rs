//! Event correlator: resolves inbound domain events against pending
//! correlation records and resumes (or aborts) workflow instances.
//!
//! Resolution runs in one of two modes, selected by how many records the
//! token store holds for the event's entity:
//!
//! - **Single-wait**: exactly one record. The wait is resumed with the
//!   event payload no matter which branch key the event carries --
//!   discrimination between event types is the job of a choice state inside
//!   the workflow definition, not the correlator. The record stays in the
//!   store.
//! - **Parallel-wait**: several records. Only the record whose branch key
//!   equals the event's is resumed, and that record alone is deleted. An
//!   event matching no branch is an unexpected transition: the whole
//!   instance is aborted via the execution id carried on the Default record.
//!
//! Zero records means nobody is waiting; the event is acknowledged as a
//! no-op. The read-scan-act sequence is not atomic across the store; racing
//! duplicates are absorbed by the engine's terminal-token semantics.

use std::sync::Arc;

use choreo_types::correlation::{CorrelationRecord, DEFAULT_BRANCH_KEY};
use choreo_types::error::{EngineError, TokenStoreError};
use choreo_types::event::DomainEvent;
use thiserror::Error;

use crate::engine::WorkflowEngine;
use crate::repository::token::TokenStore;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors from correlating a domain event.
///
/// Store and engine failures propagate unwrapped so the invocation layer can
/// apply its retry policy. The corruption variants indicate the store
/// violates the correlation invariants and no safe action exists.
#[derive(Debug, Error)]
pub enum CorrelationError {
    #[error(transparent)]
    Store(#[from] TokenStoreError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Parallel-wait mode found no Default record to abort through.
    #[error("no Default record for entity '{entity_id}'; cannot resolve the execution to abort")]
    MissingDefaultRecord { entity_id: String },

    /// The record selected for resumption carries no token.
    #[error("record ({entity_id}, {branch_key}) has no resumption token")]
    RecordWithoutToken {
        entity_id: String,
        branch_key: String,
    },
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// What the correlator did with an event. All variants are success: an
/// abort is the intended side effect of an unexpected event, not a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrelationOutcome {
    /// No record was pending for the entity; the event was acknowledged
    /// without touching the engine.
    Ignored,
    /// A suspended branch was resumed with the event payload.
    Resumed {
        /// Branch key of the resumed record (which, in single-wait mode,
        /// need not equal the event's branch key).
        branch_key: String,
    },
    /// The event matched no pending branch; the instance was aborted.
    Aborted { execution_id: String },
}

// ---------------------------------------------------------------------------
// EventCorrelator
// ---------------------------------------------------------------------------

/// Correlates inbound domain events with suspended workflow branches.
///
/// Stateless apart from the token store; safe to invoke concurrently across
/// entities (and, at-least-once, for the same entity -- see module docs).
pub struct EventCorrelator<S: TokenStore, E: WorkflowEngine> {
    store: Arc<S>,
    engine: Arc<E>,
}

impl<S: TokenStore, E: WorkflowEngine> EventCorrelator<S, E> {
    pub fn new(store: Arc<S>, engine: Arc<E>) -> Self {
        Self { store, engine }
    }

    /// Resolve one domain event. See the module docs for the mode semantics.
    pub async fn handle_event(
        &self,
        event: &DomainEvent,
    ) -> Result<CorrelationOutcome, CorrelationError> {
        let records = self.store.get(&event.entity_id).await?;

        match records.as_slice() {
            [] => {
                tracing::debug!(
                    entity_id = event.entity_id.as_str(),
                    branch_key = event.branch_key.as_str(),
                    "no pending record for entity; acknowledging event as no-op"
                );
                Ok(CorrelationOutcome::Ignored)
            }
            [record] => self.resume_single(event, record).await,
            _ => self.resolve_parallel(event, &records).await,
        }
    }

    /// Single-wait mode: resume unconditionally, keep the record.
    async fn resume_single(
        &self,
        event: &DomainEvent,
        record: &CorrelationRecord,
    ) -> Result<CorrelationOutcome, CorrelationError> {
        let token = record
            .token
            .as_deref()
            .ok_or_else(|| CorrelationError::RecordWithoutToken {
                entity_id: record.entity_id.clone(),
                branch_key: record.branch_key.clone(),
            })?;

        self.engine.signal(token, &event.payload).await?;

        tracing::info!(
            entity_id = event.entity_id.as_str(),
            branch_key = record.branch_key.as_str(),
            event_branch = event.branch_key.as_str(),
            "resumed sole pending wait"
        );
        Ok(CorrelationOutcome::Resumed {
            branch_key: record.branch_key.clone(),
        })
    }

    /// Parallel-wait mode: one scan picks up the Default entry's execution
    /// id and the branch match; then resume-and-delete, or abort.
    async fn resolve_parallel(
        &self,
        event: &DomainEvent,
        records: &[CorrelationRecord],
    ) -> Result<CorrelationOutcome, CorrelationError> {
        let mut execution_id: Option<&str> = None;
        let mut matched: Option<&CorrelationRecord> = None;

        for record in records {
            if record.branch_key == DEFAULT_BRANCH_KEY {
                execution_id = record.execution_id.as_deref();
            }
            if record.branch_key == event.branch_key {
                matched = Some(record);
            }
        }

        if let Some(record) = matched {
            let token = record
                .token
                .as_deref()
                .ok_or_else(|| CorrelationError::RecordWithoutToken {
                    entity_id: record.entity_id.clone(),
                    branch_key: record.branch_key.clone(),
                })?;

            self.engine.signal(token, &event.payload).await?;
            self.store
                .delete(&record.entity_id, &record.branch_key)
                .await?;

            tracing::info!(
                entity_id = event.entity_id.as_str(),
                branch_key = record.branch_key.as_str(),
                "resumed parallel branch and removed its record"
            );
            return Ok(CorrelationOutcome::Resumed {
                branch_key: record.branch_key.clone(),
            });
        }

        let execution_id = execution_id
            .ok_or_else(|| CorrelationError::MissingDefaultRecord {
                entity_id: event.entity_id.clone(),
            })?
            .to_string();

        let cause = format!(
            "unexpected event '{}' for entity '{}'",
            event.branch_key, event.entity_id
        );
        self.engine.abort(&execution_id, &cause).await?;

        tracing::warn!(
            entity_id = event.entity_id.as_str(),
            branch_key = event.branch_key.as_str(),
            execution_id = execution_id.as_str(),
            "event matched no pending branch; aborted instance"
        );
        Ok(CorrelationOutcome::Aborted { execution_id })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
