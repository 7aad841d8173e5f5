use thiserror::Error;

/// Errors from token store operations (used by trait definitions in
/// choreo-core).
#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("store connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("record not found")]
    NotFound,
}

/// Errors surfaced by the workflow engine capability.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine unavailable: {0}")]
    Unavailable(String),

    #[error("start rejected: {0}")]
    StartRejected(String),

    #[error("signal rejected for token '{token}': {reason}")]
    SignalRejected { token: String, reason: String },

    #[error("abort rejected for execution '{execution_id}': {reason}")]
    AbortRejected { execution_id: String, reason: String },
}

/// Errors from validating a state-graph definition.
///
/// All variants are fatal at construction time: an invalid definition is
/// rejected before it can be deployed or run.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("state '{state}' is a task state; every externally-actionable state must be a wait state")]
    NonWaitTask { state: String },

    #[error("state '{state}' transitions to unknown state '{target}'")]
    UnknownTarget { state: String, target: String },

    #[error("start state '{0}' not found in the state map")]
    MissingStart(String),

    #[error("definition contains no states")]
    EmptyGraph,
}
