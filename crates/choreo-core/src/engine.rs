//! Workflow engine capability trait.
//!
//! The correlation core never talks to a concrete engine. Everything it needs
//! is this three-operation surface: start an execution, signal a suspended
//! one by resumption token, abort one by execution id. `choreo-infra`
//! provides an in-memory implementation for harnesses; production engines
//! plug in behind the same trait.

use choreo_types::error::EngineError;
use serde_json::Value;

/// The consumed surface of an external workflow engine.
pub trait WorkflowEngine: Send + Sync {
    /// Start a new execution of the given definition.
    ///
    /// Returns the execution id when the engine assigns one. An engine may
    /// accept the start yet omit the id; the initiator treats that as fatal.
    fn start(
        &self,
        name: &str,
        definition_id: &str,
        input: &Value,
    ) -> impl std::future::Future<Output = Result<Option<String>, EngineError>> + Send;

    /// Deliver a payload to the wait-state holding the given resumption
    /// token. A token is terminal: engines reject a second signal on the
    /// same token.
    fn signal(
        &self,
        token: &str,
        payload: &Value,
    ) -> impl std::future::Future<Output = Result<(), EngineError>> + Send;

    /// Abort a running execution with a diagnostic cause.
    fn abort(
        &self,
        execution_id: &str,
        cause: &str,
    ) -> impl std::future::Future<Output = Result<(), EngineError>> + Send;
}
