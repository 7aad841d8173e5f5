//! Token store trait definition.
//!
//! Defines the storage interface for correlation records. The infrastructure
//! layer (choreo-infra) implements this trait with SQLite persistence and an
//! in-memory variant for harnesses.
//!
//! Uses native async fn in traits (Rust 2024 edition, no async_trait macro).

use choreo_types::correlation::CorrelationRecord;
use choreo_types::error::TokenStoreError;

/// Keyed storage for correlation records.
///
/// The unique key is `(entity_id, branch_key)`. No transactional multi-key
/// semantics are provided: callers performing read-then-act sequences must
/// tolerate races (the workflow engine's terminal-token semantics absorb
/// duplicate resume attempts).
pub trait TokenStore: Send + Sync {
    /// All records for an entity, in no particular order.
    fn get(
        &self,
        entity_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<CorrelationRecord>, TokenStoreError>> + Send;

    /// Upsert a record by its `(entity_id, branch_key)` key. Idempotent.
    fn put(
        &self,
        record: &CorrelationRecord,
    ) -> impl std::future::Future<Output = Result<(), TokenStoreError>> + Send;

    /// Delete the record with the given key. Deleting a missing record is
    /// not an error.
    fn delete(
        &self,
        entity_id: &str,
        branch_key: &str,
    ) -> impl std::future::Future<Output = Result<(), TokenStoreError>> + Send;
}
