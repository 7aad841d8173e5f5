//! In-memory token store backed by a concurrent map.
//!
//! Used by test harnesses and the simulation driver; semantics match the
//! SQLite store (upsert by key, unordered get, tolerant delete).

use choreo_core::repository::token::TokenStore;
use choreo_types::correlation::CorrelationRecord;
use choreo_types::error::TokenStoreError;
use dashmap::DashMap;

/// DashMap-backed implementation of `TokenStore`.
///
/// Outer key is the entity id; the inner map is keyed by branch key.
#[derive(Default)]
pub struct InMemoryTokenStore {
    records: DashMap<String, std::collections::HashMap<String, CorrelationRecord>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of records across all entities.
    pub fn len(&self) -> usize {
        self.records.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TokenStore for InMemoryTokenStore {
    async fn get(&self, entity_id: &str) -> Result<Vec<CorrelationRecord>, TokenStoreError> {
        Ok(self
            .records
            .get(entity_id)
            .map(|entry| entry.value().values().cloned().collect())
            .unwrap_or_default())
    }

    async fn put(&self, record: &CorrelationRecord) -> Result<(), TokenStoreError> {
        self.records
            .entry(record.entity_id.clone())
            .or_default()
            .insert(record.branch_key.clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, entity_id: &str, branch_key: &str) -> Result<(), TokenStoreError> {
        if let Some(mut entry) = self.records.get_mut(entity_id) {
            entry.remove(branch_key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use choreo_types::correlation::DEFAULT_BRANCH_KEY;

    #[tokio::test]
    async fn put_get_delete_roundtrip() {
        let store = InMemoryTokenStore::new();

        store
            .put(&CorrelationRecord::instance("car-1", "exec-1"))
            .await
            .unwrap();
        store
            .put(&CorrelationRecord::branch("car-1", "Car Cleaned", "t1"))
            .await
            .unwrap();
        assert_eq!(store.len(), 2);

        store.delete("car-1", "Car Cleaned").await.unwrap();
        let records = store.get("car-1").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].branch_key, DEFAULT_BRANCH_KEY);
    }

    #[tokio::test]
    async fn upsert_replaces_by_key() {
        let store = InMemoryTokenStore::new();

        store
            .put(&CorrelationRecord::branch("car-1", "Car Cleaned", "t1"))
            .await
            .unwrap();
        store
            .put(&CorrelationRecord::branch("car-1", "Car Cleaned", "t2"))
            .await
            .unwrap();

        let records = store.get("car-1").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].token.as_deref(), Some("t2"));
    }

    #[tokio::test]
    async fn unknown_entity_yields_empty_vec() {
        let store = InMemoryTokenStore::new();
        assert!(store.get("nobody").await.unwrap().is_empty());
        // Deleting from an unknown entity is tolerated.
        store.delete("nobody", "Nothing").await.unwrap();
    }
}
