//! SQLite token store implementation.
//!
//! Implements `TokenStore` from `choreo-core` using sqlx with split
//! read/write pools. One row per `(entity_id, branch_key)` key; `put` is an
//! `INSERT ... ON CONFLICT DO UPDATE` so retried writes are idempotent.

use choreo_core::repository::token::TokenStore;
use choreo_types::correlation::CorrelationRecord;
use choreo_types::error::TokenStoreError;
use chrono::{DateTime, Utc};
use sqlx::Row;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `TokenStore`.
pub struct SqliteTokenStore {
    pool: DatabasePool,
}

impl SqliteTokenStore {
    /// Create a new store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Internal row type
// ---------------------------------------------------------------------------

struct CorrelationRow {
    entity_id: String,
    branch_key: String,
    token: Option<String>,
    execution_id: Option<String>,
    updated_at: String,
}

impl CorrelationRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            entity_id: row.try_get("entity_id")?,
            branch_key: row.try_get("branch_key")?,
            token: row.try_get("token")?,
            execution_id: row.try_get("execution_id")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_record(self) -> Result<CorrelationRecord, TokenStoreError> {
        let updated_at = parse_datetime(&self.updated_at)?;
        Ok(CorrelationRecord {
            entity_id: self.entity_id,
            branch_key: self.branch_key,
            token: self.token,
            execution_id: self.execution_id,
            updated_at,
        })
    }
}

fn parse_datetime(text: &str) -> Result<DateTime<Utc>, TokenStoreError> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| TokenStoreError::Query(format!("invalid timestamp '{text}': {e}")))
}

// ---------------------------------------------------------------------------
// TokenStore implementation
// ---------------------------------------------------------------------------

impl TokenStore for SqliteTokenStore {
    async fn get(&self, entity_id: &str) -> Result<Vec<CorrelationRecord>, TokenStoreError> {
        let rows = sqlx::query(
            "SELECT entity_id, branch_key, token, execution_id, updated_at \
             FROM correlation_records WHERE entity_id = ?",
        )
        .bind(entity_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| TokenStoreError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                CorrelationRow::from_row(row)
                    .map_err(|e| TokenStoreError::Query(e.to_string()))?
                    .into_record()
            })
            .collect()
    }

    async fn put(&self, record: &CorrelationRecord) -> Result<(), TokenStoreError> {
        sqlx::query(
            "INSERT INTO correlation_records \
                 (entity_id, branch_key, token, execution_id, updated_at) \
             VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT(entity_id, branch_key) DO UPDATE SET \
                 token = excluded.token, \
                 execution_id = excluded.execution_id, \
                 updated_at = excluded.updated_at",
        )
        .bind(&record.entity_id)
        .bind(&record.branch_key)
        .bind(&record.token)
        .bind(&record.execution_id)
        .bind(record.updated_at.to_rfc3339())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| TokenStoreError::Query(e.to_string()))?;

        Ok(())
    }

    async fn delete(&self, entity_id: &str, branch_key: &str) -> Result<(), TokenStoreError> {
        sqlx::query("DELETE FROM correlation_records WHERE entity_id = ? AND branch_key = ?")
            .bind(entity_id)
            .bind(branch_key)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| TokenStoreError::Query(e.to_string()))?;

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
