//! Correlation records: the persistent mapping from `(entity, branch)` to a
//! resumption token.
//!
//! Every suspended wait-state of a running workflow instance is represented by
//! one `CorrelationRecord` in the token store. The record written at instance
//! start uses the reserved branch key [`DEFAULT_BRANCH_KEY`] and carries the
//! execution id -- it is the only way the instance can be found for an abort.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reserved branch key for the whole-instance fallback record.
///
/// Written once by the initiator at instance start (carrying the execution
/// id), and reused by any wait-state that has no explicit event discriminator
/// (a sequential wait overwrites this record with its resumption token).
pub const DEFAULT_BRANCH_KEY: &str = "Default";

/// A stored mapping from `(entity_id, branch_key)` to a resumption token.
///
/// The pair `(entity_id, branch_key)` is the unique key; writes are upserts.
/// `token` is absent only on the Default record freshly written by the
/// initiator, before any wait-state has been entered. `execution_id` is
/// populated only on the Default record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationRecord {
    /// Correlation identifier of the business entity (e.g. an order id).
    pub entity_id: String,
    /// Event discriminator this record is keyed on, or [`DEFAULT_BRANCH_KEY`].
    pub branch_key: String,
    /// Opaque resumption token issued by the workflow engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Engine execution id; present only on the Default record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_id: Option<String>,
    /// When this record was last written.
    pub updated_at: DateTime<Utc>,
}

impl CorrelationRecord {
    /// The Default record written by the initiator when an instance starts.
    ///
    /// Carries the execution id and no token; a sequential wait-state later
    /// upserts the token onto this same key.
    pub fn instance(entity_id: impl Into<String>, execution_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            branch_key: DEFAULT_BRANCH_KEY.to_string(),
            token: None,
            execution_id: Some(execution_id.into()),
            updated_at: Utc::now(),
        }
    }

    /// A branch record written by a wait-state on entry.
    pub fn branch(
        entity_id: impl Into<String>,
        branch_key: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            branch_key: branch_key.into(),
            token: Some(token.into()),
            execution_id: None,
            updated_at: Utc::now(),
        }
    }

    /// Whether this is the whole-instance fallback record.
    pub fn is_default(&self) -> bool {
        self.branch_key == DEFAULT_BRANCH_KEY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_record_has_execution_id_and_no_token() {
        let record = CorrelationRecord::instance("order-1", "exec-abc");
        assert_eq!(record.entity_id, "order-1");
        assert_eq!(record.branch_key, DEFAULT_BRANCH_KEY);
        assert!(record.is_default());
        assert_eq!(record.token, None);
        assert_eq!(record.execution_id.as_deref(), Some("exec-abc"));
    }

    #[test]
    fn branch_record_has_token_and_no_execution_id() {
        let record = CorrelationRecord::branch("car-1", "Car Cleaned", "tok-1");
        assert_eq!(record.branch_key, "Car Cleaned");
        assert!(!record.is_default());
        assert_eq!(record.token.as_deref(), Some("tok-1"));
        assert_eq!(record.execution_id, None);
    }

    #[test]
    fn json_roundtrip_omits_absent_fields() {
        let record = CorrelationRecord::instance("order-1", "exec-abc");
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("\"token\""));
        let parsed: CorrelationRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }
}
