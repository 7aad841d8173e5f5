//! Event types for the Choreo delivery boundary.
//!
//! `BusEvent` is the raw shape published on the delivery substrate (source,
//! detail-type, JSON detail). `DomainEvent` is the correlator's input after
//! the routing layer has extracted the entity id and branch key. An
//! `EventMatcher` describes which bus events a choreography cares about and
//! how to extract the correlation fields from them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::path;

/// A raw event as delivered by the event bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusEvent {
    /// Producer identifier (e.g. `"cleaning-service"`).
    pub source: String,
    /// Event discriminator (e.g. `"Car Cleaned"`). Becomes the branch key.
    pub detail_type: String,
    /// Arbitrary structured payload.
    pub detail: Value,
}

impl BusEvent {
    pub fn new(
        source: impl Into<String>,
        detail_type: impl Into<String>,
        detail: Value,
    ) -> Self {
        Self {
            source: source.into(),
            detail_type: detail_type.into(),
            detail,
        }
    }
}

/// The correlator's input: a domain event with its correlation fields
/// already extracted by the routing layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Correlation identifier of the business entity.
    pub entity_id: String,
    /// Event discriminator used to select a branch record.
    pub branch_key: String,
    /// The event payload, forwarded verbatim to the resumed workflow.
    pub payload: Value,
}

/// Declarative description of the bus events a choreography consumes.
///
/// Matching is exact on `(source, detail_type)`. `entity_id_path` is the
/// dotted path into the event detail where the correlation id lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMatcher {
    pub source: String,
    pub detail_type: String,
    /// Path into the event detail resolving to the entity id string.
    pub entity_id_path: String,
}

impl EventMatcher {
    pub fn new(
        source: impl Into<String>,
        detail_type: impl Into<String>,
        entity_id_path: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            detail_type: detail_type.into(),
            entity_id_path: entity_id_path.into(),
        }
    }

    /// Whether this matcher selects the given bus event.
    pub fn matches(&self, event: &BusEvent) -> bool {
        self.source == event.source && self.detail_type == event.detail_type
    }

    /// Extract a `DomainEvent` from a matching bus event.
    ///
    /// Returns `None` when the entity id path does not resolve to a string
    /// in the event detail.
    pub fn extract(&self, event: &BusEvent) -> Option<DomainEvent> {
        let entity_id = path::resolve_string(&event.detail, &self.entity_id_path)?;
        Some(DomainEvent {
            entity_id,
            branch_key: event.detail_type.clone(),
            payload: event.detail.clone(),
        })
    }
}
