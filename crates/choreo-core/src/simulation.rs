//! Scripted event-simulation driver for manual and end-to-end testing.
//!
//! A `SimulationScript` is an ordered list of events with per-entry pauses.
//! The driver publishes each entry to the event bus and then sleeps for the
//! entry's `wait_seconds` before the next one -- one lane, no overlap
//! between consecutive publishes. Scripts load from YAML or JSON, in the
//! same spirit as state-graph definitions:
//!
//! ```yaml
//! entries:
//!   - source: shop
//!     branch_key: Order Placed
//!     detail: { order: { id: order-1 } }
//!     wait_seconds: 2
//!   - source: shop
//!     branch_key: Order Confirmed
//!     detail: { order: { id: order-1 } }
//! ```

use std::time::Duration;

use choreo_types::event::BusEvent;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::event::bus::EventBus;

/// Errors from loading a simulation script.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("failed to parse simulation script: {0}")]
    Parse(String),
}

/// One scripted event plus the pause that follows it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationEntry {
    /// Event source published on the bus.
    pub source: String,
    /// Event discriminator; becomes the bus event's detail-type.
    pub branch_key: String,
    /// Event payload.
    pub detail: Value,
    /// Seconds to pause after publishing this entry.
    #[serde(default)]
    pub wait_seconds: u64,
}

/// An ordered event script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationScript {
    pub entries: Vec<SimulationEntry>,
}

impl SimulationScript {
    pub fn from_yaml(text: &str) -> Result<Self, SimulationError> {
        serde_yaml_ng::from_str(text).map_err(|e| SimulationError::Parse(e.to_string()))
    }

    pub fn from_json(text: &str) -> Result<Self, SimulationError> {
        serde_json::from_str(text).map_err(|e| SimulationError::Parse(e.to_string()))
    }
}

/// Publishes simulation scripts onto an event bus, sequentially.
pub struct SimulationDriver {
    bus: EventBus,
}

impl SimulationDriver {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }

    /// Run the script to completion (or cancellation).
    ///
    /// Returns the number of entries published. Cancellation is honored
    /// during the inter-entry pauses; an entry already published stays
    /// published.
    pub async fn run(&self, script: &SimulationScript, cancel: &CancellationToken) -> usize {
        let mut published = 0;

        for (index, entry) in script.entries.iter().enumerate() {
            if cancel.is_cancelled() {
                break;
            }

            self.bus.publish(BusEvent::new(
                entry.source.clone(),
                entry.branch_key.clone(),
                entry.detail.clone(),
            ));
            published += 1;

            tracing::debug!(
                index,
                source = entry.source.as_str(),
                branch_key = entry.branch_key.as_str(),
                wait_seconds = entry.wait_seconds,
                "published simulation entry"
            );

            if entry.wait_seconds > 0 {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(Duration::from_secs(entry.wait_seconds)) => {}
                }
            }
        }

        published
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
