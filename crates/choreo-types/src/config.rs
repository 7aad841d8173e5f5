//! Global configuration types.
//!
//! Deserialized from `{data_dir}/config.toml` by the infrastructure layer.

use serde::{Deserialize, Serialize};

/// Default capacity of the in-process event bus broadcast channel.
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Global Choreo configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Broadcast channel capacity for the in-process event bus.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Override for the token store database URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
}

fn default_event_channel_capacity() -> usize {
    DEFAULT_EVENT_CHANNEL_CAPACITY
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            database_url: None,
        }
    }
}
