//! Telemetry configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TelemetrySettings {
    /// Emit resilience and cache events at all
    pub enabled: bool,

    /// Events kept in memory before the oldest are dropped
    pub buffer_capacity: usize,

    /// Also forward every event to the log
    pub log_events: bool,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            buffer_capacity: 1000,
            log_events: false,
        }
    }
}

impl ConfigSection for TelemetrySettings {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![Validator::in_range(
            self.buffer_capacity,
            0,
            100_000,
            "telemetry.buffer_capacity",
        )])
    }

    fn merge(&mut self, other: Self) {
        self.enabled = other.enabled;
        self.buffer_capacity = other.buffer_capacity;
        self.log_events = other.log_events;
    }

    fn section_name(&self) -> &'static str {
        "telemetry"
    }
}
