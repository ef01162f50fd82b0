// crates/telemetry/src/event.rs
//! Telemetry event shape

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Event type names emitted by the core components
pub mod event_types {
    pub const CIRCUIT_STATE_CHANGE: &str = "circuit_state_change";
    pub const CIRCUIT_FAILURE: &str = "circuit_failure";
    pub const CIRCUIT_SUCCESS: &str = "circuit_success";
    pub const RETRY_ATTEMPT: &str = "retry_attempt";
    pub const RETRY_EXHAUSTED: &str = "retry_exhausted";
    pub const RATE_LIMIT_EXCEEDED: &str = "rate_limit_exceeded";
    pub const RATE_LIMIT_RESET: &str = "rate_limit_reset";
    pub const CACHE_HIT: &str = "cache_hit";
    pub const CACHE_MISS: &str = "cache_miss";
    pub const CACHE_CASCADE: &str = "cache_cascade";
}

/// Component family an event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    CircuitBreaker,
    Retry,
    RateLimit,
    Cache,
}

impl EventCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::CircuitBreaker => "circuit_breaker",
            EventCategory::Retry => "retry",
            EventCategory::RateLimit => "rate_limit",
            EventCategory::Cache => "cache",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single telemetry event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    /// Event type, one of [`event_types`] for core events
    #[serde(rename = "type")]
    pub event_type: String,
    pub category: EventCategory,
    /// Arbitrary structured payload
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl TelemetryEvent {
    /// Creates an event stamped with the current time
    pub fn new(
        event_type: impl Into<String>,
        category: EventCategory,
        data: serde_json::Value,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            category,
            data,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_type_field() {
        let event = TelemetryEvent::new(
            event_types::RETRY_ATTEMPT,
            EventCategory::Retry,
            serde_json::json!({ "attempt": 1 }),
        );

        let json = serde_json::to_value(&event).expect("event should serialize");
        assert_eq!(json["type"], "retry_attempt");
        assert_eq!(json["category"], "retry");
        assert_eq!(json["data"]["attempt"], 1);
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_category_display() {
        assert_eq!(EventCategory::CircuitBreaker.to_string(), "circuit_breaker");
        assert_eq!(EventCategory::RateLimit.to_string(), "rate_limit");
    }
}
