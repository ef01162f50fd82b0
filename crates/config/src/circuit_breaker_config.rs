//! Circuit breaker configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};

/// Thresholds applied to every per-endpoint breaker
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CircuitBreakerSettings {
    /// Failures that open a closed circuit
    pub failure_threshold: u32,

    /// How long an open circuit rejects calls, in milliseconds
    pub recovery_timeout_ms: u64,

    /// Successful half-open trial requests needed to close again
    pub success_threshold: u32,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout_ms: 60_000,
            success_threshold: 2,
        }
    }
}

impl ConfigSection for CircuitBreakerSettings {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![
            Validator::in_range(
                self.failure_threshold,
                1,
                1000,
                "circuit_breaker.failure_threshold",
            ),
            Validator::in_range(
                self.recovery_timeout_ms,
                1,
                3_600_000,
                "circuit_breaker.recovery_timeout_ms",
            ),
            Validator::in_range(
                self.success_threshold,
                1,
                100,
                "circuit_breaker.success_threshold",
            ),
        ])
    }

    fn merge(&mut self, other: Self) {
        self.failure_threshold = other.failure_threshold;
        self.recovery_timeout_ms = other.recovery_timeout_ms;
        self.success_threshold = other.success_threshold;
    }

    fn section_name(&self) -> &'static str {
        "circuit_breaker"
    }
}
