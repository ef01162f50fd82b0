//! Retry configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};

/// Exponential backoff settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrySettings {
    /// Retries after the first attempt (0-10)
    pub max_retries: u32,

    /// Delay before the first retry, in milliseconds
    pub initial_delay_ms: u64,

    /// Upper bound on any single delay, in milliseconds
    pub max_delay_ms: u64,

    /// Growth factor between consecutive delays (1.0-10.0)
    pub backoff_multiplier: f64,

    /// Randomize each delay by up to 25% either way
    pub jitter: bool,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1000,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl ConfigSection for RetrySettings {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![
            Validator::in_range(self.max_retries, 0, 10, "retry.max_retries"),
            Validator::in_range(self.initial_delay_ms, 1, 600_000, "retry.initial_delay_ms"),
            Validator::at_least(self.max_delay_ms, self.initial_delay_ms, "retry.max_delay_ms"),
            Validator::in_range(
                self.backoff_multiplier,
                1.0,
                10.0,
                "retry.backoff_multiplier",
            ),
        ])
    }

    fn merge(&mut self, other: Self) {
        self.max_retries = other.max_retries;
        self.initial_delay_ms = other.initial_delay_ms;
        self.max_delay_ms = other.max_delay_ms;
        self.backoff_multiplier = other.backoff_multiplier;
        self.jitter = other.jitter;
    }

    fn section_name(&self) -> &'static str {
        "retry"
    }
}
