//! Rate limit configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};

/// Sliding window limits, applied per endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RateLimitSettings {
    /// Requests admitted per window. Zero rejects everything.
    pub max_requests: u32,

    /// Window length in milliseconds
    pub window_ms: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_ms: 60_000,
        }
    }
}

impl ConfigSection for RateLimitSettings {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![
            Validator::in_range(self.max_requests, 0, 100_000, "rate_limit.max_requests"),
            Validator::in_range(self.window_ms, 1, 3_600_000, "rate_limit.window_ms"),
        ])
    }

    fn merge(&mut self, other: Self) {
        self.max_requests = other.max_requests;
        self.window_ms = other.window_ms;
    }

    fn section_name(&self) -> &'static str {
        "rate_limit"
    }
}
