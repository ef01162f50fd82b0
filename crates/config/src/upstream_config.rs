//! Upstream API configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};

/// Where content is fetched from and how
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UpstreamSettings {
    /// Base URL that request paths are appended to
    pub base_url: String,

    /// Per-request timeout in milliseconds (1-300000)
    pub timeout_ms: u64,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_ms: 10_000,
            user_agent: format!("contentguard/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ConfigSection for UpstreamSettings {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![
            Validator::http_url(&self.base_url, "upstream.base_url"),
            Validator::in_range(self.timeout_ms, 1, 300_000, "upstream.timeout_ms"),
            Validator::not_empty(&self.user_agent, "upstream.user_agent"),
        ])
    }

    fn merge(&mut self, other: Self) {
        self.base_url = other.base_url;
        self.timeout_ms = other.timeout_ms;
        self.user_agent = other.user_agent;
    }

    fn section_name(&self) -> &'static str {
        "upstream"
    }
}
