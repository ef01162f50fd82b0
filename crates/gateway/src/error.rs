// crates/gateway/src/error.rs
//! Error types for gateway operations

use contentguard_resilience::{Classify, ErrorKind, ResilienceError};
use std::time::Duration;
use thiserror::Error;

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors that can occur while fetching through the gateway
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP transport error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("Upstream returned HTTP {status} for {endpoint}")]
    Status { status: u16, endpoint: String },

    /// Upstream could not be reached
    #[error("Could not reach upstream for {endpoint}: {message}")]
    Unreachable { endpoint: String, message: String },

    /// Upstream did not answer in time
    #[error("Request to {endpoint} timed out after {after:?}")]
    Timeout { endpoint: String, after: Duration },

    /// Response body was not valid JSON
    #[error("Could not decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    /// Rejected locally by a circuit breaker or rate limiter
    #[error(transparent)]
    Resilience(#[from] ResilienceError),

    /// Base URL or path could not be turned into a request URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl GatewayError {
    /// HTTP status, if the upstream answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Status { status, .. } => Some(*status),
            GatewayError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Time to wait before retrying, when a local guard rejected the call
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            GatewayError::Resilience(e) => e.retry_after(),
            _ => None,
        }
    }
}

impl Classify for GatewayError {
    fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::Http(e) => {
                if e.is_timeout() {
                    ErrorKind::Timeout
                } else if let Some(status) = e.status() {
                    ErrorKind::from_status(status.as_u16())
                } else if e.is_decode() || e.is_builder() {
                    ErrorKind::Unknown
                } else {
                    ErrorKind::Network
                }
            }
            GatewayError::Status { status, .. } => ErrorKind::from_status(*status),
            GatewayError::Unreachable { .. } => ErrorKind::Network,
            GatewayError::Timeout { .. } => ErrorKind::Timeout,
            GatewayError::Decode { .. } | GatewayError::InvalidUrl(_) => ErrorKind::Unknown,
            GatewayError::Resilience(e) => e.kind(),
        }
    }
}
