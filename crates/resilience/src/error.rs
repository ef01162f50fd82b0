// crates/resilience/src/error.rs
//! Error types for resilience operations

use crate::classify::{Classify, ErrorKind};
use std::time::Duration;
use thiserror::Error;

/// Result type for resilience operations
pub type ResilienceResult<T> = Result<T, ResilienceError>;

/// Errors raised locally by the resilience components
#[derive(Debug, Clone, Error)]
pub enum ResilienceError {
    /// Circuit breaker is open; no request was made
    #[error("Circuit breaker '{endpoint}' is open (failures: {failures}, retry after {retry_after:?})")]
    CircuitOpen {
        endpoint: String,
        failures: usize,
        retry_after: Duration,
    },

    /// Local rate limit exceeded
    #[error("Rate limit exceeded for '{key}' (limit: {limit} per {window:?}, retry after {retry_after:?})")]
    RateLimitExceeded {
        key: String,
        limit: usize,
        window: Duration,
        retry_after: Duration,
    },

    /// An operation failed with a known category
    #[error("Operation failed ({kind}): {message}")]
    Failed { kind: ErrorKind, message: String },
}

impl ResilienceError {
    /// Time the caller should wait before trying again, if known
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ResilienceError::CircuitOpen { retry_after, .. }
            | ResilienceError::RateLimitExceeded { retry_after, .. } => Some(*retry_after),
            ResilienceError::Failed { .. } => None,
        }
    }
}

impl Classify for ResilienceError {
    fn kind(&self) -> ErrorKind {
        match self {
            ResilienceError::CircuitOpen { .. } => ErrorKind::CircuitOpen,
            ResilienceError::RateLimitExceeded { .. } => ErrorKind::RateLimit,
            ResilienceError::Failed { kind, .. } => *kind,
        }
    }
}
