// crates/resilience/src/lib.rs
//! Resilience patterns for calls to an unreliable upstream
//!
//! This module provides:
//! - Circuit breaker with half-open probing and transition listeners
//! - Retry strategy with error classification and exponential backoff
//! - Per-key sliding-window rate limiting
//!
//! All checks are synchronous and never await; only
//! [`RetryStrategy::execute`] suspends, while it waits out a backoff delay.
//!
//! # Example
//!
//! ```rust
//! use contentguard_resilience::{CircuitBreaker, CircuitBreakerConfig, RetryConfig, RetryStrategy};
//! use std::time::Duration;
//!
//! // Retry with exponential backoff
//! let retry = RetryStrategy::new(
//!     RetryConfig::new(3).with_initial_delay(Duration::from_millis(100)),
//! );
//!
//! // Circuit breaker
//! let cb_config = CircuitBreakerConfig::new(5, Duration::from_secs(60));
//! let cb = CircuitBreaker::named("posts", cb_config);
//! assert!(!cb.is_open());
//! ```

mod circuit_breaker;
mod classify;
mod error;
mod rate_limiter;
mod retry;

pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitState, CircuitStats, StateListener,
    StateTransition,
};
pub use classify::{Classify, ErrorKind};
pub use error::{ResilienceError, ResilienceResult};
pub use rate_limiter::{RateLimiter, DEFAULT_KEY};
pub use retry::{RetryConfig, RetryStrategy};
