// crates/resilience/src/retry.rs
//! Retry strategy with exponential backoff

use crate::classify::{Classify, ErrorKind};
use contentguard_telemetry::{event_types, Emitter, EventCategory};
use serde_json::json;
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Retry configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt; 0 disables retrying
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound for the un-jittered delay
    pub max_delay: Duration,
    /// Growth factor applied per attempt
    pub backoff_multiplier: f64,
    /// Randomize delays to desynchronize concurrent callers
    pub jitter: bool,
}

impl RetryConfig {
    /// Creates a configuration with `max_retries` and default timings
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Sets the initial delay
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Sets whether to use jitter
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

/// Classifies failures and drives retries of a single logical operation
#[derive(Debug, Clone, Default)]
pub struct RetryStrategy {
    config: RetryConfig,
    emitter: Emitter,
}

impl RetryStrategy {
    /// Creates a new retry strategy
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            emitter: Emitter::disabled(),
        }
    }

    /// Publishes retry events through `emitter`
    pub fn with_telemetry(mut self, emitter: Emitter) -> Self {
        self.emitter = emitter;
        self
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Whether a failure at zero-based `attempt` should be retried
    pub fn should_retry<E: Classify>(&self, error: &E, attempt: u32) -> bool {
        attempt < self.config.max_retries && error.kind().is_retryable()
    }

    /// Delay to wait after the failure at zero-based `attempt`
    ///
    /// Without jitter this is exactly
    /// `min(initial_delay * multiplier^attempt, max_delay)`. With jitter the
    /// result is scaled by a random factor in `[0.75, 1.25)`.
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        let max_nanos = self.config.max_delay.as_nanos() as f64;
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let base = self.config.initial_delay.as_nanos() as f64
            * self.config.backoff_multiplier.powi(exponent);

        let capped = if base.is_finite() {
            base.clamp(0.0, max_nanos)
        } else {
            max_nanos
        };

        let delay = if self.config.jitter {
            capped * (0.75 + fastrand::f64() * 0.5)
        } else {
            capped
        };

        Duration::from_nanos(delay.round() as u64)
    }

    /// Runs `operation`, retrying retryable failures with backoff
    ///
    /// The last error is returned unchanged once it is not retryable or the
    /// retries are used up. Dropping the returned future cancels any
    /// pending backoff timer.
    pub async fn execute<F, Fut, T, E>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + fmt::Display,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    let kind = error.kind();
                    if !self.should_retry(&error, attempt) {
                        if kind.is_retryable() && self.config.max_retries > 0 {
                            self.report_exhausted(attempt, kind, &error);
                        }
                        return Err(error);
                    }

                    let delay = self.retry_delay(attempt);
                    log::debug!(
                        "Attempt {} failed ({}), retrying in {:?}: {}",
                        attempt + 1,
                        kind,
                        delay,
                        error
                    );
                    self.emitter.emit(
                        event_types::RETRY_ATTEMPT,
                        EventCategory::Retry,
                        json!({
                            "attempt": attempt + 1,
                            "delay_ms": delay.as_millis() as u64,
                            "kind": kind.as_str(),
                            "error": error.to_string(),
                        }),
                    );

                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    fn report_exhausted<E: fmt::Display>(&self, attempt: u32, kind: ErrorKind, error: &E) {
        log::warn!(
            "Giving up after {} attempts ({}): {}",
            attempt + 1,
            kind,
            error
        );
        self.emitter.emit(
            event_types::RETRY_EXHAUSTED,
            EventCategory::Retry,
            json!({
                "attempts": attempt + 1,
                "kind": kind.as_str(),
                "error": error.to_string(),
            }),
        );
    }
}
