// crates/gateway/src/settings.rs
//! Conversions from config sections to component configs

use contentguard_config::{
    CircuitBreakerSettings, RateLimitSettings, RetrySettings, TelemetrySettings,
};
use contentguard_resilience::{CircuitBreakerConfig, RetryConfig};
use contentguard_telemetry::{Emitter, EventBuffer, LogSink, TelemetrySink};
use std::sync::Arc;
use std::time::Duration;

pub fn breaker_config(settings: &CircuitBreakerSettings) -> CircuitBreakerConfig {
    CircuitBreakerConfig::new(
        settings.failure_threshold as usize,
        Duration::from_millis(settings.recovery_timeout_ms),
    )
    .with_success_threshold(settings.success_threshold as usize)
}

pub fn retry_config(settings: &RetrySettings) -> RetryConfig {
    RetryConfig::new(settings.max_retries)
        .with_initial_delay(Duration::from_millis(settings.initial_delay_ms))
        .with_max_delay(Duration::from_millis(settings.max_delay_ms))
        .with_multiplier(settings.backoff_multiplier)
        .with_jitter(settings.jitter)
}

/// `(max_requests, window)` for the rate limiter
pub fn rate_limit(settings: &RateLimitSettings) -> (usize, Duration) {
    (
        settings.max_requests as usize,
        Duration::from_millis(settings.window_ms),
    )
}

/// Builds the shared emitter and the in-memory buffer behind it
///
/// Returns a disabled emitter and no buffer when telemetry is off.
pub fn telemetry(settings: &TelemetrySettings) -> (Emitter, Option<Arc<EventBuffer>>) {
    if !settings.enabled {
        return (Emitter::disabled(), None);
    }

    let buffer = Arc::new(EventBuffer::new(settings.buffer_capacity));
    let mut sinks: Vec<Arc<dyn TelemetrySink>> = vec![buffer.clone()];
    if settings.log_events {
        sinks.push(Arc::new(LogSink::with_target("contentguard::telemetry")));
    }

    (Emitter::fanout(sinks), Some(buffer))
}
