// crates/gateway/src/factory.rs
//! Builds isolated resilience components that share one telemetry emitter

use crate::settings;
use contentguard_cache::CacheManager;
use contentguard_config::Config;
use contentguard_resilience::{
    CircuitBreaker, CircuitBreakerConfig, RateLimiter, RetryConfig, RetryStrategy,
};
use contentguard_telemetry::{Emitter, EventBuffer};
use std::sync::Arc;
use std::time::Duration;

/// Factory for per-client and per-endpoint guards
///
/// Every call returns a fresh instance; nothing is shared between two
/// breakers or two limiters except the emitter.
#[derive(Debug, Clone)]
pub struct GuardFactory {
    breaker_config: CircuitBreakerConfig,
    retry_config: RetryConfig,
    max_requests: usize,
    window: Duration,
    emitter: Emitter,
    events: Option<Arc<EventBuffer>>,
}

impl GuardFactory {
    pub fn new(
        breaker_config: CircuitBreakerConfig,
        retry_config: RetryConfig,
        max_requests: usize,
        window: Duration,
    ) -> Self {
        Self {
            breaker_config,
            retry_config,
            max_requests,
            window,
            emitter: Emitter::disabled(),
            events: None,
        }
    }

    /// Builds a factory from the loaded configuration
    pub fn from_config(config: &Config) -> Self {
        let (max_requests, window) = settings::rate_limit(&config.rate_limit);
        let (emitter, events) = settings::telemetry(&config.telemetry);

        Self {
            breaker_config: settings::breaker_config(&config.circuit_breaker),
            retry_config: settings::retry_config(&config.retry),
            max_requests,
            window,
            emitter,
            events,
        }
    }

    /// Publishes through `emitter` instead of the configured one
    pub fn with_telemetry(mut self, emitter: Emitter) -> Self {
        self.emitter = emitter;
        self.events = None;
        self
    }

    /// Keeps `buffer` as the queryable event store and publishes into it
    pub fn with_event_buffer(mut self, buffer: Arc<EventBuffer>) -> Self {
        self.emitter = Emitter::new(buffer.clone());
        self.events = Some(buffer);
        self
    }

    /// Breaker guarding `endpoint`
    pub fn circuit_breaker(&self, endpoint: &str) -> CircuitBreaker {
        CircuitBreaker::named(endpoint, self.breaker_config.clone())
            .with_telemetry(self.emitter.clone())
    }

    pub fn rate_limiter(&self) -> RateLimiter {
        RateLimiter::new(self.max_requests, self.window).with_telemetry(self.emitter.clone())
    }

    pub fn retry_strategy(&self) -> RetryStrategy {
        RetryStrategy::new(self.retry_config.clone()).with_telemetry(self.emitter.clone())
    }

    pub fn cache<T>(&self) -> CacheManager<T> {
        CacheManager::new().with_telemetry(self.emitter.clone())
    }

    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    /// Buffer holding recent events, when telemetry is buffered
    pub fn events(&self) -> Option<&Arc<EventBuffer>> {
        self.events.as_ref()
    }
}

impl Default for GuardFactory {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
