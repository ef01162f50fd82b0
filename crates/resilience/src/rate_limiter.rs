// crates/resilience/src/rate_limiter.rs
//! Sliding-window rate limiting

use crate::error::{ResilienceError, ResilienceResult};
use contentguard_telemetry::{event_types, Emitter, EventCategory};
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Key used by [`RateLimiter::check_default`]
pub const DEFAULT_KEY: &str = "default";

/// Per-key sliding-window rate limiter
///
/// Each key keeps the timestamps of its admitted requests within the
/// trailing window. Keys are fully independent.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    windows: Arc<Mutex<HashMap<String, VecDeque<Instant>>>>,
    emitter: Emitter,
}

impl RateLimiter {
    /// Creates a new rate limiter
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Arc::new(Mutex::new(HashMap::new())),
            emitter: Emitter::disabled(),
        }
    }

    /// Publishes rejection and reset events through `emitter`
    pub fn with_telemetry(mut self, emitter: Emitter) -> Self {
        self.emitter = emitter;
        self
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, VecDeque<Instant>>> {
        self.windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Admits a request for `key` or rejects it with a retry-after hint
    pub fn check_limit(&self, key: &str) -> ResilienceResult<()> {
        let now = Instant::now();
        let mut windows = self.lock();
        let requests = windows.entry(key.to_string()).or_default();
        prune(requests, now, self.window);

        if requests.len() < self.max_requests {
            requests.push_back(now);
            return Ok(());
        }

        let retry_after = requests
            .front()
            .map(|oldest| (*oldest + self.window).saturating_duration_since(now))
            .unwrap_or(self.window);
        drop(windows);

        log::warn!(
            "Rate limit exceeded for '{}' ({} per {:?})",
            key,
            self.max_requests,
            self.window
        );
        self.emitter.emit(
            event_types::RATE_LIMIT_EXCEEDED,
            EventCategory::RateLimit,
            json!({
                "key": key,
                "limit": self.max_requests,
                "window_ms": self.window.as_millis() as u64,
                "retry_after_ms": retry_after.as_millis() as u64,
            }),
        );

        Err(ResilienceError::RateLimitExceeded {
            key: key.to_string(),
            limit: self.max_requests,
            window: self.window,
            retry_after,
        })
    }

    /// Checks the limit for the shared `"default"` key
    pub fn check_default(&self) -> ResilienceResult<()> {
        self.check_limit(DEFAULT_KEY)
    }

    /// Number of requests `key` may still issue in the current window
    pub fn remaining(&self, key: &str) -> usize {
        let now = Instant::now();
        let mut windows = self.lock();
        match windows.get_mut(key) {
            Some(requests) => {
                prune(requests, now, self.window);
                self.max_requests.saturating_sub(requests.len())
            }
            None => self.max_requests,
        }
    }

    /// Forgets every recorded request for `key`
    pub fn reset(&self, key: &str) {
        let removed = self.lock().remove(key).is_some();
        if removed {
            log::debug!("Rate limit window reset for '{}'", key);
            self.emitter.emit(
                event_types::RATE_LIMIT_RESET,
                EventCategory::RateLimit,
                json!({ "key": key }),
            );
        }
    }

    /// Drops keys whose windows hold no live requests
    ///
    /// Returns the number of keys removed.
    pub fn prune_idle(&self) -> usize {
        let now = Instant::now();
        let mut windows = self.lock();
        let before = windows.len();
        windows.retain(|_, requests| {
            prune(requests, now, self.window);
            !requests.is_empty()
        });
        before - windows.len()
    }

    /// Number of keys currently tracked
    pub fn tracked_keys(&self) -> usize {
        self.lock().len()
    }

    /// Gets the maximum number of requests allowed
    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    /// Gets the time window
    pub fn window(&self) -> Duration {
        self.window
    }
}

/// Drops timestamps that are no longer inside `(now - window, now]`
fn prune(requests: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&oldest) = requests.front() {
        if now.duration_since(oldest) >= window {
            requests.pop_front();
        } else {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contentguard_telemetry::EventBuffer;

    #[test]
    fn test_rate_limiter_allows_within_limit() {
        let limiter = RateLimiter::new(5, Duration::from_secs(1));

        for _ in 0..5 {
            assert!(limiter.check_default().is_ok());
        }
    }

    #[test]
    fn test_rate_limiter_blocks_over_limit() {
        let limiter = RateLimiter::new(3, Duration::from_secs(1));

        for _ in 0..3 {
            assert!(limiter.check_default().is_ok());
        }

        let result = limiter.check_default();
        match result {
            Err(ResilienceError::RateLimitExceeded {
                key,
                limit,
                retry_after,
                ..
            }) => {
                assert_eq!(key, DEFAULT_KEY);
                assert_eq!(limit, 3);
                assert!(retry_after <= Duration::from_secs(1));
                assert!(retry_after > Duration::from_millis(500));
            }
            other => panic!("Expected RateLimitExceeded, got {:?}", other),
        }
    }

    #[test]
    fn test_rate_limiter_slides_after_window() {
        let limiter = RateLimiter::new(2, Duration::from_millis(50));

        assert!(limiter.check_default().is_ok());
        assert!(limiter.check_default().is_ok());
        assert!(limiter.check_default().is_err());

        std::thread::sleep(Duration::from_millis(60));

        assert!(limiter.check_default().is_ok());
    }

    #[test]
    fn test_zero_max_requests_always_fails() {
        let limiter = RateLimiter::new(0, Duration::from_secs(1));

        for _ in 0..3 {
            let err = limiter.check_default().expect_err("limit of zero must reject");
            assert_eq!(err.retry_after(), Some(Duration::from_secs(1)));
        }
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(10));

        assert!(limiter.check_limit("posts").is_ok());
        assert!(limiter.check_limit("posts").is_err());
        assert!(limiter.check_limit("categories").is_ok());
        assert_eq!(limiter.remaining("posts"), 0);
        assert_eq!(limiter.remaining("tags"), 1);
    }

    #[test]
    fn test_reset_restores_quota() {
        let buffer = Arc::new(EventBuffer::new(8));
        let limiter =
            RateLimiter::new(1, Duration::from_secs(10)).with_telemetry(Emitter::new(buffer.clone()));

        assert!(limiter.check_limit("posts").is_ok());
        assert!(limiter.check_limit("posts").is_err());
        limiter.reset("posts");
        assert!(limiter.check_limit("posts").is_ok());

        assert_eq!(buffer.by_type(event_types::RATE_LIMIT_EXCEEDED).len(), 1);
        assert_eq!(buffer.by_type(event_types::RATE_LIMIT_RESET).len(), 1);
    }

    #[test]
    fn test_prune_idle_drops_empty_windows() {
        let limiter = RateLimiter::new(5, Duration::from_millis(30));
        limiter.check_limit("a").expect("first request admitted");
        limiter.check_limit("b").expect("first request admitted");
        assert_eq!(limiter.tracked_keys(), 2);

        std::thread::sleep(Duration::from_millis(40));

        assert_eq!(limiter.prune_idle(), 2);
        assert_eq!(limiter.tracked_keys(), 0);
    }

    #[test]
    fn test_rate_limiter_config() {
        let limiter = RateLimiter::new(100, Duration::from_secs(60));
        assert_eq!(limiter.max_requests(), 100);
        assert_eq!(limiter.window(), Duration::from_secs(60));
    }
}
