// crates/gateway/src/client.rs
//! Upstream client wrapped in rate limiting, circuit breaking, retry and caching

use crate::error::GatewayResult;
use crate::factory::GuardFactory;
use crate::upstream::Upstream;
use contentguard_cache::{CacheManager, CacheStatistics, Sweeper};
use contentguard_config::Config;
use contentguard_resilience::{
    CircuitBreaker, CircuitStats, Classify, RateLimiter, RetryStrategy,
};
use contentguard_telemetry::EventBuffer;
use futures::future::join_all;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Per-request cache options
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// TTL for the cached response; the client default when `None`
    pub ttl: Option<Duration>,
    /// Keys whose invalidation must also drop this response
    pub dependencies: Vec<String>,
    /// Cache key; the request path when `None`
    pub cache_key: Option<String>,
}

impl FetchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn depends_on(mut self, key: impl Into<String>) -> Self {
        self.dependencies.push(key.into());
        self
    }

    pub fn with_cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }
}

/// Outcome of a [`ResilientClient::warm`] pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarmReport {
    /// Paths fetched and cached by this pass
    pub warmed: Vec<String>,
    /// Paths already cached and left alone
    pub skipped: Vec<String>,
    /// Paths that could not be fetched, with the error message
    pub failed: Vec<(String, String)>,
}

impl WarmReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Client guarding one upstream
///
/// Reads are served from cache when possible. Misses go through the rate
/// limiter and the breaker for the request's endpoint, with retries, and
/// successful responses are cached.
pub struct ResilientClient<U> {
    upstream: Arc<U>,
    factory: GuardFactory,
    cache: CacheManager<Value>,
    limiter: RateLimiter,
    retry: RetryStrategy,
    breakers: Arc<Mutex<HashMap<String, CircuitBreaker>>>,
    default_ttl: Duration,
    warm_paths: Arc<Vec<String>>,
    sweeper: Option<Arc<Sweeper>>,
}

impl<U: Upstream> ResilientClient<U> {
    pub fn new(upstream: U, factory: GuardFactory) -> Self {
        Self {
            upstream: Arc::new(upstream),
            cache: factory.cache(),
            limiter: factory.rate_limiter(),
            retry: factory.retry_strategy(),
            factory,
            breakers: Arc::new(Mutex::new(HashMap::new())),
            default_ttl: DEFAULT_TTL,
            warm_paths: Arc::new(Vec::new()),
            sweeper: None,
        }
    }

    /// Builds a client and its guards from the loaded configuration
    ///
    /// Starts the cache sweeper when `cache.sweep_interval_ms` is non-zero
    /// and a tokio runtime is current.
    pub fn from_config(upstream: U, config: &Config) -> Self {
        let client = Self::new(upstream, GuardFactory::from_config(config))
            .with_default_ttl(Duration::from_millis(config.cache.default_ttl_ms))
            .with_warm_paths(config.cache.warm_paths.clone());

        match config.cache.sweep_interval_ms {
            0 => client,
            ms => client.with_sweeper(Duration::from_millis(ms)),
        }
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Paths fetched by [`ResilientClient::warm_configured`]
    pub fn with_warm_paths(mut self, paths: Vec<String>) -> Self {
        self.warm_paths = Arc::new(paths);
        self
    }

    /// Purges expired entries every `interval` in the background
    ///
    /// Outside a tokio runtime no sweeper is started and expired entries
    /// are only reclaimed on read.
    pub fn with_sweeper(mut self, interval: Duration) -> Self {
        self.sweeper = self.cache.spawn_sweeper(interval).map(Arc::new);
        self
    }

    /// Fetches `path` with default cache options
    pub async fn fetch(&self, path: &str) -> GatewayResult<Value> {
        self.get(path, FetchOptions::default()).await
    }

    /// Fetches `path`, serving from cache when a live entry exists
    pub async fn get(&self, path: &str, options: FetchOptions) -> GatewayResult<Value> {
        let key = options.cache_key.as_deref().unwrap_or(path);
        if let Some(value) = self.cache.get(key) {
            return Ok(value);
        }

        let value = self.fetch_guarded(path).await?;

        let ttl = options.ttl.unwrap_or(self.default_ttl);
        self.cache
            .set_with_dependencies(key, value.clone(), ttl, &options.dependencies);
        Ok(value)
    }

    async fn fetch_guarded(&self, path: &str) -> GatewayResult<Value> {
        let endpoint = endpoint_of(path);
        let breaker = self.breaker(&endpoint);

        self.retry
            .execute(|| self.attempt(path, &endpoint, &breaker))
            .await
            .inspect_err(|e| log::warn!("Fetch of {} failed ({}): {}", path, e.kind(), e))
    }

    async fn attempt(
        &self,
        path: &str,
        endpoint: &str,
        breaker: &CircuitBreaker,
    ) -> GatewayResult<Value> {
        self.limiter.check_limit(endpoint)?;
        breaker.check()?;

        match self.upstream.fetch(path).await {
            Ok(value) => {
                breaker.record_success();
                Ok(value)
            }
            Err(e) => {
                if e.kind().trips_breaker() {
                    breaker.record_failure();
                }
                Err(e)
            }
        }
    }

    /// Breaker for `endpoint`, created on first use
    pub fn breaker(&self, endpoint: &str) -> CircuitBreaker {
        lock(&self.breakers)
            .entry(endpoint.to_string())
            .or_insert_with(|| self.factory.circuit_breaker(endpoint))
            .clone()
    }

    /// Fetches every path not already cached
    ///
    /// Fetches run concurrently and failures are collected, not returned.
    pub async fn warm<I, S>(&self, paths: I) -> WarmReport
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut report = WarmReport::default();
        let mut pending = Vec::new();

        for path in paths.into_iter().map(Into::into) {
            if self.cache.contains(&path) {
                report.skipped.push(path);
            } else {
                pending.push(path);
            }
        }

        let results = join_all(pending.iter().map(|path| self.fetch(path))).await;
        for (path, result) in pending.into_iter().zip(results) {
            match result {
                Ok(_) => report.warmed.push(path),
                Err(e) => report.failed.push((path, e.to_string())),
            }
        }

        log::info!(
            "Cache warm: {} warmed, {} skipped, {} failed",
            report.warmed.len(),
            report.skipped.len(),
            report.failed.len()
        );
        report
    }

    /// Warms the paths given by [`ResilientClient::with_warm_paths`]
    pub async fn warm_configured(&self) -> WarmReport {
        let paths = self.warm_paths.as_ref().clone();
        self.warm(paths).await
    }
}

impl<U> ResilientClient<U> {
    pub fn cache_stats(&self) -> CacheStatistics {
        self.cache.stats()
    }

    /// One-line summary of [`ResilientClient::cache_stats`]
    pub fn cache_stats_display(&self) -> String {
        self.cache.stats().display().to_string()
    }

    /// Clears all entries, or those whose key contains `pattern`
    pub fn clear_cache(&self, pattern: Option<&str>) -> usize {
        let removed = self.cache.clear(pattern);
        log::info!("Cleared {} cache entries", removed);
        removed
    }

    /// Drops `key` and everything depending on it
    pub fn invalidate(&self, key: &str) -> bool {
        self.cache.delete(key)
    }

    /// Snapshot of every breaker created so far, sorted by endpoint
    pub fn breaker_states(&self) -> Vec<(String, CircuitStats)> {
        let mut states: Vec<_> = lock(&self.breakers)
            .iter()
            .map(|(endpoint, breaker)| (endpoint.clone(), breaker.stats()))
            .collect();
        states.sort_by(|a, b| a.0.cmp(&b.0));
        states
    }

    /// Forces every breaker closed
    pub fn reset_breakers(&self) {
        for breaker in lock(&self.breakers).values() {
            breaker.reset();
        }
    }

    pub fn cache(&self) -> &CacheManager<Value> {
        &self.cache
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Recent telemetry events, when buffered
    pub fn events(&self) -> Option<&Arc<EventBuffer>> {
        self.factory.events()
    }
}

impl<U> Clone for ResilientClient<U> {
    fn clone(&self) -> Self {
        Self {
            upstream: Arc::clone(&self.upstream),
            factory: self.factory.clone(),
            cache: self.cache.clone(),
            limiter: self.limiter.clone(),
            retry: self.retry.clone(),
            breakers: Arc::clone(&self.breakers),
            default_ttl: self.default_ttl,
            warm_paths: Arc::clone(&self.warm_paths),
            sweeper: self.sweeper.clone(),
        }
    }
}

/// Endpoint a path belongs to: the path without query string or trailing slash
pub fn endpoint_of(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
