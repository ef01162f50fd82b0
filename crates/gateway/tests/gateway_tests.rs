// crates/gateway/tests/gateway_tests.rs
//! Integration tests for the resilient client against a scripted upstream

use contentguard_config::Config;
use contentguard_gateway::{
    FetchOptions, GatewayError, GatewayResult, GuardFactory, ResilientClient, Upstream,
};
use contentguard_resilience::{
    CircuitBreakerConfig, CircuitState, Classify, ErrorKind, RetryConfig,
};
use contentguard_telemetry::{event_types, EventBuffer};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Upstream answering from per-path scripts, then with a fallback
#[derive(Clone, Default)]
struct ScriptedUpstream {
    scripts: Arc<Mutex<HashMap<String, VecDeque<GatewayResult<Value>>>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedUpstream {
    fn respond(&self, path: &str, response: GatewayResult<Value>) -> &Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(response);
        self
    }

    fn calls(&self, path: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|p| *p == path).count()
    }
}

impl Upstream for ScriptedUpstream {
    async fn fetch(&self, path: &str) -> GatewayResult<Value> {
        self.calls.lock().unwrap().push(path.to_string());
        let next = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(path)
            .and_then(|queue| queue.pop_front());
        next.unwrap_or_else(|| Ok(json!({ "path": path })))
    }
}

fn status(code: u16, path: &str) -> GatewayResult<Value> {
    Err(GatewayError::Status {
        status: code,
        endpoint: path.to_string(),
    })
}

fn factory(failure_threshold: usize, max_retries: u32, max_requests: usize) -> GuardFactory {
    let _ = env_logger::builder().is_test(true).try_init();
    GuardFactory::new(
        CircuitBreakerConfig::new(failure_threshold, Duration::from_secs(30)),
        RetryConfig::new(max_retries)
            .with_initial_delay(Duration::from_millis(100))
            .with_jitter(false),
        max_requests,
        Duration::from_secs(60),
    )
}

#[tokio::test(start_paused = true)]
async fn test_repeated_reads_served_from_cache() {
    let upstream = ScriptedUpstream::default();
    let client = ResilientClient::new(upstream.clone(), factory(5, 3, 100));

    for _ in 0..5 {
        let value = client.fetch("/posts").await.expect("Fetch should succeed");
        assert_eq!(value, json!({ "path": "/posts" }));
    }

    assert_eq!(upstream.calls("/posts"), 1);
    let stats = client.cache_stats();
    assert_eq!(stats.counters.hits, 4);
    assert_eq!(stats.counters.misses, 1);
    assert_eq!(stats.hit_rate, 80.0);
}

#[tokio::test(start_paused = true)]
async fn test_server_errors_retried_then_cached() {
    let upstream = ScriptedUpstream::default();
    upstream
        .respond("/posts", status(503, "/posts"))
        .respond("/posts", status(502, "/posts"));
    let client = ResilientClient::new(upstream.clone(), factory(5, 3, 100));

    let value = client.fetch("/posts").await.expect("Third attempt succeeds");
    assert_eq!(value["path"], "/posts");
    assert_eq!(upstream.calls("/posts"), 3);

    // Two failures then a success: decrement-on-success leaves one
    let states = client.breaker_states();
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].0, "/posts");
    assert_eq!(states[0].1.state, CircuitState::Closed);
    assert_eq!(states[0].1.failure_count, 1);
}

#[tokio::test(start_paused = true)]
async fn test_client_errors_not_retried() {
    let upstream = ScriptedUpstream::default();
    upstream.respond("/posts/404", status(404, "/posts/404"));
    let client = ResilientClient::new(upstream.clone(), factory(1, 3, 100));

    let err = client.fetch("/posts/404").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Client);
    assert_eq!(err.status(), Some(404));
    assert_eq!(upstream.calls("/posts/404"), 1);

    // A client error never trips the breaker, even at threshold 1
    assert_eq!(client.breaker("/posts/404").state(), CircuitState::Closed);
    assert!(client.cache().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_open_circuit_skips_upstream() {
    let upstream = ScriptedUpstream::default();
    for _ in 0..2 {
        upstream.respond("/feed", status(500, "/feed"));
    }
    let client = ResilientClient::new(upstream.clone(), factory(2, 3, 100));

    let err = client.fetch("/feed").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CircuitOpen);
    assert!(err.retry_after().is_some());
    assert_eq!(upstream.calls("/feed"), 2);

    let err = client.fetch("/feed").await.unwrap_err();
    assert!(matches!(err, GatewayError::Resilience(_)));
    assert_eq!(upstream.calls("/feed"), 2);

    // Other endpoints are unaffected
    assert!(client.fetch("/authors").await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_upstream_429_does_not_trip_breaker() {
    let upstream = ScriptedUpstream::default();
    for _ in 0..3 {
        upstream.respond("/search", status(429, "/search"));
    }
    let client = ResilientClient::new(upstream.clone(), factory(1, 2, 100));

    let err = client.fetch("/search").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RateLimit);
    assert_eq!(upstream.calls("/search"), 3);
    assert_eq!(client.breaker("/search").state(), CircuitState::Closed);
    assert_eq!(client.breaker("/search").stats().failure_count, 0);
}

#[tokio::test(start_paused = true)]
async fn test_local_rate_limit_per_endpoint() {
    let upstream = ScriptedUpstream::default();
    let client = ResilientClient::new(upstream.clone(), factory(5, 0, 2));

    assert!(client.fetch("/posts?page=1").await.is_ok());
    assert!(client.fetch("/posts?page=2").await.is_ok());

    let err = client.fetch("/posts?page=3").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RateLimit);
    assert_eq!(upstream.calls("/posts?page=3"), 0);

    assert!(client.fetch("/authors").await.is_ok());
    assert_eq!(client.rate_limiter().remaining("/posts"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_dependencies_invalidate_responses() {
    let upstream = ScriptedUpstream::default();
    let client = ResilientClient::new(upstream.clone(), factory(5, 0, 100));

    client
        .get(
            "/posts?category=rust",
            FetchOptions::new()
                .with_cache_key("posts:rust")
                .depends_on("category:rust"),
        )
        .await
        .expect("Fetch should succeed");
    client
        .get(
            "/",
            FetchOptions::new()
                .with_cache_key("homepage")
                .depends_on("posts:rust"),
        )
        .await
        .expect("Fetch should succeed");

    assert_eq!(client.cache().len(), 2);
    // A dependency-only key still cascades
    assert!(client.invalidate("category:rust"));
    assert!(client.cache().is_empty());

    client
        .get("/posts?category=rust", FetchOptions::new().with_cache_key("posts:rust"))
        .await
        .expect("Refetch should succeed");
    assert_eq!(upstream.calls("/posts?category=rust"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_ttl_expiry_refetches() {
    let upstream = ScriptedUpstream::default();
    let client = ResilientClient::new(upstream.clone(), factory(5, 0, 100));
    let options = FetchOptions::new().with_ttl(Duration::from_millis(30));

    client.get("/posts", options.clone()).await.unwrap();
    // Cache entries age on the wall clock, not the paused tokio clock
    std::thread::sleep(Duration::from_millis(40));
    client.get("/posts", options).await.unwrap();

    assert_eq!(upstream.calls("/posts"), 2);
    assert_eq!(client.cache_stats().counters.expirations, 1);
}

#[tokio::test(start_paused = true)]
async fn test_warm_reports_each_path() {
    let upstream = ScriptedUpstream::default();
    upstream.respond("/broken", status(400, "/broken"));
    let client = ResilientClient::new(upstream.clone(), factory(5, 0, 100));
    client.fetch("/posts").await.unwrap();

    let report = client.warm(["/posts", "/authors", "/broken"]).await;

    assert_eq!(report.skipped, vec!["/posts"]);
    assert_eq!(report.warmed, vec!["/authors"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "/broken");
    assert!(!report.is_complete());
    assert!(client.cache().contains("/authors"));
}

#[tokio::test(start_paused = true)]
async fn test_clear_cache_by_pattern() {
    let upstream = ScriptedUpstream::default();
    let client = ResilientClient::new(upstream, factory(5, 0, 100));
    client.fetch("/posts/1").await.unwrap();
    client.fetch("/posts/2").await.unwrap();
    client.fetch("/authors/1").await.unwrap();

    assert_eq!(client.clear_cache(Some("/posts/")), 2);
    assert_eq!(client.cache().keys(), vec!["/authors/1"]);
    assert_eq!(client.clear_cache(None), 1);
    assert!(client.cache_stats_display().contains("0 entries"));
}

#[tokio::test(start_paused = true)]
async fn test_configured_client_records_events() {
    let mut config = Config::default();
    config.retry.initial_delay_ms = 10;
    config.retry.jitter = false;
    config.cache.sweep_interval_ms = 0;
    config.cache.warm_paths = vec!["/posts".to_string()];

    let upstream = ScriptedUpstream::default();
    upstream.respond("/posts", status(503, "/posts"));
    let client = ResilientClient::from_config(upstream.clone(), &config);

    let report = client.warm_configured().await;
    assert_eq!(report.warmed, vec!["/posts"]);
    client.fetch("/posts").await.unwrap();

    let events: Arc<EventBuffer> = client.events().expect("Telemetry on by default").clone();
    assert_eq!(events.by_type(event_types::RETRY_ATTEMPT).len(), 1);
    assert_eq!(events.by_type(event_types::CIRCUIT_FAILURE).len(), 1);
    assert_eq!(events.by_type(event_types::CACHE_MISS).len(), 1);
    assert_eq!(events.by_type(event_types::CACHE_HIT).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_reset_breakers() {
    let upstream = ScriptedUpstream::default();
    upstream.respond("/feed", status(500, "/feed"));
    let client = ResilientClient::new(upstream, factory(1, 0, 100));

    assert!(client.fetch("/feed").await.is_err());
    assert_eq!(client.breaker("/feed").state(), CircuitState::Open);

    client.reset_breakers();
    assert_eq!(client.breaker("/feed").state(), CircuitState::Closed);
    assert!(client.fetch("/feed").await.is_ok());
}
