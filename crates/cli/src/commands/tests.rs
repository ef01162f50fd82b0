use super::*;
use contentguard_gateway::{GatewayError, GatewayResult, GuardFactory};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

fn setup_manager() -> (TempDir, ConfigManager) {
    let temp_dir = TempDir::new().unwrap();
    let manager = ConfigManager::with_directory(temp_dir.path());
    (temp_dir, manager)
}

/// Fails the first `failures` calls with a 503, then echoes the path
#[derive(Clone, Default)]
struct FlakyUpstream {
    failures: usize,
    calls: Arc<AtomicUsize>,
}

impl Upstream for FlakyUpstream {
    async fn fetch(&self, path: &str) -> GatewayResult<Value> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(GatewayError::Status {
                status: 503,
                endpoint: path.to_string(),
            });
        }
        Ok(json!({ "path": path }))
    }
}

fn client(upstream: FlakyUpstream, max_retries: u32) -> ResilientClient<FlakyUpstream> {
    let mut config = Config::default();
    config.retry.max_retries = max_retries;
    config.retry.initial_delay_ms = 1;
    config.retry.jitter = false;
    ResilientClient::new(upstream, GuardFactory::from_config(&config))
}

#[test]
fn test_init_then_validate() {
    let (_temp, manager) = setup_manager();
    init_config(&manager).unwrap();
    assert!(manager.config_path().exists());

    // A second init leaves the file alone
    init_config(&manager).unwrap();
    validate_config(&manager).unwrap();
}

#[test]
fn test_validate_fails_on_invalid_file() {
    let (_temp, manager) = setup_manager();
    std::fs::write(manager.config_path(), "[rate_limit]\nwindow_ms = 0\n").unwrap();

    assert!(validate_config(&manager).is_err());
}

#[test]
fn test_render_config_round_trips() {
    let mut config = Config::default();
    config.cache.warm_paths = vec!["/posts".to_string()];

    let rendered = render_config(&config).unwrap();
    let parsed: Config = toml::from_str(&rendered).unwrap();
    assert_eq!(parsed, config);
}

#[tokio::test(start_paused = true)]
async fn test_run_fetch_hits_cache_after_first_success() {
    let upstream = FlakyUpstream {
        failures: 1,
        ..Default::default()
    };
    let calls = upstream.calls.clone();
    let client = client(upstream, 2);

    let summary = run_fetch(&client, "/posts", 4, Some(Duration::from_secs(60))).await;

    assert_eq!(summary.succeeded, 4);
    assert!(summary.failures.is_empty());
    assert_eq!(summary.last, Some(json!({ "path": "/posts" })));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(client.cache_stats().counters.hits, 3);
}

#[tokio::test(start_paused = true)]
async fn test_run_fetch_collects_failures() {
    let upstream = FlakyUpstream {
        failures: usize::MAX,
        ..Default::default()
    };
    let client = client(upstream, 0);

    let summary = run_fetch(&client, "/posts", 2, None).await;

    assert_eq!(summary.succeeded, 0);
    assert_eq!(summary.failures.len(), 2);
    assert!(summary.failures[0].contains("503"));
    assert!(summary.last.is_none());
}
