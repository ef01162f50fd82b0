//! Integration tests for the configuration system

use contentguard_config::{Config, ConfigError, ConfigManager, CONFIG_VERSION};
use tempfile::TempDir;

fn setup_test_manager() -> Result<(TempDir, ConfigManager), Box<dyn std::error::Error>> {
    let _ = env_logger::builder().is_test(true).try_init();
    let temp_dir = TempDir::new()?;
    let manager = ConfigManager::with_directory(temp_dir.path());
    Ok((temp_dir, manager))
}

#[test]
fn test_full_lifecycle() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;

    assert!(manager.initialize()?);

    let config = manager.load()?;
    assert_eq!(config.version, CONFIG_VERSION);

    let mut modified = config.clone();
    modified.upstream.base_url = "https://cms.example.com/api".to_string();
    modified.cache.warm_paths = vec!["/posts".to_string(), "/categories".to_string()];
    modified.telemetry.log_events = true;
    manager.save(&modified)?;

    let reloaded = manager.load()?;
    assert_eq!(reloaded, modified);

    manager.reset()?;
    assert_eq!(manager.load()?, Config::default());

    Ok(())
}

#[test]
fn test_invalid_config_not_saved() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;
    manager.save(&Config::default())?;
    assert!(manager.validate()?.is_empty());

    let mut invalid = Config::default();
    invalid.rate_limit.window_ms = 0;
    invalid.retry.max_retries = 99;

    match manager.save(&invalid) {
        Err(err @ ConfigError::Invalid(_)) => {
            assert_eq!(
                err.invalid_fields(),
                vec!["retry.max_retries", "rate_limit.window_ms"]
            );
            assert!(err.to_string().contains("(found 99)"));
        }
        other => panic!("expected validation error, got {:?}", other),
    }

    // The previous file is untouched
    assert_eq!(manager.load()?, Config::default());
    Ok(())
}

#[test]
fn test_hand_written_file() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;
    std::fs::write(
        manager.config_path(),
        r#"
[upstream]
base_url = "https://blog.example.org"

[circuit_breaker]
failure_threshold = 3
recovery_timeout_ms = 1000

[cache]
warm_paths = ["/posts"]
"#,
    )?;

    let config = manager.load()?;
    assert_eq!(config.upstream.base_url, "https://blog.example.org");
    assert_eq!(config.circuit_breaker.failure_threshold, 3);
    assert_eq!(config.circuit_breaker.success_threshold, 2);
    assert_eq!(config.cache.warm_paths, vec!["/posts"]);
    assert_eq!(config.version, CONFIG_VERSION);
    Ok(())
}

#[test]
fn test_update_persists_through_new_manager() -> Result<(), Box<dyn std::error::Error>> {
    let (temp_dir, manager) = setup_test_manager()?;
    manager.update(|config| config.retry.jitter = false)?;

    let other = ConfigManager::with_directory(temp_dir.path());
    assert!(!other.load()?.retry.jitter);
    Ok(())
}

#[test]
fn test_wrong_type_is_malformed() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;
    std::fs::write(manager.config_path(), "[retry]\nmax_retries = \"three\"\n")?;

    assert!(matches!(manager.load(), Err(ConfigError::Malformed { .. })));
    assert_eq!(manager.load_or_default(), Config::default());
    Ok(())
}
