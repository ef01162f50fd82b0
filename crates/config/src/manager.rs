//! Configuration manager - main API for config operations

use crate::persistence::ConfigPersistence;
use crate::{Config, ConfigError, ConfigResult};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Prefix of environment variables that override file values
///
/// Variables follow the pattern `CONTENTGUARD_SECTION_FIELD`, e.g.
/// `CONTENTGUARD_RATE_LIMIT_MAX_REQUESTS=20`.
pub const ENV_PREFIX: &str = "CONTENTGUARD_";

const CONFIG_FILE: &str = "config.toml";

/// Main configuration manager
///
/// Owns the config file location and wraps load, save and validation.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    persistence: ConfigPersistence,
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Creates a new config manager using the default config directory
    ///
    /// - Linux: `~/.config/contentguard/`
    /// - macOS: `~/Library/Application Support/contentguard/`
    /// - Windows: `%APPDATA%\contentguard\`
    pub fn new() -> ConfigResult<Self> {
        let config_dir = Self::default_config_dir()?;
        Ok(Self::with_directory(config_dir))
    }

    /// Creates a config manager with a custom config directory
    pub fn with_directory(config_dir: impl Into<PathBuf>) -> Self {
        let config_dir = config_dir.into();
        let persistence = ConfigPersistence::new(config_dir.join(CONFIG_FILE));

        Self {
            persistence,
            config_dir,
        }
    }

    fn default_config_dir() -> ConfigResult<PathBuf> {
        ProjectDirs::from("", "", "contentguard")
            .map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
            .ok_or(ConfigError::NoConfigDir)
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Returns the full config file path
    pub fn config_path(&self) -> &Path {
        self.persistence.path()
    }

    /// Loads the configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file is corrupted, returns an error.
    pub fn load(&self) -> ConfigResult<Config> {
        self.persistence.load()
    }

    /// Loads the configuration, falling back to defaults on any error
    pub fn load_or_default(&self) -> Config {
        match self.load() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load config: {}, using defaults", e);
                Config::default()
            }
        }
    }

    /// Saves the configuration after validating it
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        self.persistence.save(config)
    }

    /// Loads the current config, applies `update_fn` and saves the result
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use contentguard_config::ConfigManager;
    /// # let manager = ConfigManager::new().unwrap();
    /// manager.update(|config| {
    ///     config.rate_limit.max_requests = 20;
    /// }).expect("Failed to update config");
    /// ```
    pub fn update<F>(&self, update_fn: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut Config),
    {
        let mut config = self.load()?;
        update_fn(&mut config);
        self.save(&config)
    }

    /// Writes a default config file if one doesn't exist
    ///
    /// Returns Ok(true) if a new file was created, Ok(false) if one already exists.
    pub fn initialize(&self) -> ConfigResult<bool> {
        if self.config_path().exists() {
            log::info!(
                "Config file already exists at {}",
                self.config_path().display()
            );
            return Ok(false);
        }

        self.save(&Config::default())?;
        log::info!("Generated default config at {}", self.config_path().display());
        Ok(true)
    }

    /// Overwrites the existing config file with default values
    pub fn reset(&self) -> ConfigResult<()> {
        self.save(&Config::default())
    }

    /// Validates the current configuration file
    ///
    /// Returns all validation errors found, or an empty list if valid.
    pub fn validate(&self) -> ConfigResult<Vec<String>> {
        let config = self.load()?;

        match config.validate() {
            Ok(()) => Ok(Vec::new()),
            Err(errors) => Ok(errors.iter().map(|e| e.to_string()).collect()),
        }
    }

    /// Loads the config file and applies `CONTENTGUARD_*` environment overrides
    pub fn load_with_env_overrides(&self) -> ConfigResult<Config> {
        let mut config = self.load()?;
        apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;

        if let Err(errors) = config.validate() {
            log::warn!(
                "Config validation warnings after env overrides: {:?}",
                errors
            );
        }

        Ok(config)
    }
}

/// Applies overrides looked up by full variable name
///
/// Unset variables leave the field alone. A set but unparsable variable is
/// an error.
pub(crate) fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    let env = EnvOverrides { lookup };

    if let Some(url) = env.get("UPSTREAM_BASE_URL") {
        config.upstream.base_url = url;
    }
    env.parse("UPSTREAM_TIMEOUT_MS", &mut config.upstream.timeout_ms)?;
    if let Some(agent) = env.get("UPSTREAM_USER_AGENT") {
        config.upstream.user_agent = agent;
    }

    let breaker = &mut config.circuit_breaker;
    env.parse("CIRCUIT_BREAKER_FAILURE_THRESHOLD", &mut breaker.failure_threshold)?;
    env.parse("CIRCUIT_BREAKER_RECOVERY_TIMEOUT_MS", &mut breaker.recovery_timeout_ms)?;
    env.parse("CIRCUIT_BREAKER_SUCCESS_THRESHOLD", &mut breaker.success_threshold)?;

    let retry = &mut config.retry;
    env.parse("RETRY_MAX_RETRIES", &mut retry.max_retries)?;
    env.parse("RETRY_INITIAL_DELAY_MS", &mut retry.initial_delay_ms)?;
    env.parse("RETRY_MAX_DELAY_MS", &mut retry.max_delay_ms)?;
    env.parse("RETRY_BACKOFF_MULTIPLIER", &mut retry.backoff_multiplier)?;
    env.parse("RETRY_JITTER", &mut retry.jitter)?;

    env.parse("RATE_LIMIT_MAX_REQUESTS", &mut config.rate_limit.max_requests)?;
    env.parse("RATE_LIMIT_WINDOW_MS", &mut config.rate_limit.window_ms)?;

    env.parse("CACHE_DEFAULT_TTL_MS", &mut config.cache.default_ttl_ms)?;
    env.parse("CACHE_SWEEP_INTERVAL_MS", &mut config.cache.sweep_interval_ms)?;

    env.parse("TELEMETRY_ENABLED", &mut config.telemetry.enabled)?;
    env.parse("TELEMETRY_BUFFER_CAPACITY", &mut config.telemetry.buffer_capacity)?;
    env.parse("TELEMETRY_LOG_EVENTS", &mut config.telemetry.log_events)?;

    Ok(())
}

struct EnvOverrides<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> EnvOverrides<F> {
    fn get(&self, field: &str) -> Option<String> {
        let name = format!("{}{}", ENV_PREFIX, field);
        let value = (self.lookup)(&name)?;
        log::info!("Config override from {}", name);
        Some(value)
    }

    fn parse<T: FromStr>(&self, field: &str, target: &mut T) -> ConfigResult<()> {
        if let Some(raw) = self.get(field) {
            *target = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidOverride {
                    name: format!("{}{}", ENV_PREFIX, field),
                    value: raw.clone(),
                })?;
        }
        Ok(())
    }
}
