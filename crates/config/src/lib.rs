//! ContentGuard configuration
//!
//! One TOML file holds a section per component. Each section implements
//! [`ConfigSection`], so it validates and merges itself.
//!
//! # Example
//!
//! ```rust,no_run
//! use contentguard_config::{Config, ConfigManager};
//!
//! let manager = ConfigManager::new().expect("Failed to initialize config");
//! let config = manager.load().unwrap_or_else(|e| {
//!     eprintln!("Config error: {}, using defaults", e);
//!     Config::default()
//! });
//!
//! println!("Upstream: {}", config.upstream.base_url);
//! ```

mod error;
mod manager;
mod persistence;
mod validation;

mod cache_config;
mod circuit_breaker_config;
mod rate_limit_config;
mod retry_config;
mod telemetry_config;
mod upstream_config;

pub use error::{ConfigError, ConfigResult, ValidationError};
pub use manager::{ConfigManager, ENV_PREFIX};
pub use persistence::ConfigPersistence;
pub use validation::{ConfigSection, Validator};

pub use cache_config::CacheSettings;
pub use circuit_breaker_config::CircuitBreakerSettings;
pub use rate_limit_config::RateLimitSettings;
pub use retry_config::RetrySettings;
pub use telemetry_config::TelemetrySettings;
pub use upstream_config::UpstreamSettings;

use serde::{Deserialize, Serialize};

/// Current config file format version
pub const CONFIG_VERSION: u32 = 1;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Config file format version
    pub version: u32,

    pub upstream: UpstreamSettings,
    pub circuit_breaker: CircuitBreakerSettings,
    pub retry: RetrySettings,
    pub rate_limit: RateLimitSettings,
    pub cache: CacheSettings,
    pub telemetry: TelemetrySettings,
}

impl Config {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the entire configuration
    ///
    /// Returns all validation errors found across all sections.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.version > CONFIG_VERSION {
            errors.push(
                ValidationError::new(
                    "version",
                    format!("is newer than supported version {}", CONFIG_VERSION),
                )
                .found(self.version),
            );
        }

        collect_section(&self.upstream, &mut errors);
        collect_section(&self.circuit_breaker, &mut errors);
        collect_section(&self.retry, &mut errors);
        collect_section(&self.rate_limit, &mut errors);
        collect_section(&self.cache, &mut errors);
        collect_section(&self.telemetry, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Merges this config with another, preferring values from `other`
    ///
    /// Used for override chains: defaults < file < env vars < CLI args
    pub fn merge(&mut self, other: Config) {
        self.upstream.merge(other.upstream);
        self.circuit_breaker.merge(other.circuit_breaker);
        self.retry.merge(other.retry);
        self.rate_limit.merge(other.rate_limit);
        self.cache.merge(other.cache);
        self.telemetry.merge(other.telemetry);
    }
}

fn collect_section<S: ConfigSection>(section: &S, errors: &mut Vec<ValidationError>) {
    if let Err(mut e) = section.validate() {
        log::debug!(
            "{} errors in config section '{}'",
            e.len(),
            section.section_name()
        );
        errors.append(&mut e);
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            upstream: UpstreamSettings::default(),
            circuit_breaker: CircuitBreakerSettings::default(),
            retry: RetrySettings::default(),
            rate_limit: RateLimitSettings::default(),
            cache: CacheSettings::default(),
            telemetry: TelemetrySettings::default(),
        }
    }
}
