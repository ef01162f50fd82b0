//! Cache configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};

/// Response cache settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheSettings {
    /// TTL for responses fetched without an explicit one, in milliseconds
    pub default_ttl_ms: u64,

    /// Background sweep period in milliseconds. Zero disables the sweeper.
    pub sweep_interval_ms: u64,

    /// Paths fetched eagerly by `warm`
    pub warm_paths: Vec<String>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            default_ttl_ms: 300_000,
            sweep_interval_ms: 60_000,
            warm_paths: Vec::new(),
        }
    }
}

impl ConfigSection for CacheSettings {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut results = vec![Validator::in_range(
            self.default_ttl_ms,
            1,
            86_400_000,
            "cache.default_ttl_ms",
        )];

        if self.sweep_interval_ms != 0 {
            results.push(Validator::in_range(
                self.sweep_interval_ms,
                100,
                3_600_000,
                "cache.sweep_interval_ms",
            ));
        }

        for (i, path) in self.warm_paths.iter().enumerate() {
            results.push(Validator::not_empty(path, &format!("cache.warm_paths[{}]", i)));
        }

        Validator::collect_errors(results)
    }

    fn merge(&mut self, other: Self) {
        self.default_ttl_ms = other.default_ttl_ms;
        self.sweep_interval_ms = other.sweep_interval_ms;
        self.warm_paths = other.warm_paths;
    }

    fn section_name(&self) -> &'static str {
        "cache"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(CacheSettings::default().validate().is_ok());
    }

    #[test]
    fn test_zero_sweep_interval_disables_sweeper() {
        let config = CacheSettings {
            sweep_interval_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_tiny_sweep_interval_rejected() {
        let config = CacheSettings {
            sweep_interval_ms: 5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blank_warm_path_rejected() {
        let config = CacheSettings {
            warm_paths: vec!["/posts".to_string(), " ".to_string()],
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        assert_eq!(errors[0].field, "cache.warm_paths[1]");
    }
}
