//! Configuration errors

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A filesystem step on `path` failed; `op` names the step
    #[error("cannot {op} {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        source: io::Error,
    },

    /// The file exists but holds nothing but whitespace
    #[error("config file {} is empty", .path.display())]
    Empty { path: PathBuf },

    #[error("malformed config file {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("cannot render config as TOML: {0}")]
    Render(#[from] toml::ser::Error),

    /// Save refused; every failing field is listed
    #[error("refusing to save invalid config: {}", summarize(.0))]
    Invalid(Vec<ValidationError>),

    #[error("no home directory to place the config directory in")]
    NoConfigDir,

    #[error("environment variable {name} has unusable value {value:?}")]
    InvalidOverride { name: String, value: String },
}

impl ConfigError {
    pub(crate) fn io(op: &'static str, path: &Path, source: io::Error) -> Self {
        ConfigError::Io {
            op,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Field paths rejected by validation, empty for other errors
    pub fn invalid_fields(&self) -> Vec<&str> {
        match self {
            ConfigError::Invalid(errors) => errors.iter().map(|e| e.field.as_str()).collect(),
            _ => Vec::new(),
        }
    }
}

pub(crate) fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// One rejected config field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path such as `retry.max_retries`
    pub field: String,
    pub message: String,
    /// Offending value as written, when worth showing
    pub found: Option<String>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            found: None,
        }
    }

    pub fn found(mut self, value: impl fmt::Display) -> Self {
        self.found = Some(value.to_string());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.message)?;
        match &self.found {
            Some(found) => write!(f, " (found {})", found),
            None => Ok(()),
        }
    }
}

impl std::error::Error for ValidationError {}
