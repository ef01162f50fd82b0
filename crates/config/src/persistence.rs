//! Reading and writing the config file
//!
//! A save renders the TOML first, copies the current file to
//! `<name>.backup`, then replaces the file through a staged temp file in
//! the same directory. Readers never see a half-written config.

use crate::error::summarize;
use crate::{Config, ConfigError, ConfigResult, CONFIG_VERSION};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const BACKUP_SUFFIX: &str = ".backup";

#[derive(Debug, Clone)]
pub struct ConfigPersistence {
    path: PathBuf,
}

impl ConfigPersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where the previous version is kept, e.g. `config.toml.backup`
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(BACKUP_SUFFIX);
        self.path.with_file_name(name)
    }

    /// Reads the config file
    ///
    /// A missing file yields [`Config::default`]. Blank or malformed files
    /// are errors. Out-of-range values are only logged, so a hand-edited
    /// file still loads.
    pub fn load(&self) -> ConfigResult<Config> {
        let Some(text) = self.read_text()? else {
            log::info!(
                "No config file at {}, using defaults",
                self.path.display()
            );
            return Ok(Config::default());
        };

        let config = self.parse(&text)?;
        report_problems(&config);
        Ok(config)
    }

    /// Validates, renders and atomically writes `config`
    ///
    /// Nothing touches the disk when validation fails.
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        config.validate().map_err(ConfigError::Invalid)?;
        let rendered = toml::to_string_pretty(config)?;

        let dir = self.directory();
        fs::create_dir_all(dir).map_err(|e| ConfigError::io("create", dir, e))?;

        if self.keep_backup()? {
            log::debug!("Previous config kept at {}", self.backup_path().display());
        }
        self.replace_with(dir, &rendered)?;

        log::info!("Config saved to {}", self.path.display());
        Ok(())
    }

    fn read_text(&self) -> ConfigResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ConfigError::io("read", &self.path, e)),
        }
    }

    fn parse(&self, text: &str) -> ConfigResult<Config> {
        if text.trim().is_empty() {
            return Err(ConfigError::Empty {
                path: self.path.clone(),
            });
        }
        toml::from_str(text).map_err(|source| ConfigError::Malformed {
            path: self.path.clone(),
            source,
        })
    }

    /// Directory holding the file; `.` for a bare file name
    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// Copies the current file aside; `false` when there was none
    fn keep_backup(&self) -> ConfigResult<bool> {
        let backup = self.backup_path();
        match fs::copy(&self.path, &backup) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ConfigError::io("back up", &self.path, e)),
        }
    }

    fn replace_with(&self, dir: &Path, rendered: &str) -> ConfigResult<()> {
        let mut staged =
            NamedTempFile::new_in(dir).map_err(|e| ConfigError::io("stage", dir, e))?;
        staged
            .write_all(rendered.as_bytes())
            .and_then(|()| staged.as_file().sync_all())
            .map_err(|e| ConfigError::io("write", staged.path(), e))?;

        staged
            .persist(&self.path)
            .map_err(|e| ConfigError::io("replace", &self.path, e.error))?;
        Ok(())
    }
}

fn report_problems(config: &Config) {
    if config.version < CONFIG_VERSION {
        log::warn!(
            "Config version {} predates {}, missing fields take defaults",
            config.version,
            CONFIG_VERSION
        );
    }
    if let Err(errors) = config.validate() {
        log::warn!("Loaded config has invalid values: {}", summarize(&errors));
    }
}
