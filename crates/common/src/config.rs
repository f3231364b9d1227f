//! # Benchlog Configuration
//!
//! Configuration is resolved from several sources in order of precedence:
//! 1. Command line flags (`--log-dir`, `--config`)
//! 2. Environment variables (`BENCHLOG_DIR`, `BENCHLOG_CONFIG`)
//! 3. Configuration file (`benchlog.toml` in the working directory)
//! 4. Built-in defaults

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{BenchlogError, BenchlogResult};
use crate::journal::SessionJournal;

pub const DEFAULT_LOG_DIR: &str = "/tmp/ck-benchmark";
pub const DEFAULT_SESSION_ID: &str = "default";
pub const CONFIG_FILE_NAME: &str = "benchlog.toml";

pub const ENV_LOG_DIR: &str = "BENCHLOG_DIR";
pub const ENV_CONFIG: &str = "BENCHLOG_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchlogConfig {
    /// Reserved directory holding one `<session>.jsonl` per session
    pub log_dir: PathBuf,
    /// Session key used when the payload carries none
    pub default_session: String,
}

impl Default for BenchlogConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            default_session: DEFAULT_SESSION_ID.to_string(),
        }
    }
}

/// Values that take precedence over the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Fills every unset override from the process environment.
    pub fn with_env(mut self) -> Self {
        if self.log_dir.is_none() {
            self.log_dir = env_path(ENV_LOG_DIR);
        }
        if self.config_path.is_none() {
            self.config_path = env_path(ENV_CONFIG);
        }
        self
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    let raw = env::var(key).ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(PathBuf::from(trimmed))
    }
}

impl BenchlogConfig {
    pub fn from_file(path: &Path) -> BenchlogResult<Self> {
        let raw = fs::read_to_string(path).map_err(|err| BenchlogError::Config {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        toml::from_str(&raw).map_err(|err| BenchlogError::Config {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })
    }

    /// Resolves the effective configuration.
    ///
    /// An explicit config path must exist; the implicit `benchlog.toml`
    /// lookup in the working directory is skipped when the file is absent.
    pub fn load(overrides: &ConfigOverrides) -> BenchlogResult<Self> {
        let file = match &overrides.config_path {
            Some(path) => Some(path.clone()),
            None => env::current_dir()
                .ok()
                .map(|cwd| cwd.join(CONFIG_FILE_NAME))
                .filter(|candidate| candidate.is_file()),
        };

        let mut config = match file {
            Some(path) => {
                debug!(path = %path.display(), "loading configuration file");
                Self::from_file(&path)?
            }
            None => Self::default(),
        };

        config.apply(overrides);
        Ok(config)
    }

    /// Like [`BenchlogConfig::load`], but a broken configuration file falls
    /// back to the built-in defaults. Overrides still apply.
    pub fn load_or_default(overrides: &ConfigOverrides) -> Self {
        Self::load(overrides).unwrap_or_else(|err| {
            debug!(code = err.error_code(), error = %err, "configuration ignored");
            let mut config = Self::default();
            config.apply(overrides);
            config
        })
    }

    fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(dir) = &overrides.log_dir {
            self.log_dir = dir.clone();
        }
        if self.default_session.trim().is_empty() {
            self.default_session = DEFAULT_SESSION_ID.to_string();
        }
    }

    pub fn journal(&self) -> SessionJournal {
        SessionJournal::new(self.log_dir.clone())
    }
}
