// src/config/paths.rs
//! The one place that looks at the environment and the home directory.
//! Everything else receives explicit paths from `DataPaths`.

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_CONFIG_PATH: &str = "NUB_CONFIG";
pub const ENV_DATA_DIR: &str = "NUB_DATA_DIR";

pub const CACHE_DIR: &str = "cache";
pub const SUMMARIES_DIR: &str = "summaries";
pub const FOCUS_DIR: &str = "focus";
pub const PID_FILE: &str = "nub.pid";
pub const LOG_FILE: &str = "nub.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    config_file: PathBuf,
    data_dir: PathBuf,
}

impl DataPaths {
    pub fn new(config_file: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_file: config_file.into(),
            data_dir: data_dir.into(),
        }
    }

    /// Resolve paths with precedence: explicit override > env var > home default
    /// (`~/.config/nub/config.json`, `~/.local/nub`).
    ///
    /// Env vars are normally folded into the overrides by clap; they are read
    /// here as well so library callers get the same behavior.
    pub fn resolve(config_override: Option<PathBuf>, data_override: Option<PathBuf>) -> Result<Self> {
        let config_file = match config_override.or_else(|| env_path(ENV_CONFIG_PATH)) {
            Some(p) => p,
            None => home()?.join(".config").join("nub").join("config.json"),
        };
        let data_dir = match data_override.or_else(|| env_path(ENV_DATA_DIR)) {
            Some(p) => p,
            None => home()?.join(".local").join("nub"),
        };
        Ok(Self::new(config_file, data_dir))
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join(CACHE_DIR)
    }

    pub fn summaries_dir(&self) -> PathBuf {
        self.data_dir.join(SUMMARIES_DIR)
    }

    pub fn focus_dir(&self) -> PathBuf {
        self.data_dir.join(FOCUS_DIR)
    }

    pub fn pid_file(&self) -> PathBuf {
        self.data_dir.join(PID_FILE)
    }

    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE)
    }

    pub fn plain_view_file(&self) -> PathBuf {
        self.data_dir.join("view.md")
    }

    pub fn html_view_file(&self) -> PathBuf {
        self.data_dir.join("view.html")
    }

    /// Remove the whole data directory (cache, documents, pid and log).
    /// Returns `false` when there was nothing to remove.
    pub fn clear_all(&self) -> Result<bool> {
        if !self.data_dir.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&self.data_dir)
            .with_context(|| format!("failed to remove data directory {}", self.data_dir.display()))?;
        Ok(true)
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn home() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| anyhow!("cannot determine home directory"))
}
