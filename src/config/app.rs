// src/config/app.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, time::Duration};

pub const DEFAULT_SUMMARY_PROMPT: &str = "Summarize the key news topics and main stories from this website. Focus on the most important headlines and provide a concise overview in markdown format.";
pub const DEFAULT_SCHEDULE_MINUTES: u64 = 15;

/// `llm_api_key: "ENV"` means: read the key from this variable at run time.
pub const ENV_LLM_API_KEY: &str = "NUB_LLM_API_KEY";

fn default_schedule_minutes() -> u64 {
    DEFAULT_SCHEDULE_MINUTES
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no sources configured")]
    NoSources,
    #[error("LLM API key not set, use `nub set llm-api-key`")]
    MissingApiKey,
    #[error("LLM API URL not set, use `nub set llm-api-url`")]
    MissingApiUrl,
    #[error("LLM API model not set, use `nub set llm-api-model`")]
    MissingModel,
    #[error("source already exists: {0}")]
    DuplicateSource(String),
    #[error("source not found: {0}")]
    SourceNotFound(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub llm_api_key: String,
    #[serde(default)]
    pub llm_api_url: String,
    #[serde(default)]
    pub llm_api_model: String,
    #[serde(default = "default_schedule_minutes")]
    pub schedule_minutes: u64,
    #[serde(default)]
    pub summary_prompt: String,
    #[serde(default)]
    pub focus_topics: String,
    /// Per-request timeout for LLM calls. Absent = transport default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            llm_api_key: String::new(),
            llm_api_url: String::new(),
            llm_api_model: String::new(),
            schedule_minutes: DEFAULT_SCHEDULE_MINUTES,
            summary_prompt: DEFAULT_SUMMARY_PROMPT.to_string(),
            focus_topics: String::new(),
            llm_timeout_secs: None,
        }
    }
}

impl Config {
    /// Load the config file, writing a default one first if it does not exist.
    pub fn load_or_init<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            let cfg = Config::default();
            cfg.save_to(path)?;
            tracing::info!(path = %path.display(), "wrote default config");
            return Ok(cfg);
        }
        Self::load_from_file(path)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let mut cfg: Config = serde_json::from_str(&data)
            .with_context(|| format!("parsing config {}", path.display()))?;

        if cfg.summary_prompt.trim().is_empty() {
            cfg.summary_prompt = DEFAULT_SUMMARY_PROMPT.to_string();
        }
        Ok(cfg)
    }

    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating config dir {}", dir.display()))?;
        }
        let data = serde_json::to_vec_pretty(self)?;
        fs::write(path, data).with_context(|| format!("writing config {}", path.display()))?;
        restrict_permissions(path)?;
        Ok(())
    }

    pub fn add_source(&mut self, url: &str) -> Result<(), ConfigError> {
        let url = url.trim();
        if self.sources.iter().any(|s| s == url) {
            return Err(ConfigError::DuplicateSource(url.to_string()));
        }
        self.sources.push(url.to_string());
        Ok(())
    }

    /// Remove by 1-based index (as printed by `list`) or by exact URL.
    pub fn remove_source(&mut self, id_or_url: &str) -> Result<String, ConfigError> {
        let needle = id_or_url.trim();
        let by_index = needle
            .parse::<usize>()
            .ok()
            .filter(|n| (1..=self.sources.len()).contains(n))
            .map(|n| n - 1);
        let idx = by_index
            .or_else(|| self.sources.iter().position(|s| s == needle))
            .ok_or_else(|| ConfigError::SourceNotFound(needle.to_string()))?;
        Ok(self.sources.remove(idx))
    }

    /// Check the settings a run needs before it touches the network.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sources.is_empty() {
            return Err(ConfigError::NoSources);
        }
        if self.llm_api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.llm_api_url.trim().is_empty() {
            return Err(ConfigError::MissingApiUrl);
        }
        if self.llm_api_model.trim().is_empty() {
            return Err(ConfigError::MissingModel);
        }
        Ok(())
    }

    /// API key with `ENV` resolved against `NUB_LLM_API_KEY`.
    pub fn resolved_api_key(&self) -> Result<String> {
        if self.llm_api_key.trim().eq_ignore_ascii_case("env") {
            return env::var(ENV_LLM_API_KEY)
                .map_err(|_| anyhow::anyhow!("Missing {ENV_LLM_API_KEY} env var"));
        }
        Ok(self.llm_api_key.clone())
    }

    /// Interval between daemon runs; zero falls back to the default.
    pub fn schedule(&self) -> Duration {
        let minutes = if self.schedule_minutes == 0 {
            DEFAULT_SCHEDULE_MINUTES
        } else {
            self.schedule_minutes
        };
        Duration::from_secs(minutes * 60)
    }

    pub fn llm_timeout(&self) -> Option<Duration> {
        self.llm_timeout_secs.map(Duration::from_secs)
    }

    pub fn has_focus(&self) -> bool {
        !self.focus_topics.trim().is_empty()
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .with_context(|| format!("chmod 600 {}", path.display()))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
