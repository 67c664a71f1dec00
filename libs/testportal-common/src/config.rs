// Client configuration
// The execution service address is the only external dependency

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_LANGUAGES_PATH: &str = "config/languages.json";

pub const ENV_BASE_URL: &str = "TESTPORTAL_URL";
pub const ENV_TIMEOUT_SECONDS: &str = "TESTPORTAL_TIMEOUT_SECONDS";
pub const ENV_LANGUAGES_PATH: &str = "TESTPORTAL_LANGUAGES";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// No timeout unless configured
    pub timeout_seconds: Option<u64>,
    pub languages_path: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: None,
            languages_path: PathBuf::from(DEFAULT_LANGUAGES_PATH),
        }
    }

    /// Defaults overridden by `TESTPORTAL_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new();

        if let Some(url) = lookup(ENV_BASE_URL) {
            config.base_url = url;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECONDS) {
            let seconds: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{} must be a whole number of seconds, got '{}'", ENV_TIMEOUT_SECONDS, raw))?;
            config.timeout_seconds = (seconds > 0).then_some(seconds);
        }
        if let Some(path) = lookup(ENV_LANGUAGES_PATH) {
            config.languages_path = PathBuf::from(path);
        }

        Ok(config)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}
