//! Quizbank configuration
//!
//! Loaded from `~/.quizbank/config.toml` (or an explicit path). Every field has
//! a default, so a missing file means built-in defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::ai::{default_strategies, ProviderStrategy, RetryConfig};
use crate::{constants, paths};

/// Top-level configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QuizbankConfig {
    /// Bank database file (defaults to `~/.quizbank/data/bank.db`)
    pub database_path: Option<PathBuf>,
    /// Questions generated per refill
    pub refill_size: usize,
    /// Questions delivered per category per run
    pub pack_size: usize,
    pub provider: ProviderSettings,
    pub retry: RetrySettings,
    /// Strategies in preference order
    pub strategies: Vec<ProviderStrategy>,
}

/// Generation provider connection settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub base_url: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub request_timeout_secs: u64,
    pub temperature: f32,
}

/// Serialized form of `RetryConfig`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub rate_limit_cooldown_secs: u64,
    pub jitter: bool,
}

impl Default for QuizbankConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            refill_size: constants::bank::REFILL_SIZE,
            pack_size: constants::bank::PACK_SIZE,
            provider: ProviderSettings::default(),
            retry: RetrySettings::default(),
            strategies: default_strategies(),
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: constants::generation::DEFAULT_BASE_URL.to_string(),
            api_key_env: constants::generation::API_KEY_ENV.to_string(),
            request_timeout_secs: constants::http::REQUEST_TIMEOUT.as_secs(),
            temperature: constants::generation::TEMPERATURE,
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        let defaults = RetryConfig::default();
        Self {
            max_retries: defaults.max_retries,
            initial_delay_ms: defaults.initial_delay.as_millis() as u64,
            max_delay_ms: defaults.max_delay.as_millis() as u64,
            rate_limit_cooldown_secs: defaults.rate_limit_cooldown.as_secs(),
            jitter: defaults.jitter,
        }
    }
}

impl QuizbankConfig {
    /// Load configuration
    ///
    /// An explicit path must exist. Without one, the default path is used when
    /// present and built-in defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::load_from_path(path)?,
            None => {
                let default_path = paths::default_config_path();
                if default_path.exists() {
                    Self::load_from_path(&default_path)?
                } else {
                    tracing::debug!("No config at {:?}, using defaults", default_path);
                    Self::default()
                }
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.strategies.is_empty() {
            bail!("at least one provider strategy must be configured");
        }
        if self.refill_size == 0 {
            bail!("refill_size must be greater than zero");
        }
        if self.pack_size == 0 {
            bail!("pack_size must be greater than zero");
        }
        Ok(())
    }

    /// Bank database location
    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(paths::default_database_path)
    }

    /// Provider API key from the configured environment variable
    pub fn api_key(&self) -> Result<String> {
        match std::env::var(&self.provider.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => bail!(
                "provider API key not set (expected in ${})",
                self.provider.api_key_env
            ),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.provider.request_timeout_secs)
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.retry.max_retries,
            initial_delay: Duration::from_millis(self.retry.initial_delay_ms),
            max_delay: Duration::from_millis(self.retry.max_delay_ms),
            rate_limit_cooldown: Duration::from_secs(self.retry.rate_limit_cooldown_secs),
            jitter: self.retry.jitter,
        }
    }
}
