//! Feed configuration and the CLI credential file.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::Account;

/// Bounded exponential backoff used by the reconcile-and-resubscribe flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial backoff duration in milliseconds
    pub initial_backoff_ms: u64,
    /// Maximum backoff duration in milliseconds
    pub max_backoff_ms: u64,
    /// Backoff multiplier (e.g., 2.0 for exponential)
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_backoff_ms: 500,
            max_backoff_ms: 30_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Backoff before the given attempt (1-based), capped at the maximum.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = self.initial_backoff_ms as f64
            * self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);
        Duration::from_millis(exp.min(self.max_backoff_ms as f64) as u64)
    }
}

/// Tuning knobs of one feed controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Page size for initial load and backward pagination
    pub page_limit: usize,
    /// Poll interval of the polling stream source, in seconds
    pub poll_interval_secs: u64,
    /// Backoff policy for stream reconnects
    #[serde(default)]
    pub reconnect: RetryConfig,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_limit: 40,
            poll_interval_secs: 15,
            reconnect: RetryConfig::default(),
        }
    }
}

impl FeedConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// CLI configuration file: account credentials plus optional feed tuning.
///
/// Read from `~/.config/notify-feed/config.json`:
///
/// ```json
/// {
///   "account_id": "main",
///   "host": "misskey.example",
///   "api_token": "...",
///   "feed": { "page_limit": 40, "poll_interval_secs": 15 }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default = "default_account_id")]
    pub account_id: String,
    pub host: String,
    pub api_token: String,
    #[serde(default)]
    pub feed: FeedConfig,
}

fn default_account_id() -> String {
    "main".to_string()
}

impl CliConfig {
    pub fn path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("notify-feed")
            .join("config.json")
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path())
    }

    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        if config.host.is_empty() {
            return Err(anyhow!("config file {} has an empty host", path.display()));
        }
        Ok(config)
    }

    pub fn account(&self) -> Account {
        Account::new(self.account_id.clone(), self.host.clone(), self.api_token.clone())
    }
}
