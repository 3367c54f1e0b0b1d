//! Application configuration module
//!
//! Provides the configuration for the sync engine: where the remote authority
//! lives, how long network calls may take, how often to poll, and where local
//! state is kept.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Bound applied to every network call
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Period of the reconciliation loop
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Period of the status-indicator health probe
pub const DEFAULT_HEALTH_INTERVAL: Duration = Duration::from_secs(30);

/// Re-attempt policy for best-effort pushes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryPolicy {
    /// Single attempt, failure is only logged
    #[default]
    None,
    /// Fixed delay between attempts
    Fixed {
        /// Total attempts including the first
        attempts: u32,
        /// Delay between attempts
        delay: Duration,
    },
    /// Doubling delay between attempts, capped
    Exponential {
        /// Total attempts including the first
        attempts: u32,
        /// Delay before the second attempt
        base: Duration,
        /// Upper bound for any single delay
        max: Duration,
    },
}

impl RetryPolicy {
    /// Total attempts allowed by this policy
    pub fn max_attempts(&self) -> u32 {
        match self {
            RetryPolicy::None => 1,
            RetryPolicy::Fixed { attempts, .. } | RetryPolicy::Exponential { attempts, .. } => {
                (*attempts).max(1)
            }
        }
    }

    /// Delay to wait after the given failed attempt (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self {
            RetryPolicy::None => Duration::ZERO,
            RetryPolicy::Fixed { delay, .. } => *delay,
            RetryPolicy::Exponential { base, max, .. } => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                base.saturating_mul(factor).min(*max)
            }
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the remote authority; `None` means local-only operation
    pub server_url: Option<String>,
    /// Bound applied to every network call
    pub request_timeout: Duration,
    /// Reconciliation loop period
    pub poll_interval: Duration,
    /// Health monitor period
    pub health_interval: Duration,
    /// Directory for the local state files
    pub data_dir: Option<PathBuf>,
    /// Push re-attempt policy
    pub push_retry: RetryPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            health_interval: DEFAULT_HEALTH_INTERVAL,
            data_dir: None,
            push_retry: RetryPolicy::None,
        }
    }
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.server_url {
            let parsed =
                reqwest::Url::parse(url).map_err(|_| ConfigError::InvalidUrl(url.clone()))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::InvalidUrl(url.clone()));
            }
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue("request_timeout"));
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::InvalidValue("poll_interval"));
        }
        if self.health_interval.is_zero() {
            return Err(ConfigError::InvalidValue("health_interval"));
        }
        Ok(())
    }

    /// Load a builder pre-filled from a TOML file
    ///
    /// ```toml
    /// server_url = "https://sync.example.org"
    /// request_timeout_ms = 10000
    /// poll_interval_ms = 5000
    /// data_dir = "/var/lib/nutrisync"
    /// ```
    pub fn builder_from_toml(path: &Path) -> Result<AppConfigBuilder, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Unreadable(format!("{}: {}", path.display(), e)))?;
        let file: FileConfig =
            toml::from_str(&content).map_err(|e| ConfigError::Unreadable(e.to_string()))?;
        Ok(file.into_builder())
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    server_url: Option<String>,
    request_timeout_ms: Option<u64>,
    poll_interval_ms: Option<u64>,
    health_interval_ms: Option<u64>,
    data_dir: Option<PathBuf>,
    push_attempts: Option<u32>,
}

impl FileConfig {
    fn into_builder(self) -> AppConfigBuilder {
        let mut builder = match self.server_url {
            Some(url) => AppConfigBuilder::default().server_url(url),
            None => AppConfigBuilder::default(),
        };
        builder.request_timeout = self.request_timeout_ms.map(Duration::from_millis);
        builder.poll_interval = self.poll_interval_ms.map(Duration::from_millis);
        builder.health_interval = self.health_interval_ms.map(Duration::from_millis);
        builder.data_dir = self.data_dir;
        builder.push_retry = self
            .push_attempts
            .filter(|attempts| *attempts > 1)
            .map(|attempts| RetryPolicy::Exponential {
                attempts,
                base: Duration::from_secs(1),
                max: Duration::from_secs(30),
            });
        builder
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    server_url: Option<String>,
    request_timeout: Option<Duration>,
    poll_interval: Option<Duration>,
    health_interval: Option<Duration>,
    data_dir: Option<PathBuf>,
    push_retry: Option<RetryPolicy>,
}

impl AppConfigBuilder {
    /// Set the server URL
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        let trimmed = url.trim().trim_end_matches('/');
        self.server_url = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    /// Set the per-request bound
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the reconciliation period
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Set the health monitor period
    pub fn health_interval(mut self, interval: Duration) -> Self {
        self.health_interval = Some(interval);
        self
    }

    /// Set the local state directory
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Set the push re-attempt policy
    pub fn push_retry(mut self, policy: RetryPolicy) -> Self {
        self.push_retry = Some(policy);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let defaults = AppConfig::default();
        let config = AppConfig {
            server_url: self.server_url,
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            poll_interval: self.poll_interval.unwrap_or(defaults.poll_interval),
            health_interval: self.health_interval.unwrap_or(defaults.health_interval),
            data_dir: self.data_dir,
            push_retry: self.push_retry.unwrap_or(defaults.push_retry),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("invalid value: {0}")]
    InvalidValue(&'static str),
    #[error("unreadable config: {0}")]
    Unreadable(String),
}
