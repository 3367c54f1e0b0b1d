use std::path::PathBuf;
use std::time::Duration;

use crate::shared::config::{AppConfig, AppConfigBuilder, ConfigError, RetryPolicy};

/// Environment variable naming the remote authority
pub const SERVER_URL_ENV: &str = "SYNC_API_URL";
/// Environment variable overriding the local state directory
pub const DATA_DIR_ENV: &str = "SYNC_DATA_DIR";

/// Client configuration wrapper.
#[derive(Debug, Clone)]
pub struct Config {
    app: AppConfig,
}

impl Default for Config {
    fn default() -> Self {
        match Self::with_builder(Self::env_builder(AppConfig::builder())) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring invalid sync configuration from environment: {}", e);
                Self { app: AppConfig::default() }
            }
        }
    }
}

impl Config {
    /// Create a new configuration from the environment
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builder(builder: AppConfigBuilder) -> Result<Self, ConfigError> {
        let app = builder.build()?;
        Ok(Self { app })
    }

    /// Layer environment overrides on top of an existing builder
    pub fn env_builder(mut builder: AppConfigBuilder) -> AppConfigBuilder {
        if let Ok(url) = std::env::var(SERVER_URL_ENV) {
            builder = builder.server_url(url);
        }
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            builder = builder.data_dir(dir);
        }
        builder
    }

    /// Configuration with no remote authority
    pub fn local_only() -> Self {
        Self { app: AppConfig::default() }
    }

    /// Get the full URL for an API endpoint, if a remote is configured
    pub fn api_url(&self, path: &str) -> Option<String> {
        self.server_url().map(|base| format!("{}{}", base, path))
    }

    pub fn server_url(&self) -> Option<&str> {
        self.app.server_url.as_deref()
    }

    pub fn request_timeout(&self) -> Duration {
        self.app.request_timeout
    }

    pub fn poll_interval(&self) -> Duration {
        self.app.poll_interval
    }

    pub fn health_interval(&self) -> Duration {
        self.app.health_interval
    }

    pub fn push_retry(&self) -> RetryPolicy {
        self.app.push_retry
    }

    /// Directory for local state files
    ///
    /// Falls back to the platform data directory, then the temp directory.
    pub fn data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.app.data_dir {
            return dir.clone();
        }
        let mut path = dirs::data_dir().unwrap_or_else(std::env::temp_dir);
        path.push("nutrisync");
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_local_only_has_no_api_url() {
        let config = Config::local_only();
        assert!(config.server_url().is_none());
        assert!(config.api_url("/health").is_none());
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_api_url() {
        let config =
            Config::with_builder(AppConfig::builder().server_url("http://127.0.0.1:3001/"))
                .unwrap();
        assert_eq!(
            config.api_url("/online-users").as_deref(),
            Some("http://127.0.0.1:3001/online-users")
        );
    }

    #[test]
    fn test_data_dir_override() {
        let config = Config::with_builder(AppConfig::builder().data_dir("/tmp/nutri")).unwrap();
        assert_eq!(config.data_dir(), PathBuf::from("/tmp/nutri"));
        assert!(Config::local_only().data_dir().ends_with("nutrisync"));
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        std::env::set_var(SERVER_URL_ENV, "http://sync.local:9000");
        std::env::set_var(DATA_DIR_ENV, "/tmp/nutrisync-env");
        let config = Config::new();
        std::env::remove_var(SERVER_URL_ENV);
        std::env::remove_var(DATA_DIR_ENV);

        assert_eq!(config.server_url(), Some("http://sync.local:9000"));
        assert_eq!(config.data_dir(), PathBuf::from("/tmp/nutrisync-env"));
    }

    #[test]
    #[serial]
    fn test_invalid_env_url_degrades_to_local_only() {
        std::env::set_var(SERVER_URL_ENV, "::nonsense::");
        let config = Config::new();
        std::env::remove_var(SERVER_URL_ENV);

        assert!(config.server_url().is_none());
    }
}
