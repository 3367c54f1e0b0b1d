//! # Network Monitor
//!
//! Reachability of the remote authority.
//!
//! - `ConnectivityProbe`: one bounded `GET /health`, no retries
//! - `HealthMonitor`: repeats the probe on a fixed period for the status
//!   indicator
//!
//! The two are deliberately uncoordinated: the startup probe seeds
//! `syncEnabled` once, the monitor only feeds [`SyncStatus`] and never flips
//! the enable flag.
//!
//! [`SyncStatus`]: super::SyncStatus

use std::time::Duration;

use reqwest::Client;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::client::config::Config;
use crate::shared::error::{SyncError, SyncResult};

const HEALTH_PATH: &str = "/health";

/// Bounded health check against the remote authority
#[derive(Debug, Clone)]
pub struct ConnectivityProbe {
    client: Client,
    health_url: Option<String>,
    timeout: Duration,
}

impl ConnectivityProbe {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            health_url: config.api_url(HEALTH_PATH),
            timeout: config.request_timeout(),
        }
    }

    /// `true` only for a success status within the bound
    pub async fn check(&self) -> bool {
        let Some(url) = self.health_url.as_deref() else {
            tracing::debug!("No remote authority configured; treating as unreachable");
            return false;
        };

        match self.try_check(url).await {
            Ok(()) => {
                tracing::info!("Remote authority reachable at {}", url);
                true
            }
            Err(e) => {
                tracing::warn!("Remote authority unreachable: {}", e);
                false
            }
        }
    }

    async fn try_check(&self, url: &str) -> SyncResult<()> {
        let response = tokio::time::timeout(self.timeout, self.client.get(url).send())
            .await
            .map_err(|_| SyncError::timeout(format!("GET {}", HEALTH_PATH), self.timeout))??;

        if !response.status().is_success() {
            return Err(SyncError::network(format!(
                "health check returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Periodic probe publishing the latest reachability
#[derive(Debug)]
pub struct HealthMonitor {
    receiver: watch::Receiver<Option<bool>>,
    task: JoinHandle<()>,
}

impl HealthMonitor {
    /// Start probing every `interval`
    ///
    /// `initial` is published until the first probe completes; the first
    /// probe runs one full interval after spawning.
    pub fn spawn(probe: ConnectivityProbe, interval: Duration, initial: Option<bool>) -> Self {
        let (sender, receiver) = watch::channel(initial);

        let task = tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let reachable = probe.check().await;
                sender.send_if_modified(|current| {
                    let changed = *current != Some(reachable);
                    if changed {
                        tracing::info!("Remote reachability changed: {}", reachable);
                    }
                    *current = Some(reachable);
                    changed
                });
                if sender.is_closed() {
                    break;
                }
            }
        });

        Self { receiver, task }
    }

    /// Latest published reachability
    pub fn latest(&self) -> Option<bool> {
        *self.receiver.borrow()
    }

    /// Watch reachability changes
    pub fn subscribe(&self) -> watch::Receiver<Option<bool>> {
        self.receiver.clone()
    }

    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::config::AppConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer, timeout: Duration) -> Config {
        Config::with_builder(
            AppConfig::builder()
                .server_url(server.uri())
                .request_timeout(timeout),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_probe_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let probe = ConnectivityProbe::new(&config_for(&server, Duration::from_secs(10)));
        assert!(probe.check().await);
    }

    #[tokio::test]
    async fn test_probe_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let probe = ConnectivityProbe::new(&config_for(&server, Duration::from_secs(10)));
        assert!(!probe.check().await);
    }

    #[tokio::test]
    async fn test_probe_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let probe = ConnectivityProbe::new(&config_for(&server, Duration::from_millis(100)));
        assert!(!probe.check().await);
    }

    #[tokio::test]
    async fn test_probe_without_remote() {
        let probe = ConnectivityProbe::new(&Config::local_only());
        assert!(!probe.check().await);
    }

    #[tokio::test]
    async fn test_monitor_publishes_probe_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let probe = ConnectivityProbe::new(&config_for(&server, Duration::from_secs(1)));
        let monitor = HealthMonitor::spawn(probe, Duration::from_millis(50), Some(false));
        assert_eq!(monitor.latest(), Some(false));

        let mut changes = monitor.subscribe();
        tokio::time::timeout(Duration::from_secs(5), changes.changed())
            .await
            .expect("monitor should publish within the timeout")
            .unwrap();
        assert_eq!(monitor.latest(), Some(true));
        monitor.stop();
    }
}
