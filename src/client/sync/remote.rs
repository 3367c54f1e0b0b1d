//! Remote Sync Client
//!
//! Bounded reads and writes of the roster and chat log against the remote
//! authority. Nothing fails across this boundary: every error is logged and
//! reduced to an empty list or `false`. While sync is disabled no request is
//! issued at all.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::client::config::Config;
use crate::client::sync::SyncFlag;
use crate::shared::error::{SyncError, SyncResult};
use crate::shared::message::{messages_from_wire, WireChatMessage};
use crate::shared::presence::WirePresence;
use crate::shared::{ChatMessage, PresenceEntry};

const ROSTER_PATH: &str = "/online-users";
const MESSAGES_PATH: &str = "/chat-messages";

/// HTTP client for the remote authority's roster and chat endpoints
#[derive(Debug, Clone)]
pub struct RemoteSyncClient {
    config: Config,
    client: Client,
    enabled: SyncFlag,
}

impl RemoteSyncClient {
    pub fn new(config: Config, enabled: SyncFlag) -> Self {
        Self {
            config,
            client: Client::new(),
            enabled,
        }
    }

    /// Whether requests would currently be issued
    pub fn is_active(&self) -> bool {
        self.enabled.is_enabled() && self.config.server_url().is_some()
    }

    /// Full roster snapshot, `[]` on any failure
    pub async fn fetch_roster(&self) -> Vec<PresenceEntry> {
        if !self.is_active() {
            return Vec::new();
        }
        match self.fetch_list::<WirePresence>(ROSTER_PATH).await {
            Ok(wire) => wire.into_iter().map(PresenceEntry::from).collect(),
            Err(e) => {
                tracing::warn!("Failed to fetch roster: {}", e);
                Vec::new()
            }
        }
    }

    /// Full chat log snapshot, `[]` on any failure
    pub async fn fetch_messages(&self) -> Vec<ChatMessage> {
        if !self.is_active() {
            return Vec::new();
        }
        match self.fetch_list::<WireChatMessage>(MESSAGES_PATH).await {
            Ok(wire) => messages_from_wire(wire),
            Err(e) => {
                tracing::warn!("Failed to fetch chat messages: {}", e);
                Vec::new()
            }
        }
    }

    /// Upsert one roster entry
    pub async fn push_presence(&self, entry: &PresenceEntry) -> bool {
        if !self.is_active() {
            return false;
        }
        match self.post(ROSTER_PATH, &WirePresence::from(entry)).await {
            Ok(()) => {
                tracing::debug!("Pushed presence for {}", entry.id);
                true
            }
            Err(e) => {
                tracing::warn!("Failed to push presence for {}: {}", entry.id, e);
                false
            }
        }
    }

    /// Append one message; the server may assign its own delivery id
    pub async fn push_message(&self, msg: &ChatMessage) -> bool {
        if !self.is_active() {
            return false;
        }
        match self.post(MESSAGES_PATH, &WireChatMessage::from(msg)).await {
            Ok(()) => {
                tracing::debug!("Pushed message {}", msg.id);
                true
            }
            Err(e) => {
                tracing::warn!("Failed to push message {}: {}", msg.id, e);
                false
            }
        }
    }

    fn url(&self, path: &str) -> SyncResult<String> {
        self.config
            .api_url(path)
            .ok_or_else(|| SyncError::network("no remote authority configured"))
    }

    fn bound(&self) -> Duration {
        self.config.request_timeout()
    }

    async fn fetch_list<W: DeserializeOwned>(&self, path: &str) -> SyncResult<Vec<W>> {
        let url = self.url(path)?;
        let bound = self.bound();

        let body = tokio::time::timeout(bound, async {
            let response = self.client.get(&url).send().await?;
            if !response.status().is_success() {
                return Err(SyncError::network(format!(
                    "GET {} returned {}",
                    path,
                    response.status()
                )));
            }
            Ok(response.json::<serde_json::Value>().await?)
        })
        .await
        .map_err(|_| SyncError::timeout(format!("GET {}", path), bound))??;

        if !body.is_array() {
            tracing::warn!("GET {} returned a non-array payload; treating as empty", path);
            return Ok(Vec::new());
        }

        serde_json::from_value(body).map_err(|e| SyncError::malformed(path, e.to_string()))
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> SyncResult<()> {
        let url = self.url(path)?;
        let bound = self.bound();

        let response = tokio::time::timeout(bound, self.client.post(&url).json(body).send())
            .await
            .map_err(|_| SyncError::timeout(format!("POST {}", path), bound))??;

        if !response.status().is_success() {
            return Err(SyncError::network(format!(
                "POST {} returned {}",
                path,
                response.status()
            )));
        }
        Ok(())
    }
}
