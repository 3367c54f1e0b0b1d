//! Chat Message Log
//!
//! Append-only local log with push-through to the remote authority while
//! sync is enabled.

use std::sync::Arc;

use crate::client::local_store::StoreKey;
use crate::client::state::SessionState;
use crate::client::sync::Replicator;
use crate::shared::{ChangeSource, ChatMessage, MessageDraft, StateEvent};

/// Identity-stamped chat log of one session
#[derive(Debug, Clone)]
pub struct ChatMessageLog {
    state: Arc<SessionState>,
    replicator: Replicator,
}

impl ChatMessageLog {
    pub fn new(state: Arc<SessionState>, replicator: Replicator) -> Self {
        Self { state, replicator }
    }

    /// Append a message with a freshly minted id
    ///
    /// The local append is persisted before any push is attempted; a failed
    /// push is logged by the replicator and never undone here.
    pub async fn append(&self, draft: MessageDraft) -> ChatMessage {
        let msg = draft.into_message();

        self.state
            .mutate(|inner| inner.messages.push(msg.clone()))
            .await;
        self.state.persist(&[StoreKey::ChatLog]).await;
        self.state
            .notify(StateEvent::MessagesChanged(ChangeSource::Local));

        if self.state.sync_flag().is_enabled() {
            self.replicator.push_message(msg.clone());
        }
        msg
    }

    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.state.messages().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::config::Config;
    use crate::client::local_store::{LocalStateStore, MemoryStore};
    use crate::client::sync::{RemoteSyncClient, SyncFlag};
    use crate::shared::config::{AppConfig, RetryPolicy};
    use std::collections::HashSet;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn log_with(config: Config, enabled: bool, store: MemoryStore) -> ChatMessageLog {
        let flag = SyncFlag::new(enabled);
        let state = Arc::new(SessionState::new(LocalStateStore::new(store), flag.clone()));
        let replicator = Replicator::new(RemoteSyncClient::new(config, flag), RetryPolicy::None);
        ChatMessageLog::new(state, replicator)
    }

    #[tokio::test]
    async fn test_append_keeps_call_order_and_persists() {
        let store = MemoryStore::new();
        let log = log_with(Config::local_only(), false, store.clone());

        let first = log.append(MessageDraft::text("u1", "Ana", "one")).await;
        let second = log.append(MessageDraft::text("u1", "Ana", "two")).await;

        let bodies: Vec<String> = log.messages().await.into_iter().map(|m| m.body).collect();
        assert_eq!(bodies, vec!["one", "two"]);
        assert_ne!(first.id, second.id);
        assert_eq!(
            LocalStateStore::new(store).load_messages().map(|m| m.len()),
            Some(2)
        );
    }

    #[tokio::test]
    async fn test_rapid_appends_get_distinct_ids() {
        let log = log_with(Config::local_only(), false, MemoryStore::new());
        let mut ids = HashSet::new();
        for i in 0..200 {
            let msg = log.append(MessageDraft::text("u1", "Ana", format!("m{}", i))).await;
            ids.insert(msg.id);
        }
        assert_eq!(ids.len(), 200);
    }

    #[tokio::test]
    async fn test_failed_push_keeps_local_append() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat-messages"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;
        let config = Config::with_builder(
            AppConfig::builder()
                .server_url(server.uri())
                .request_timeout(Duration::from_secs(1)),
        )
        .unwrap();

        let log = log_with(config, true, MemoryStore::new());
        let msg = log.append(MessageDraft::text("u1", "Ana", "hello")).await;
        assert_eq!(log.replicator.flush().await, 0);

        assert_eq!(log.messages().await, vec![msg]);
    }
}
