//! # Push Replication
//!
//! Best-effort asynchronous replication of local mutations. Each push runs
//! as its own task; the caller never waits for an acknowledgment and a
//! failed push never rolls back the local change.
//!
//! ## Features
//!
//! - **Fire-and-forget**: pushes are spawned, not awaited
//! - **Bounded retry**: optional [`RetryPolicy`] with fixed or capped
//!   exponential delay
//! - **Flush**: in-flight pushes can be awaited at shutdown or in tests

use std::sync::{Arc, Mutex};

use tokio::task::JoinSet;

use crate::client::sync::RemoteSyncClient;
use crate::shared::config::RetryPolicy;
use crate::shared::{ChatMessage, PresenceEntry};

#[derive(Debug, Clone)]
enum Payload {
    Presence(PresenceEntry),
    Message(ChatMessage),
}

impl Payload {
    fn describe(&self) -> String {
        match self {
            Payload::Presence(entry) => format!("presence {}", entry.id),
            Payload::Message(msg) => format!("message {}", msg.id),
        }
    }
}

/// Spawns and tracks push tasks
#[derive(Debug, Clone)]
pub struct Replicator {
    remote: RemoteSyncClient,
    policy: RetryPolicy,
    in_flight: Arc<Mutex<JoinSet<bool>>>,
}

impl Replicator {
    pub fn new(remote: RemoteSyncClient, policy: RetryPolicy) -> Self {
        Self {
            remote,
            policy,
            in_flight: Arc::new(Mutex::new(JoinSet::new())),
        }
    }

    /// Replicate a roster entry without waiting
    pub fn push_presence(&self, entry: PresenceEntry) {
        self.spawn(Payload::Presence(entry));
    }

    /// Replicate a chat message without waiting
    pub fn push_message(&self, msg: ChatMessage) {
        self.spawn(Payload::Message(msg));
    }

    /// Wait for every in-flight push; returns how many succeeded
    pub async fn flush(&self) -> usize {
        let mut tasks = match self.in_flight.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(_) => return 0,
        };

        let mut delivered = 0;
        while let Some(result) = tasks.join_next().await {
            if matches!(result, Ok(true)) {
                delivered += 1;
            }
        }
        delivered
    }

    fn spawn(&self, payload: Payload) {
        let remote = self.remote.clone();
        let policy = self.policy;

        let Ok(mut tasks) = self.in_flight.lock() else {
            tracing::error!("Push tracker poisoned; dropping {}", payload.describe());
            return;
        };
        while tasks.try_join_next().is_some() {}
        tasks.spawn(deliver(remote, policy, payload));
    }
}

async fn deliver(remote: RemoteSyncClient, policy: RetryPolicy, payload: Payload) -> bool {
    let attempts = policy.max_attempts();

    for attempt in 1..=attempts {
        let delivered = match &payload {
            Payload::Presence(entry) => remote.push_presence(entry).await,
            Payload::Message(msg) => remote.push_message(msg).await,
        };
        if delivered {
            return true;
        }
        if !remote.is_active() {
            break;
        }
        if attempt < attempts {
            let delay = policy.delay_after(attempt);
            tracing::debug!(
                "Retrying {} in {:?} (attempt {}/{})",
                payload.describe(),
                delay,
                attempt + 1,
                attempts
            );
            tokio::time::sleep(delay).await;
        }
    }

    tracing::warn!("Giving up on {}", payload.describe());
    false
}
