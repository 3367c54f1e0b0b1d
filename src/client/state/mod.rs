//! Session state shared by the presence manager, the chat log and the
//! reconciliation loop.
//!
//! One instance per session, handed around as `Arc<SessionState>`.
//! Subscribers learn about changes through a broadcast channel instead of
//! polling.

use tokio::sync::{broadcast, RwLock};

use crate::client::local_store::{LocalStateStore, StoreKey};
use crate::client::sync::SyncFlag;
use crate::shared::{ChangeSource, ChatMessage, PresenceEntry, StateEvent};

const EVENT_CAPACITY: usize = 256;

/// Mutable part of the session
#[derive(Debug, Default, Clone)]
pub struct StateInner {
    /// Raw roster, including entries consumers should not see
    pub roster: Vec<PresenceEntry>,
    pub messages: Vec<ChatMessage>,
    pub identity: Option<PresenceEntry>,
    pub presence_enabled: bool,
}

impl StateInner {
    /// Insert or replace the entry with the same id
    pub fn upsert_roster(&mut self, entry: PresenceEntry) {
        match self.roster.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry,
            None => self.roster.push(entry),
        }
    }

    pub fn remove_from_roster(&mut self, id: &str) {
        self.roster.retain(|e| e.id != id);
    }
}

/// Roster, chat log, identity and presence flag of one session
#[derive(Debug)]
pub struct SessionState {
    inner: RwLock<StateInner>,
    store: LocalStateStore,
    events: broadcast::Sender<StateEvent>,
    sync: SyncFlag,
}

impl SessionState {
    pub fn new(store: LocalStateStore, sync: SyncFlag) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: RwLock::new(StateInner::default()),
            store,
            events,
            sync,
        }
    }

    /// Receive every change notification from now on
    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.events.subscribe()
    }

    pub fn sync_flag(&self) -> &SyncFlag {
        &self.sync
    }

    pub fn store(&self) -> &LocalStateStore {
        &self.store
    }

    /// Raw roster as held, including disabled or offline entries
    pub async fn roster(&self) -> Vec<PresenceEntry> {
        self.inner.read().await.roster.clone()
    }

    /// Roster entries that are both presence-enabled and online
    pub async fn visible_roster(&self) -> Vec<PresenceEntry> {
        self.inner
            .read()
            .await
            .roster
            .iter()
            .filter(|e| e.is_visible())
            .cloned()
            .collect()
    }

    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.inner.read().await.messages.clone()
    }

    pub async fn identity(&self) -> Option<PresenceEntry> {
        self.inner.read().await.identity.clone()
    }

    pub async fn presence_enabled(&self) -> bool {
        self.inner.read().await.presence_enabled
    }

    /// Copy of the whole mutable state
    pub async fn snapshot(&self) -> StateInner {
        self.inner.read().await.clone()
    }

    /// Load identity and presence flag from the local store
    pub async fn restore_identity(&self) {
        let identity = self.store.load_identity();
        let presence_enabled = self.store.load_presence_enabled().unwrap_or(false);
        let restored = identity.is_some();
        {
            let mut inner = self.inner.write().await;
            inner.identity = identity;
            inner.presence_enabled = presence_enabled;
        }
        if restored {
            tracing::debug!("Restored identity (presence enabled: {})", presence_enabled);
            self.notify(StateEvent::IdentityChanged);
        }
    }

    /// Load roster and chat log from the local store
    pub async fn restore_collections(&self) {
        let roster = self.store.load_roster().unwrap_or_default();
        let messages = self.store.load_messages().unwrap_or_default();
        tracing::debug!(
            "Restored {} roster entries and {} messages from local store",
            roster.len(),
            messages.len()
        );
        self.replace_roster(roster, ChangeSource::Restore).await;
        self.replace_messages(messages, ChangeSource::Restore).await;
    }

    /// Replace the roster wholesale if it differs from the held one
    pub async fn replace_roster(&self, roster: Vec<PresenceEntry>, source: ChangeSource) -> bool {
        {
            let mut inner = self.inner.write().await;
            if inner.roster == roster {
                return false;
            }
            inner.roster = roster;
        }
        if source != ChangeSource::Restore {
            self.persist(&[StoreKey::Roster]).await;
        }
        self.notify(StateEvent::RosterChanged(source));
        true
    }

    /// Replace the chat log wholesale if it differs from the held one
    pub async fn replace_messages(&self, messages: Vec<ChatMessage>, source: ChangeSource) -> bool {
        {
            let mut inner = self.inner.write().await;
            if inner.messages == messages {
                return false;
            }
            inner.messages = messages;
        }
        if source != ChangeSource::Restore {
            self.persist(&[StoreKey::ChatLog]).await;
        }
        self.notify(StateEvent::MessagesChanged(source));
        true
    }

    /// Run a mutation under the write lock
    pub(crate) async fn mutate<R>(&self, f: impl FnOnce(&mut StateInner) -> R) -> R {
        let mut inner = self.inner.write().await;
        f(&mut inner)
    }

    /// Write the given keys' current values to the local store
    pub(crate) async fn persist(&self, keys: &[StoreKey]) {
        let inner = self.inner.read().await;
        for key in keys {
            match key {
                StoreKey::Roster => {
                    self.store.save_roster(&inner.roster);
                }
                StoreKey::ChatLog => {
                    self.store.save_messages(&inner.messages);
                }
                StoreKey::Identity => {
                    if let Some(identity) = &inner.identity {
                        self.store.save_identity(identity);
                    }
                }
                StoreKey::PresenceEnabled => {
                    self.store.save_presence_enabled(inner.presence_enabled);
                }
            }
        }
    }

    pub(crate) fn notify(&self, event: StateEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
