//! Presence Manager
//!
//! Owns the device's identity and presence flag, mirrors the identity into
//! the roster while presence is enabled, and announces join/leave
//! transitions as `system` chat messages.
//!
//! State machine per actor:
//!
//! ```text
//! Disabled --initialize / toggle--> Enabled
//! Enabled  --toggle---------------> Disabled
//! Enabled  --update_current-------> Enabled
//! ```

use std::sync::Arc;

use chrono::Utc;

use crate::client::chat_log::ChatMessageLog;
use crate::client::local_store::StoreKey;
use crate::client::state::SessionState;
use crate::client::sync::Replicator;
use crate::shared::{
    ChangeSource, IdentityInput, MessageDraft, MessageKind, PresenceEntry, PresencePatch,
    StateEvent, SystemNotice,
};

const IDENTITY_KEYS: [StoreKey; 3] = [
    StoreKey::Identity,
    StoreKey::PresenceEnabled,
    StoreKey::Roster,
];

/// Presence operations for the local actor
#[derive(Debug, Clone)]
pub struct PresenceManager {
    state: Arc<SessionState>,
    chat: ChatMessageLog,
    replicator: Replicator,
}

impl PresenceManager {
    pub fn new(state: Arc<SessionState>, chat: ChatMessageLog, replicator: Replicator) -> Self {
        Self {
            state,
            chat,
            replicator,
        }
    }

    /// Establish the local identity and announce the join
    pub async fn initialize(&self, input: IdentityInput) -> PresenceEntry {
        let entry = input.into_entry();

        self.state
            .mutate(|inner| {
                inner.identity = Some(entry.clone());
                inner.presence_enabled = true;
                inner.upsert_roster(entry.clone());
            })
            .await;
        self.state.persist(&IDENTITY_KEYS).await;
        self.state.notify(StateEvent::IdentityChanged);
        self.state
            .notify(StateEvent::RosterChanged(ChangeSource::Local));

        tracing::info!("Presence initialized for {}", entry.id);
        self.push_if_enabled(&entry);
        self.announce(&entry, SystemNotice::Joined {
            name: entry.display_name.clone(),
        })
        .await;
        entry
    }

    /// Flip the presence flag; returns the new value
    ///
    /// Either transition is pushed while sync is enabled. Off removes the
    /// identity from the local roster only.
    pub async fn toggle(&self) -> bool {
        let (enabled, identity) = self
            .state
            .mutate(|inner| {
                inner.presence_enabled = !inner.presence_enabled;
                let enabled = inner.presence_enabled;
                if let Some(identity) = inner.identity.as_mut() {
                    identity.presence_enabled = enabled;
                    if enabled {
                        identity.is_online = true;
                        identity.last_seen = Utc::now();
                    }
                }
                match inner.identity.clone() {
                    Some(identity) if enabled => inner.upsert_roster(identity),
                    Some(identity) => inner.remove_from_roster(&identity.id),
                    None => {}
                }
                (enabled, inner.identity.clone())
            })
            .await;
        self.state.persist(&IDENTITY_KEYS).await;
        self.state.notify(StateEvent::PresenceToggled(enabled));

        let Some(identity) = identity else {
            tracing::debug!("Presence toggled to {} without an identity", enabled);
            return enabled;
        };
        self.state
            .notify(StateEvent::RosterChanged(ChangeSource::Local));

        // Opting out is an upsert with the flag cleared; the remote entry is never deleted.
        self.push_if_enabled(&identity);
        let notice = if enabled {
            SystemNotice::Joined {
                name: identity.display_name.clone(),
            }
        } else {
            SystemNotice::Left {
                name: identity.display_name.clone(),
            }
        };
        let label = if enabled { "on" } else { "off" };
        tracing::info!("Presence for {} is now {}", identity.id, label);
        self.announce(&identity, notice).await;
        enabled
    }

    /// Merge a partial update into the identity and its roster entry
    ///
    /// Returns the updated identity, or `None` when no identity exists yet.
    pub async fn update_current(&self, patch: PresencePatch) -> Option<PresenceEntry> {
        let updated = self
            .state
            .mutate(|inner| {
                let identity = inner.identity.as_mut()?;
                identity.apply(&patch);
                let identity = identity.clone();
                if let Some(existing) = inner.roster.iter_mut().find(|e| e.id == identity.id) {
                    *existing = identity.clone();
                }
                Some(identity)
            })
            .await;

        let Some(identity) = updated else {
            tracing::warn!("Ignoring presence update before an identity exists");
            return None;
        };
        self.state.persist(&IDENTITY_KEYS).await;
        self.state.notify(StateEvent::IdentityChanged);
        self.state
            .notify(StateEvent::RosterChanged(ChangeSource::Local));
        self.push_if_enabled(&identity);
        Some(identity)
    }

    /// Re-announce a restored identity as online, without a chat notice
    pub async fn resume(&self) -> Option<PresenceEntry> {
        let resumed = self
            .state
            .mutate(|inner| {
                if !inner.presence_enabled {
                    return None;
                }
                let identity = inner.identity.as_mut()?;
                identity.is_online = true;
                identity.presence_enabled = true;
                identity.last_seen = Utc::now();
                let identity = identity.clone();
                inner.upsert_roster(identity.clone());
                Some(identity)
            })
            .await?;

        self.state.persist(&IDENTITY_KEYS).await;
        self.state
            .notify(StateEvent::RosterChanged(ChangeSource::Local));
        self.push_if_enabled(&resumed);
        Some(resumed)
    }

    /// Push an offline copy of the identity; local state is left as is
    pub async fn announce_offline(&self) {
        let Some(mut identity) = self.state.identity().await else {
            return;
        };
        if !self.state.sync_flag().is_enabled() {
            return;
        }
        identity.is_online = false;
        identity.last_seen = Utc::now();
        self.replicator.push_presence(identity);
    }

    pub async fn current(&self) -> Option<PresenceEntry> {
        self.state.identity().await
    }

    pub async fn is_enabled(&self) -> bool {
        self.state.presence_enabled().await
    }

    fn push_if_enabled(&self, entry: &PresenceEntry) {
        if self.state.sync_flag().is_enabled() {
            self.replicator.push_presence(entry.clone());
        }
    }

    async fn announce(&self, actor: &PresenceEntry, notice: SystemNotice) {
        let draft = MessageDraft {
            author_id: actor.id.clone(),
            author_name: actor.display_name.clone(),
            author_avatar_ref: actor.avatar_ref.clone(),
            body: notice.to_string(),
            timestamp: Utc::now(),
            kind: MessageKind::System,
        };
        self.chat.append(draft).await;
    }
}
