/**
 * State Change Events
 *
 * Notifications broadcast by the session state to its subscribers, and the
 * presence notices the engine turns into `system` chat messages.
 */
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which part of the session state changed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeSource {
    /// Optimistic local mutation
    Local,
    /// Wholesale replace from a remote snapshot
    Remote,
    /// Restored from the local store at startup
    Restore,
}

/// Notification sent to session subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateEvent {
    /// The roster list changed
    RosterChanged(ChangeSource),
    /// The chat log changed
    MessagesChanged(ChangeSource),
    /// The local identity was set or patched
    IdentityChanged,
    /// The presence flag was flipped
    PresenceToggled(bool),
    /// Sync was enabled or disabled
    SyncEnabledChanged(bool),
}

impl StateEvent {
    /// Whether this event came from a reconciliation replace
    pub fn is_remote_replace(&self) -> bool {
        matches!(
            self,
            StateEvent::RosterChanged(ChangeSource::Remote)
                | StateEvent::MessagesChanged(ChangeSource::Remote)
        )
    }
}

/// Presence transition announced in the chat log
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemNotice {
    Joined { name: String },
    Left { name: String },
}

impl fmt::Display for SystemNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemNotice::Joined { name } => write!(f, "{} joined the chat", name),
            SystemNotice::Left { name } => write!(f, "{} left the chat", name),
        }
    }
}
