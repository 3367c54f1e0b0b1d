//! # Local State Store
//!
//! Synchronous key/value persistence for the four data sets the engine keeps
//! across restarts: the presence roster, the chat log, the device's own
//! identity, and its presence flag.
//!
//! ## Key Components
//!
//! - `KeyValueStore`: raw string storage behind one of the four [`StoreKey`]s
//! - `file.rs`: JSON file per key under the data directory
//! - `memory.rs`: in-process map, for tests and ephemeral sessions
//! - `LocalStateStore`: typed access with the failure policy applied
//!
//! There is no transaction across keys; a crash between two saves can leave
//! them inconsistent.
//!
//! ## Usage
//!
//! ```rust
//! use nutrisync::client::local_store::{LocalStateStore, MemoryStore};
//!
//! let store = LocalStateStore::new(MemoryStore::new());
//! store.save_presence_enabled(true);
//! assert_eq!(store.load_presence_enabled(), Some(true));
//! ```

pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::shared::error::SyncResult;
use crate::shared::{ChatMessage, PresenceEntry};

/// The four logical keys persisted by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    Roster,
    ChatLog,
    Identity,
    PresenceEnabled,
}

impl StoreKey {
    pub const ALL: [StoreKey; 4] = [
        StoreKey::Roster,
        StoreKey::ChatLog,
        StoreKey::Identity,
        StoreKey::PresenceEnabled,
    ];

    /// Storage name of the key
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKey::Roster => "onlineUsers",
            StoreKey::ChatLog => "chatMessages",
            StoreKey::Identity => "currentUser",
            StoreKey::PresenceEnabled => "presenceEnabled",
        }
    }
}

/// Raw synchronous key/value storage
pub trait KeyValueStore: Send + Sync {
    fn save(&self, key: StoreKey, value: &str) -> SyncResult<()>;
    fn load(&self, key: StoreKey) -> SyncResult<Option<String>>;
}

/// Typed access to the persisted state
///
/// Every failure (I/O, encode, decode) is logged and reduced to "not saved"
/// or "absent"; callers never see an error.
pub struct LocalStateStore {
    backend: Box<dyn KeyValueStore>,
}

impl std::fmt::Debug for LocalStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStateStore").finish_non_exhaustive()
    }
}

impl LocalStateStore {
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    /// Store that forgets everything when dropped
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    pub fn save_roster(&self, roster: &[PresenceEntry]) -> bool {
        self.save_json(StoreKey::Roster, &roster)
    }

    pub fn load_roster(&self) -> Option<Vec<PresenceEntry>> {
        self.load_json(StoreKey::Roster)
    }

    pub fn save_messages(&self, messages: &[ChatMessage]) -> bool {
        self.save_json(StoreKey::ChatLog, &messages)
    }

    pub fn load_messages(&self) -> Option<Vec<ChatMessage>> {
        self.load_json(StoreKey::ChatLog)
    }

    pub fn save_identity(&self, identity: &PresenceEntry) -> bool {
        self.save_json(StoreKey::Identity, identity)
    }

    pub fn load_identity(&self) -> Option<PresenceEntry> {
        self.load_json(StoreKey::Identity)
    }

    pub fn save_presence_enabled(&self, enabled: bool) -> bool {
        self.save_json(StoreKey::PresenceEnabled, &enabled)
    }

    pub fn load_presence_enabled(&self) -> Option<bool> {
        self.load_json(StoreKey::PresenceEnabled)
    }

    fn save_json<T: Serialize + ?Sized>(&self, key: StoreKey, value: &T) -> bool {
        let result = serde_json::to_string(value)
            .map_err(Into::into)
            .and_then(|json| self.backend.save(key, &json));
        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to persist {}: {}", key.as_str(), e);
                false
            }
        }
    }

    fn load_json<T: DeserializeOwned>(&self, key: StoreKey) -> Option<T> {
        let raw = match self.backend.load(key) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", key.as_str(), e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Discarding unreadable {}: {}", key.as_str(), e);
                None
            }
        }
    }
}
