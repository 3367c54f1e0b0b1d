//! Shared Module
//!
//! Data model and ambient types used by every part of the sync engine:
//! roster entries, chat messages, their wire shapes, state-change events,
//! the error taxonomy, and configuration.

/// Chat message data structure
pub mod message;

/// Presence roster data structures
pub mod presence;

/// State change notifications
pub mod event;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use message::{ChatMessage, MessageDraft, MessageKind};
pub use presence::{AvatarView, IdentityInput, PresenceEntry, PresencePatch};
pub use event::{ChangeSource, StateEvent, SystemNotice};
pub use error::{SyncError, SyncResult};
pub use config::{AppConfig, AppConfigBuilder, ConfigError, RetryPolicy};
