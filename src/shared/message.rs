//! Chat Message Data Structure
//!
//! Represents one entry of the shared chat log, plus the wire shape used by
//! the remote authority's `/chat-messages` endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use uuid::Uuid;

static MESSAGE_SEQUENCE: AtomicU32 = AtomicU32::new(0);

/// Kind of chat message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Written by a user
    #[default]
    Text,
    /// Generated by the engine (join/leave notices)
    System,
}

/// Represents a chat message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    /// Unique message ID, assigned once at local creation
    pub id: String,
    /// Author's presence id
    pub author_id: String,
    /// Author's display name at the time of writing
    pub author_name: String,
    /// Author's opaque avatar reference
    #[serde(default)]
    pub author_avatar_ref: String,
    /// Message text
    pub body: String,
    /// When the message was written
    pub timestamp: DateTime<Utc>,
    /// Type of message
    #[serde(default)]
    pub kind: MessageKind,
}

/// Everything a message needs except its id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    pub author_id: String,
    pub author_name: String,
    pub author_avatar_ref: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
    pub kind: MessageKind,
}

impl MessageDraft {
    /// Draft a text message stamped with the current time
    pub fn text(
        author_id: impl Into<String>,
        author_name: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            author_id: author_id.into(),
            author_name: author_name.into(),
            author_avatar_ref: String::new(),
            body: body.into(),
            timestamp: Utc::now(),
            kind: MessageKind::Text,
        }
    }

    /// Set the author's avatar reference
    pub fn with_avatar(mut self, avatar_ref: impl Into<String>) -> Self {
        self.author_avatar_ref = avatar_ref.into();
        self
    }

    /// Turn the draft into a message with a freshly minted id
    pub fn into_message(self) -> ChatMessage {
        ChatMessage {
            id: new_message_id(),
            author_id: self.author_id,
            author_name: self.author_name,
            author_avatar_ref: self.author_avatar_ref,
            body: self.body,
            timestamp: self.timestamp,
            kind: self.kind,
        }
    }
}

/// Mint a message id: millisecond clock, process sequence, random suffix.
///
/// The sequence keeps ids minted in the same millisecond distinct within a
/// process; the random suffix keeps them distinct across devices.
pub fn new_message_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let sequence = MESSAGE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let random = Uuid::new_v4().simple().to_string();
    format!("{}-{:04x}{}", millis, sequence & 0xffff, &random[..9])
}

/// `/chat-messages` payload as the remote authority names its fields
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WireChatMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    pub user_name: String,
    #[serde(default)]
    pub user_avatar: Option<String>,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
}

impl From<&ChatMessage> for WireChatMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            id: Some(msg.id.clone()),
            user_id: msg.author_id.clone(),
            user_name: msg.author_name.clone(),
            user_avatar: Some(msg.author_avatar_ref.clone()),
            message: msg.body.clone(),
            timestamp: msg.timestamp,
            kind: msg.kind,
        }
    }
}

impl WireChatMessage {
    /// Everything that distinguishes one record from another, minus the id
    fn content_key(&self) -> String {
        let kind = match self.kind {
            MessageKind::Text => "text",
            MessageKind::System => "system",
        };
        format!(
            "{}\u{1f}{}\u{1f}{}\u{1f}{}",
            self.timestamp.to_rfc3339(),
            self.user_id,
            kind,
            self.message
        )
    }

    /// Name-based id for the `occurrence`-th record with this content
    fn fallback_id(&self, content_key: &str, occurrence: u32) -> String {
        let name = format!("{}\u{1f}{}", content_key, occurrence);
        let digest = Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
            .simple()
            .to_string();
        format!("{}-{}", self.timestamp.timestamp_millis(), &digest[..16])
    }

    fn into_message(self, id: String) -> ChatMessage {
        ChatMessage {
            id,
            author_id: self.user_id,
            author_name: self.user_name,
            author_avatar_ref: self.user_avatar.unwrap_or_default(),
            body: self.message,
            timestamp: self.timestamp,
            kind: self.kind,
        }
    }
}

impl From<WireChatMessage> for ChatMessage {
    fn from(wire: WireChatMessage) -> Self {
        match wire.id.clone() {
            Some(id) => wire.into_message(id),
            None => {
                let id = wire.fallback_id(&wire.content_key(), 0);
                wire.into_message(id)
            }
        }
    }
}

/// Convert a `/chat-messages` snapshot
///
/// Records without an id get one derived from their content, so the same
/// snapshot always converts to the same ids. Identical id-less records are
/// numbered in snapshot order.
pub fn messages_from_wire(snapshot: Vec<WireChatMessage>) -> Vec<ChatMessage> {
    let mut seen: HashMap<String, u32> = HashMap::new();
    snapshot
        .into_iter()
        .map(|wire| match wire.id.clone() {
            Some(id) => wire.into_message(id),
            None => {
                let key = wire.content_key();
                let occurrence = seen.entry(key.clone()).or_insert(0);
                let id = wire.fallback_id(&key, *occurrence);
                *occurrence += 1;
                wire.into_message(id)
            }
        })
        .collect()
}
