//! Presence Data Structures
//!
//! Roster entries, partial updates to them, and the `/online-users` wire
//! shape. The avatar stays an opaque string in the core model;
//! [`AvatarView`] classifies it at the rendering boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One member of the presence roster
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PresenceEntry {
    /// Stable per device/session
    pub id: String,
    pub display_name: String,
    /// URL, inline markup, or empty
    #[serde(default)]
    pub avatar_ref: String,
    pub is_online: bool,
    pub last_seen: DateTime<Utc>,
    /// Member has opted into being visible
    pub presence_enabled: bool,
}

impl PresenceEntry {
    /// Whether consumers of the roster should see this entry
    pub fn is_visible(&self) -> bool {
        self.presence_enabled && self.is_online
    }

    /// Apply a partial update; `id` and `presence_enabled` are never patched
    pub fn apply(&mut self, patch: &PresencePatch) {
        if let Some(name) = &patch.display_name {
            self.display_name = name.clone();
        }
        if let Some(avatar) = &patch.avatar_ref {
            self.avatar_ref = avatar.clone();
        }
        if let Some(online) = patch.is_online {
            self.is_online = online;
        }
        if let Some(last_seen) = patch.last_seen {
            self.last_seen = last_seen;
        }
    }
}

/// What a device supplies when it establishes its identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityInput {
    pub id: String,
    pub display_name: String,
    pub avatar_ref: Option<String>,
}

impl IdentityInput {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            avatar_ref: None,
        }
    }

    pub fn with_avatar(mut self, avatar_ref: impl Into<String>) -> Self {
        self.avatar_ref = Some(avatar_ref.into());
        self
    }

    /// Build the online, presence-enabled entry for this identity
    pub fn into_entry(self) -> PresenceEntry {
        PresenceEntry {
            id: self.id,
            display_name: self.display_name,
            avatar_ref: self.avatar_ref.unwrap_or_default(),
            is_online: true,
            last_seen: Utc::now(),
            presence_enabled: true,
        }
    }
}

/// Partial update to the current identity
///
/// Carries no presence flag: opting in or out goes through
/// `PresenceManager::toggle`, which keeps the session flag and the identity
/// in step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresencePatch {
    pub display_name: Option<String>,
    pub avatar_ref: Option<String>,
    pub is_online: Option<bool>,
    pub last_seen: Option<DateTime<Utc>>,
}

impl PresencePatch {
    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn avatar_ref(mut self, avatar: impl Into<String>) -> Self {
        self.avatar_ref = Some(avatar.into());
        self
    }

    pub fn online(mut self, online: bool) -> Self {
        self.is_online = Some(online);
        self
    }

    pub fn last_seen(mut self, at: DateTime<Utc>) -> Self {
        self.last_seen = Some(at);
        self
    }
}

/// Rendering-side view of an avatar reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvatarView {
    None,
    UrlRef(String),
    InlineMarkup(String),
}

impl AvatarView {
    /// Classify an opaque avatar string
    pub fn classify(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            AvatarView::None
        } else if trimmed.starts_with('<') {
            AvatarView::InlineMarkup(trimmed.to_string())
        } else {
            AvatarView::UrlRef(trimmed.to_string())
        }
    }
}

/// Mint an identity id for a device's first use
pub fn generate_user_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("user_{}_{}", Utc::now().timestamp_millis(), &suffix[..9])
}

/// `/online-users` payload as the remote authority names its fields
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WirePresence {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    pub is_online: bool,
    pub last_seen: DateTime<Utc>,
    pub profile_enabled: bool,
}

impl From<&PresenceEntry> for WirePresence {
    fn from(entry: &PresenceEntry) -> Self {
        Self {
            id: entry.id.clone(),
            name: entry.display_name.clone(),
            avatar: Some(entry.avatar_ref.clone()),
            is_online: entry.is_online,
            last_seen: entry.last_seen,
            profile_enabled: entry.presence_enabled,
        }
    }
}

impl From<WirePresence> for PresenceEntry {
    fn from(wire: WirePresence) -> Self {
        Self {
            id: wire.id,
            display_name: wire.name,
            avatar_ref: wire.avatar.unwrap_or_default(),
            is_online: wire.is_online,
            last_seen: wire.last_seen,
            presence_enabled: wire.profile_enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> PresenceEntry {
        IdentityInput::new("user_1", "Ana").into_entry()
    }

    #[test]
    fn test_identity_entry_is_visible() {
        let entry = entry();
        assert!(entry.is_online);
        assert!(entry.presence_enabled);
        assert!(entry.is_visible());
        assert_eq!(entry.avatar_ref, "");
    }

    #[test]
    fn test_patch_never_touches_id() {
        let mut entry = entry();
        entry.apply(&PresencePatch::default().display_name("Ana M.").online(false));
        assert_eq!(entry.id, "user_1");
        assert_eq!(entry.display_name, "Ana M.");
        assert!(!entry.is_visible());
    }

    #[test]
    fn test_patch_keeps_presence_flag() {
        let mut entry = entry();
        entry.apply(
            &PresencePatch::default()
                .avatar_ref("https://cdn.example/a.png")
                .online(true),
        );
        assert!(entry.presence_enabled);
        assert_eq!(entry.avatar_ref, "https://cdn.example/a.png");
    }

    #[test]
    fn test_avatar_classification() {
        assert_eq!(AvatarView::classify(""), AvatarView::None);
        assert_eq!(
            AvatarView::classify("https://cdn.example/a.png"),
            AvatarView::UrlRef("https://cdn.example/a.png".to_string())
        );
        assert!(matches!(
            AvatarView::classify("<svg viewBox=\"0 0 1 1\"></svg>"),
            AvatarView::InlineMarkup(_)
        ));
    }

    #[test]
    fn test_wire_field_names() {
        let json = serde_json::to_value(WirePresence::from(&entry())).unwrap();
        assert_eq!(json["id"], "user_1");
        assert_eq!(json["name"], "Ana");
        assert_eq!(json["isOnline"], true);
        assert_eq!(json["profileEnabled"], true);
        assert!(json.get("lastSeen").is_some());
    }

    #[test]
    fn test_generated_user_ids_differ() {
        let a = generate_user_id();
        let b = generate_user_id();
        assert!(a.starts_with("user_"));
        assert_ne!(a, b);
    }
}
