//! Property-based tests for identifiers, status and roster visibility

use std::collections::HashSet;

use chrono::{TimeZone, Utc};
use nutrisync::client::SyncStatus;
use nutrisync::shared::message::{messages_from_wire, new_message_id, WireChatMessage};
use nutrisync::shared::presence::generate_user_id;
use nutrisync::shared::{AvatarView, MessageKind, PresenceEntry};
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_message_ids_unique_in_burst(count in 1usize..500) {
        let ids: HashSet<String> = (0..count).map(|_| new_message_id()).collect();
        prop_assert_eq!(ids.len(), count);
    }

    #[test]
    fn test_user_ids_unique_and_prefixed(count in 1usize..100) {
        let ids: HashSet<String> = (0..count).map(|_| generate_user_id()).collect();
        prop_assert_eq!(ids.len(), count);
        prop_assert!(ids.iter().all(|id| id.starts_with("user_")));
    }

    #[test]
    fn test_status_offline_whenever_disabled(reachable in any::<bool>()) {
        prop_assert_eq!(SyncStatus::resolve(reachable, false), SyncStatus::Offline);
    }

    #[test]
    fn test_status_tracks_reachability_when_enabled(reachable in any::<bool>()) {
        let expected = if reachable { SyncStatus::Full } else { SyncStatus::Local };
        prop_assert_eq!(SyncStatus::resolve(reachable, true), expected);
    }

    #[test]
    fn test_visibility_requires_both_flags(online in any::<bool>(), enabled in any::<bool>()) {
        let entry = PresenceEntry {
            id: "user_1".to_string(),
            display_name: "Ana".to_string(),
            avatar_ref: String::new(),
            is_online: online,
            last_seen: Utc::now(),
            presence_enabled: enabled,
        };
        prop_assert_eq!(entry.is_visible(), online && enabled);
    }

    #[test]
    fn test_avatar_markup_detected_by_leading_bracket(body in "[a-z0-9 =\"/]{0,40}") {
        let markup = format!("<svg {}>", body);
        prop_assert!(matches!(AvatarView::classify(&markup), AvatarView::InlineMarkup(_)));

        let url = format!("https://cdn.example/{}", body.trim());
        prop_assert!(matches!(AvatarView::classify(&url), AvatarView::UrlRef(_)));
    }

    #[test]
    fn test_id_less_wire_messages_get_stable_distinct_ids(
        user in "[a-z0-9_]{1,12}",
        secs in 0i64..2_000_000_000,
        bodies in proptest::collection::hash_set("[a-z ]{1,20}", 1..8),
    ) {
        let timestamp = Utc.timestamp_opt(secs, 0).unwrap();
        let snapshot: Vec<WireChatMessage> = bodies
            .iter()
            .map(|body| {
                serde_json::from_value(serde_json::json!({
                    "userId": user,
                    "userName": "Ana",
                    "message": body,
                    "timestamp": timestamp,
                    "type": "text",
                }))
                .unwrap()
            })
            .collect();

        let first = messages_from_wire(snapshot.clone());
        let second = messages_from_wire(snapshot);
        prop_assert_eq!(&first, &second);

        let ids: HashSet<&str> = first.iter().map(|m| m.id.as_str()).collect();
        prop_assert_eq!(ids.len(), bodies.len());
        prop_assert!(first.iter().all(|m| m.kind == MessageKind::Text));
    }
}

#[test]
fn test_blank_avatar_is_none() {
    assert_eq!(AvatarView::classify(""), AvatarView::None);
    assert_eq!(AvatarView::classify("   "), AvatarView::None);
}
