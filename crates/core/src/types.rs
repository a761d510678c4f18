// crates/core/src/types.rs
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::fields::SearchFields;

/// One of the three disjoint remote conversation buckets. Each partition is
/// fetched and paginated independently against the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../../ui/src/types/generated/")]
#[serde(rename_all = "kebab-case")]
pub enum InboxPartition {
    Primary,
    LowPriority,
    Archive,
}

impl InboxPartition {
    /// All partitions, in the order refreshes walk them.
    pub const ALL: [InboxPartition; 3] = [
        InboxPartition::Primary,
        InboxPartition::LowPriority,
        InboxPartition::Archive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InboxPartition::Primary => "primary",
            InboxPartition::LowPriority => "low-priority",
            InboxPartition::Archive => "archive",
        }
    }
}

impl std::fmt::Display for InboxPartition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conversation shape as the remote service reports it.
///
/// Anything the remote adds beyond single/group maps to `Other` so a new
/// server-side type never breaks deserialization of a whole page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../../ui/src/types/generated/")]
#[serde(rename_all = "lowercase")]
pub enum ConversationKind {
    Single,
    Group,
    #[serde(other)]
    Other,
}

impl Default for ConversationKind {
    fn default() -> Self {
        ConversationKind::Other
    }
}

/// One member of a conversation. Every field except `id` is optional —
/// networks differ wildly in what identity data they expose.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../../ui/src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub is_self: bool,
}

/// A conversation as mirrored from the remote service.
///
/// The remote owns this entity; the local cache holds a read-mostly copy
/// keyed by `id`. Missing or malformed fields degrade to defaults rather
/// than failing a whole page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../../ui/src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Network/source tag, e.g. "imessage", "whatsapp".
    #[serde(default)]
    pub network: String,
    #[serde(rename = "type", default)]
    pub kind: ConversationKind,
    #[serde(default)]
    pub unread_count: u32,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub archived: bool,
    /// ISO-8601 timestamp of the last message/activity, as the remote sent it.
    #[serde(default)]
    pub last_activity: Option<String>,
    #[serde(default)]
    pub participants: Vec<Participant>,
}

impl Conversation {
    /// Last-activity timestamp as epoch milliseconds.
    ///
    /// Missing or unparsable timestamps degrade to 0 (ranked as maximally
    /// stale) instead of erroring.
    pub fn last_activity_millis(&self) -> i64 {
        self.last_activity
            .as_deref()
            .and_then(|raw| chrono::DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.timestamp_millis())
            .unwrap_or(0)
    }
}

/// A cached conversation plus everything derived from it locally.
///
/// Invariant: the cache holds exactly one entry per conversation id;
/// `partition` is the partition the conversation was last fetched under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedConversation {
    pub conversation: Conversation,
    pub partition: InboxPartition,
    pub search_fields: SearchFields,
}

impl IndexedConversation {
    /// Build an entry from a freshly fetched conversation, deriving its
    /// normalized search fields.
    pub fn new(conversation: Conversation, partition: InboxPartition) -> Self {
        let search_fields = SearchFields::from_conversation(&conversation);
        Self {
            conversation,
            partition,
            search_fields,
        }
    }

    pub fn id(&self) -> &str {
        &self.conversation.id
    }
}

/// User-chosen list predicate. Pure view state — never persisted with the
/// cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../../ui/src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct Filters {
    /// `None` means all partitions.
    #[serde(default)]
    pub partition: Option<InboxPartition>,
    /// `None` means any conversation kind.
    #[serde(default)]
    pub kind: Option<ConversationKind>,
    #[serde(default)]
    pub unread_only: bool,
    #[serde(default)]
    pub include_muted: bool,
}

impl Filters {
    pub fn matches(&self, item: &IndexedConversation) -> bool {
        if let Some(partition) = self.partition {
            if item.partition != partition {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if item.conversation.kind != kind {
                return false;
            }
        }
        if self.unread_only && item.conversation.unread_count == 0 {
            return false;
        }
        if !self.include_muted && item.conversation.muted {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation(id: &str) -> Conversation {
        Conversation {
            id: id.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_partition_serde_round_trip() {
        let json = serde_json::to_string(&InboxPartition::LowPriority).unwrap();
        assert_eq!(json, "\"low-priority\"");
        let back: InboxPartition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, InboxPartition::LowPriority);
    }

    #[test]
    fn test_unknown_kind_maps_to_other() {
        let conv: Conversation =
            serde_json::from_str(r#"{"id": "c1", "type": "broadcast"}"#).unwrap();
        assert_eq!(conv.kind, ConversationKind::Other);
    }

    #[test]
    fn test_conversation_minimal_json() {
        let conv: Conversation = serde_json::from_str(r#"{"id": "c1"}"#).unwrap();
        assert_eq!(conv.id, "c1");
        assert!(conv.title.is_none());
        assert_eq!(conv.unread_count, 0);
        assert!(!conv.pinned);
        assert!(conv.participants.is_empty());
        assert_eq!(conv.last_activity_millis(), 0);
    }

    #[test]
    fn test_last_activity_millis_parses_rfc3339() {
        let conv = Conversation {
            last_activity: Some("2026-01-25T16:42:56.852Z".to_string()),
            ..conversation("c1")
        };
        assert_eq!(conv.last_activity_millis(), 1_769_359_376_852);
    }

    #[test]
    fn test_last_activity_millis_unparsable_is_zero() {
        let conv = Conversation {
            last_activity: Some("last tuesday".to_string()),
            ..conversation("c1")
        };
        assert_eq!(conv.last_activity_millis(), 0);
    }

    #[test]
    fn test_filters_default_excludes_muted() {
        let muted = IndexedConversation::new(
            Conversation {
                muted: true,
                ..conversation("c1")
            },
            InboxPartition::Primary,
        );
        assert!(!Filters::default().matches(&muted));
        let filters = Filters {
            include_muted: true,
            ..Default::default()
        };
        assert!(filters.matches(&muted));
    }

    #[test]
    fn test_filters_partition_and_kind() {
        let item = IndexedConversation::new(
            Conversation {
                kind: ConversationKind::Group,
                ..conversation("c1")
            },
            InboxPartition::Archive,
        );
        let filters = Filters {
            partition: Some(InboxPartition::Archive),
            kind: Some(ConversationKind::Group),
            ..Default::default()
        };
        assert!(filters.matches(&item));

        let wrong_partition = Filters {
            partition: Some(InboxPartition::Primary),
            ..Default::default()
        };
        assert!(!wrong_partition.matches(&item));

        let wrong_kind = Filters {
            kind: Some(ConversationKind::Single),
            ..Default::default()
        };
        assert!(!wrong_kind.matches(&item));
    }

    #[test]
    fn test_filters_unread_only() {
        let read = IndexedConversation::new(conversation("c1"), InboxPartition::Primary);
        let unread = IndexedConversation::new(
            Conversation {
                unread_count: 3,
                ..conversation("c2")
            },
            InboxPartition::Primary,
        );
        let filters = Filters {
            unread_only: true,
            ..Default::default()
        };
        assert!(!filters.matches(&read));
        assert!(filters.matches(&unread));
    }
}
