// crates/core/src/fields.rs
use serde::{Deserialize, Serialize};

use crate::normalize::{digits_only, normalize};
use crate::types::Conversation;

/// Participants beyond this count are not indexed. Large group chats get
/// searchable coverage of their first members without unbounded index cost.
pub const MAX_INDEXED_PARTICIPANTS: usize = 50;

/// Normalized searchable text derived from a conversation.
///
/// Recomputed whenever the source conversation changes; persisted alongside
/// it in the cache blob so a cold start can search without renormalizing.
/// Never sent to the remote service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFields {
    pub title: String,
    pub network: String,
    /// One composite string per participant: name + handle + email +
    /// digits-only phone, normalized, in participant order.
    pub participants: Vec<String>,
}

impl SearchFields {
    pub fn from_conversation(conversation: &Conversation) -> Self {
        let participants = conversation
            .participants
            .iter()
            .take(MAX_INDEXED_PARTICIPANTS)
            .map(|p| {
                let mut composite = String::new();
                for part in [
                    p.name.as_deref(),
                    p.handle.as_deref(),
                    p.email.as_deref(),
                ]
                .into_iter()
                .flatten()
                {
                    if !composite.is_empty() {
                        composite.push(' ');
                    }
                    composite.push_str(part);
                }
                if let Some(phone) = p.phone.as_deref() {
                    let digits = digits_only(phone);
                    if !digits.is_empty() {
                        if !composite.is_empty() {
                            composite.push(' ');
                        }
                        composite.push_str(&digits);
                    }
                }
                normalize(&composite)
            })
            .collect();

        Self {
            title: normalize(conversation.title.as_deref().unwrap_or_default()),
            network: normalize(&conversation.network),
            participants,
        }
    }
}
