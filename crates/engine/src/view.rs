// crates/engine/src/view.rs
//! Partitioning of the ranked list into UI sections.

use std::collections::HashSet;

use serde::Serialize;
use ts_rs::TS;

use convo_view_core::Conversation;
use convo_view_store::UsageState;

/// Which optional sections the caller wants. Pinned and "other" always
/// render; the rest are per-surface choices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SectionOptions {
    pub unread: bool,
    pub recent: bool,
    pub frequent: bool,
}

impl SectionOptions {
    pub fn all() -> Self {
        Self {
            unread: true,
            recent: true,
            frequent: true,
        }
    }
}

/// The sectioned view handed to the UI. Every conversation appears in at
/// most one section; within a section, order is ranked order except
/// `recent`, which is ordered by visit recency.
#[derive(Debug, Clone, Default, Serialize, TS)]
#[ts(export, export_to = "../../../ui/src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct Sections {
    pub pinned: Vec<Conversation>,
    pub unread: Vec<Conversation>,
    pub recent: Vec<Conversation>,
    pub frequent: Vec<Conversation>,
    pub other: Vec<Conversation>,
}

impl Sections {
    pub fn total(&self) -> usize {
        self.pinned.len()
            + self.unread.len()
            + self.recent.len()
            + self.frequent.len()
            + self.other.len()
    }
}

/// Compose sections from an already ranked and filtered conversation list.
pub fn compose(
    ranked: Vec<Conversation>,
    usage: &UsageState,
    options: SectionOptions,
    frequent_limit: usize,
    now_ms: i64,
) -> Sections {
    let mut sections = Sections::default();
    let mut shown: HashSet<String> = HashSet::new();

    for conversation in &ranked {
        if conversation.pinned {
            shown.insert(conversation.id.clone());
            sections.pinned.push(conversation.clone());
        }
    }

    if options.unread {
        for conversation in &ranked {
            if conversation.unread_count > 0 && !shown.contains(&conversation.id) {
                shown.insert(conversation.id.clone());
                sections.unread.push(conversation.clone());
            }
        }
    }

    if options.recent {
        // Visit order, not ranked order.
        for id in &usage.recent {
            if shown.contains(id) {
                continue;
            }
            if let Some(conversation) = ranked.iter().find(|c| &c.id == id) {
                shown.insert(id.clone());
                sections.recent.push(conversation.clone());
            }
        }
    }

    if options.frequent {
        for id in usage.top_frecent(frequent_limit + shown.len(), now_ms) {
            if sections.frequent.len() == frequent_limit {
                break;
            }
            if shown.contains(&id) {
                continue;
            }
            if let Some(conversation) = ranked.iter().find(|c| c.id == id) {
                shown.insert(id.clone());
                sections.frequent.push(conversation.clone());
            }
        }
    }

    for conversation in ranked {
        if !shown.contains(&conversation.id) {
            sections.other.push(conversation);
        }
    }

    sections
}
