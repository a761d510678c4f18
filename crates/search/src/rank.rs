// crates/search/src/rank.rs
//! Multi-signal ordering of search candidates.

use std::cmp::Reverse;
use std::collections::HashMap;

use convo_view_core::{normalize, ConversationKind, IndexedConversation};

use crate::index::SearchHit;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Days of recency that still boost a conversation. Activity older than this
/// contributes nothing.
const RECENCY_WINDOW_DAYS: i64 = 30;

/// Precomputed ranking signals for one candidate. Field order is comparison
/// order: deriving `Ord` on the tuple-of-signals gives the tier cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct RankKey {
    exact_title: bool,
    prefix_title: bool,
    recency_boost: i64,
    title_hits: usize,
    participant_hits: usize,
    direct: bool,
    network_hits: usize,
    last_activity_ms: i64,
}

impl RankKey {
    fn build(
        item: &IndexedConversation,
        hit: Option<&SearchHit>,
        normalized_query: &str,
        now_ms: i64,
    ) -> Self {
        let title = &item.search_fields.title;
        let last_activity_ms = item.conversation.last_activity_millis();
        let days_stale = (now_ms - last_activity_ms) / MILLIS_PER_DAY;

        Self {
            exact_title: title == normalized_query,
            prefix_title: title.starts_with(normalized_query),
            recency_boost: (RECENCY_WINDOW_DAYS - days_stale).max(0),
            title_hits: hit.map_or(0, |h| h.title.hit_count),
            participant_hits: hit.map_or(0, |h| h.participants.hit_count),
            direct: item.conversation.kind == ConversationKind::Single,
            network_hits: hit.map_or(0, |h| h.network.hit_count),
            last_activity_ms,
        }
    }
}

/// Order candidates by combined match/recency/type signals, strongest first.
///
/// Tiers, in order: exact title match, prefix title match, recency boost
/// (`max(0, 30 − days since last activity)`), title hit count, participant
/// hit count, direct-before-group, network hit count, and finally
/// last-activity timestamp descending.
///
/// An empty (or all-stop-word) query skips match scoring entirely and sorts
/// purely by last-activity descending. Deterministic for a given input.
pub fn rank_conversations(
    mut candidates: Vec<IndexedConversation>,
    hits: &HashMap<String, SearchHit>,
    raw_query: &str,
    now_ms: i64,
) -> Vec<IndexedConversation> {
    let normalized_query = normalize(raw_query);
    if normalized_query.is_empty() {
        candidates.sort_by_cached_key(|item| Reverse(item.conversation.last_activity_millis()));
        return candidates;
    }

    candidates.sort_by_cached_key(|item| {
        Reverse(RankKey::build(
            item,
            hits.get(&item.conversation.id),
            &normalized_query,
            now_ms,
        ))
    });
    candidates
}
