// crates/store/src/usage.rs
//! Recency/frequency usage signals, fed by explicit visit events.
//!
//! Independent of the cache mirror: visiting a conversation never mutates
//! cached data, and a cache refresh never touches usage state.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use convo_view_core::PersistError;

use crate::persist::StateStore;

/// Most-recently-visited ids kept for the "recent" section.
pub const MAX_RECENT: usize = 12;

/// Visit timestamps remembered per conversation for frecency scoring.
const MAX_VISITS_PER_CONVERSATION: usize = 10;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Age-bucketed visit weight: recent visits dominate, but any remembered
/// visit keeps contributing a little.
fn bucket_weight(age_ms: i64) -> u64 {
    match age_ms / MILLIS_PER_DAY {
        d if d <= 4 => 100,
        d if d <= 14 => 70,
        d if d <= 31 => 50,
        d if d <= 90 => 30,
        _ => 10,
    }
}

/// Persisted usage state: the MRU visit list plus a per-id visit log the
/// frecency score derives from. Callers treat the score as opaque.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageState {
    /// Most-recent-first, de-duplicated, capped at [`MAX_RECENT`].
    pub recent: Vec<String>,
    /// Visit timestamps (epoch millis, newest first) per conversation id.
    pub visits: HashMap<String, Vec<i64>>,
}

impl UsageState {
    pub fn record_visit(&mut self, id: &str, now_ms: i64) {
        self.recent.retain(|existing| existing != id);
        self.recent.insert(0, id.to_string());
        self.recent.truncate(MAX_RECENT);

        let log = self.visits.entry(id.to_string()).or_default();
        log.insert(0, now_ms);
        log.truncate(MAX_VISITS_PER_CONVERSATION);
    }

    pub fn frecency_score(&self, id: &str, now_ms: i64) -> u64 {
        self.visits
            .get(id)
            .map(|log| log.iter().map(|&visited| bucket_weight(now_ms - visited)).sum())
            .unwrap_or(0)
    }

    /// Ids by descending frecency score. Ties break on id so the order is
    /// stable across calls.
    pub fn top_frecent(&self, limit: usize, now_ms: i64) -> Vec<String> {
        let mut scored: Vec<(u64, &String)> = self
            .visits
            .keys()
            .map(|id| (self.frecency_score(id, now_ms), id))
            .filter(|(score, _)| *score > 0)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
        scored.into_iter().take(limit).map(|(_, id)| id.clone()).collect()
    }
}

/// Owns the committed [`UsageState`] and persists it after every visit.
pub struct UsageStore {
    persist: StateStore,
    state: std::sync::RwLock<Arc<UsageState>>,
}

impl UsageStore {
    pub async fn open(persist: StateStore) -> Self {
        let state = persist.load_usage().await;
        debug!(recent = state.recent.len(), "usage store opened");
        Self {
            persist,
            state: std::sync::RwLock::new(Arc::new(state)),
        }
    }

    pub fn snapshot(&self) -> Arc<UsageState> {
        self.state.read().expect("usage state lock poisoned").clone()
    }

    /// Record a visit and persist the updated state. The in-memory update
    /// always takes effect; a persist failure is returned for logging but
    /// the session keeps its state.
    pub async fn record_visit(&self, id: &str, now_ms: i64) -> Result<(), PersistError> {
        let committed = {
            let mut guard = self.state.write().expect("usage state lock poisoned");
            let mut next = (**guard).clone();
            next.record_visit(id, now_ms);
            let next = Arc::new(next);
            *guard = next.clone();
            next
        };
        self.persist.save_usage(&committed).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const NOW_MS: i64 = 1_769_359_376_852;

    #[test]
    fn test_record_visit_dedups_most_recent_first() {
        let mut usage = UsageState::default();
        usage.record_visit("c1", NOW_MS);
        usage.record_visit("c2", NOW_MS + 1);
        usage.record_visit("c1", NOW_MS + 2);
        assert_eq!(usage.recent, vec!["c1".to_string(), "c2".to_string()]);
    }

    #[test]
    fn test_recent_list_is_capped() {
        let mut usage = UsageState::default();
        for i in 0..MAX_RECENT + 5 {
            usage.record_visit(&format!("c{i}"), NOW_MS + i as i64);
        }
        assert_eq!(usage.recent.len(), MAX_RECENT);
        assert_eq!(usage.recent[0], format!("c{}", MAX_RECENT + 4));
    }

    #[test]
    fn test_visit_log_is_bounded() {
        let mut usage = UsageState::default();
        for i in 0..25 {
            usage.record_visit("c1", NOW_MS + i);
        }
        assert_eq!(usage.visits["c1"].len(), 10);
        // Newest first.
        assert_eq!(usage.visits["c1"][0], NOW_MS + 24);
    }

    #[test]
    fn test_frecency_weighs_recent_visits_higher() {
        let mut usage = UsageState::default();
        usage.record_visit("fresh", NOW_MS - MILLIS_PER_DAY);
        usage.record_visit("old", NOW_MS - 60 * MILLIS_PER_DAY);
        assert!(usage.frecency_score("fresh", NOW_MS) > usage.frecency_score("old", NOW_MS));
        assert_eq!(usage.frecency_score("unvisited", NOW_MS), 0);
    }

    #[test]
    fn test_frequent_visits_accumulate() {
        let mut usage = UsageState::default();
        for i in 0..5 {
            usage.record_visit("habitual", NOW_MS - i * MILLIS_PER_DAY);
        }
        usage.record_visit("once", NOW_MS);
        assert!(usage.frecency_score("habitual", NOW_MS) > usage.frecency_score("once", NOW_MS));
    }

    #[test]
    fn test_top_frecent_orders_and_limits() {
        let mut usage = UsageState::default();
        usage.record_visit("a", NOW_MS);
        for _ in 0..3 {
            usage.record_visit("b", NOW_MS);
        }
        for _ in 0..2 {
            usage.record_visit("c", NOW_MS);
        }
        assert_eq!(usage.top_frecent(2, NOW_MS), vec!["b".to_string(), "c".to_string()]);
        assert_eq!(
            usage.top_frecent(10, NOW_MS),
            vec!["b".to_string(), "c".to_string(), "a".to_string()]
        );
    }

    #[test]
    fn test_top_frecent_tie_breaks_on_id() {
        let mut usage = UsageState::default();
        usage.record_visit("zeta", NOW_MS);
        usage.record_visit("alpha", NOW_MS);
        assert_eq!(
            usage.top_frecent(10, NOW_MS),
            vec!["alpha".to_string(), "zeta".to_string()]
        );
    }

    #[tokio::test]
    async fn test_usage_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = UsageStore::open(StateStore::new(dir.path(), "inbox")).await;
        store.record_visit("c1", NOW_MS).await.unwrap();
        store.record_visit("c2", NOW_MS + 1).await.unwrap();

        // A second store over the same scope sees the persisted visits.
        let reopened = UsageStore::open(StateStore::new(dir.path(), "inbox")).await;
        assert_eq!(
            reopened.snapshot().recent,
            vec!["c2".to_string(), "c1".to_string()]
        );
    }
}
