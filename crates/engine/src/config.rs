// crates/engine/src/config.rs
use std::path::PathBuf;
use std::time::Duration;

use convo_view_store::{CacheOptions, StateStore};

/// Explicit engine configuration.
///
/// Everything that used to be ambient — which view's state blobs to use,
/// where they live, how far refreshes walk — is injected here at
/// construction. Swapping remote credentials or base URLs means building a
/// new engine over a new source, not mutating shared state.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Stable key scoping the persisted blobs, so several engines (e.g. an
    /// "inbox" view and a "requests" view) can coexist in one directory.
    pub scope: String,
    /// Directory holding the state blobs.
    pub state_dir: PathBuf,
    /// Cache bound; oldest-by-activity entries are dropped beyond it.
    pub max_items: usize,
    /// Per-partition page cap for a full refresh.
    pub full_page_cap: usize,
    /// Per-partition page cap for an incremental refresh.
    pub incremental_page_cap: usize,
    /// Persisted state older than this gets a full startup refresh.
    pub stale_after: Duration,
    /// Size of the "frequent" view section.
    pub frequent_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scope: "inbox".to_string(),
            state_dir: StateStore::default_dir(),
            max_items: convo_view_store::cache::DEFAULT_MAX_ITEMS,
            full_page_cap: convo_view_store::cache::DEFAULT_FULL_PAGE_CAP,
            incremental_page_cap: convo_view_store::cache::DEFAULT_INCREMENTAL_PAGE_CAP,
            stale_after: convo_view_store::cache::DEFAULT_STALE_AFTER,
            frequent_limit: 8,
        }
    }
}

impl EngineConfig {
    pub(crate) fn cache_options(&self) -> CacheOptions {
        CacheOptions {
            max_items: self.max_items,
            full_page_cap: self.full_page_cap,
            incremental_page_cap: self.incremental_page_cap,
            stale_after: self.stale_after,
        }
    }

    pub(crate) fn state_store(&self) -> StateStore {
        StateStore::new(self.state_dir.clone(), self.scope.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_store_limits() {
        let config = EngineConfig::default();
        assert_eq!(config.scope, "inbox");
        assert_eq!(config.max_items, 20_000);
        assert_eq!(config.full_page_cap, 50);
        assert_eq!(config.incremental_page_cap, 3);
        assert_eq!(config.stale_after, Duration::from_secs(6 * 60 * 60));
        assert_eq!(config.frequent_limit, 8);
    }
}
