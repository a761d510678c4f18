// crates/engine/src/lib.rs
//! The conversation engine exposed to the UI layer.
//!
//! Glues the pieces together: the cache store mirrors the remote partitions,
//! the search crate answers queries over the committed snapshot, the usage
//! store tracks visits, and the view composer sections the ranked result.
//!
//! The UI-facing surface is three calls:
//!
//! - [`ConversationEngine::ranked_view`] — synchronous; filter, search,
//!   rank, and section the current snapshot. Safe on every keystroke.
//! - [`ConversationEngine::request_refresh`] — fire-and-forget; dropped if a
//!   refresh is already in flight. Poll [`ConversationEngine::busy`] for a
//!   loading indicator and [`ConversationEngine::last_refresh_error`] for
//!   the generic failure banner.
//! - [`ConversationEngine::record_visit`] — feeds the recent/frequent
//!   sections; never touches cached conversation data.

pub mod config;
pub mod view;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use tracing::{info, warn};

use convo_view_core::{Filters, IndexedConversation};
use convo_view_search::{rank_conversations, SearchIndex, SearchProperty};
use convo_view_store::{
    CacheState, CacheStore, ConversationSource, RefreshMode, RefreshOutcome, UsageStore,
};

pub use config::EngineConfig;
pub use view::{SectionOptions, Sections};

/// The search index paired with the snapshot it was built from, so a query
/// can tell whether the cache moved underneath it.
struct IndexedSnapshot {
    state: Arc<CacheState>,
    index: Arc<SearchIndex>,
}

/// One engine instance per logical view (see [`EngineConfig::scope`]).
pub struct ConversationEngine {
    config: EngineConfig,
    cache: Arc<CacheStore>,
    usage: Arc<UsageStore>,
    indexed: RwLock<IndexedSnapshot>,
    last_refresh_error: Arc<Mutex<Option<String>>>,
}

impl ConversationEngine {
    /// Open the engine over a remote source, loading whatever state the
    /// last session persisted. No fetching happens here — call
    /// [`ConversationEngine::start`] (typically fire-and-forget) to run the
    /// startup refresh policy.
    pub async fn open(config: EngineConfig, source: Arc<dyn ConversationSource>) -> Self {
        let persist = config.state_store();
        let cache = Arc::new(CacheStore::open(source, persist.clone(), config.cache_options()).await);
        let usage = Arc::new(UsageStore::open(persist).await);

        let state = cache.snapshot();
        let index = Arc::new(SearchIndex::build(&state.items));
        info!(scope = %config.scope, items = state.items.len(), "engine opened");

        Self {
            config,
            cache,
            usage,
            indexed: RwLock::new(IndexedSnapshot {
                state,
                index,
            }),
            last_refresh_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Run the startup refresh policy: a full refresh when the persisted
    /// state is empty or stale, an incremental one otherwise. At most one
    /// underlying refresh per engine lifetime; later calls are no-ops.
    pub async fn start(&self) {
        match self.cache.ensure_started().await {
            Ok(RefreshOutcome::Completed) => self.clear_refresh_error(),
            Ok(RefreshOutcome::AlreadyRunning) => {}
            Err(err) => {
                warn!(error = %err, "startup refresh failed");
                self.set_refresh_error(&err.to_string());
            }
        }
    }

    /// Kick off a refresh in the background and return immediately. A
    /// request that arrives while one is in flight is dropped — retry once
    /// [`ConversationEngine::busy`] clears.
    pub fn request_refresh(&self, mode: RefreshMode) {
        let cache = self.cache.clone();
        let last_error = self.last_refresh_error.clone();
        tokio::spawn(async move {
            match cache.refresh(mode).await {
                Ok(RefreshOutcome::Completed) => {
                    *last_error.lock().expect("refresh error lock poisoned") = None;
                }
                Ok(RefreshOutcome::AlreadyRunning) => {}
                Err(err) => {
                    warn!(mode = ?mode, error = %err, "refresh failed");
                    *last_error.lock().expect("refresh error lock poisoned") =
                        Some(err.to_string());
                }
            }
        });
    }

    /// Whether a refresh is currently in flight.
    pub fn busy(&self) -> bool {
        self.cache.busy()
    }

    /// Message of the most recent failed refresh, cleared by the next
    /// successful one. The UI shows a generic indicator, not this text.
    pub fn last_refresh_error(&self) -> Option<String> {
        self.last_refresh_error
            .lock()
            .expect("refresh error lock poisoned")
            .clone()
    }

    /// Record that the user opened a conversation. Updates and persists the
    /// usage state only; a persist failure is logged and the in-memory
    /// state keeps serving this session.
    pub async fn record_visit(&self, conversation_id: &str) {
        let now_ms = chrono::Utc::now().timestamp_millis();
        if let Err(err) = self.usage.record_visit(conversation_id, now_ms).await {
            warn!(conversation_id, error = %err, "failed to persist usage state");
        }
    }

    /// Filter, search, rank, and section the current committed snapshot.
    ///
    /// With an empty (or all-stop-word) query the filtered set is ordered
    /// purely by last activity; otherwise every query token must match the
    /// conversation somewhere for it to appear at all.
    pub fn ranked_view(&self, query: &str, filters: Filters, options: SectionOptions) -> Sections {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let (state, index) = self.current_index();

        let candidates: Vec<IndexedConversation> = state
            .items
            .iter()
            .filter(|item| filters.matches(item))
            .cloned()
            .collect();

        let hits: HashMap<String, convo_view_search::SearchHit> = index
            .search(query, &SearchProperty::ALL)
            .into_iter()
            .map(|hit| (hit.id.clone(), hit))
            .collect();

        let matched: Vec<IndexedConversation> = if convo_view_core::tokenize(query).is_empty() {
            candidates
        } else {
            candidates
                .into_iter()
                .filter(|item| hits.contains_key(item.id()))
                .collect()
        };

        let ranked = rank_conversations(matched, &hits, query, now_ms)
            .into_iter()
            .map(|item| item.conversation)
            .collect();

        view::compose(
            ranked,
            &self.usage.snapshot(),
            options,
            self.config.frequent_limit,
            now_ms,
        )
    }

    /// The committed snapshot with a search index built over it, rebuilding
    /// the index lazily when a refresh has committed a newer snapshot.
    fn current_index(&self) -> (Arc<CacheState>, Arc<SearchIndex>) {
        let snapshot = self.cache.snapshot();
        {
            let indexed = self.indexed.read().expect("index lock poisoned");
            if Arc::ptr_eq(&indexed.state, &snapshot) {
                return (indexed.state.clone(), indexed.index.clone());
            }
        }

        let index = Arc::new(SearchIndex::build(&snapshot.items));
        let mut indexed = self.indexed.write().expect("index lock poisoned");
        *indexed = IndexedSnapshot {
            state: snapshot.clone(),
            index: index.clone(),
        };
        (snapshot, index)
    }

    fn set_refresh_error(&self, message: &str) {
        *self
            .last_refresh_error
            .lock()
            .expect("refresh error lock poisoned") = Some(message.to_string());
    }

    fn clear_refresh_error(&self) {
        *self
            .last_refresh_error
            .lock()
            .expect("refresh error lock poisoned") = None;
    }
}
