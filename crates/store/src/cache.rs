// crates/store/src/cache.rs
//! Bounded local mirror of the three inbox partitions.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use convo_view_core::{
    Conversation, IndexedConversation, InboxPartition, RefreshError, SourceError,
};

use crate::persist::StateStore;
use crate::source::{ConversationSource, PageDirection};

/// Hard cap on mirrored conversations; oldest-by-activity entries are
/// dropped first once a merge overflows it.
pub const DEFAULT_MAX_ITEMS: usize = 20_000;
/// Page-walk cap for a full refresh, per partition.
pub const DEFAULT_FULL_PAGE_CAP: usize = 50;
/// Page-walk cap for an incremental refresh, per partition.
pub const DEFAULT_INCREMENTAL_PAGE_CAP: usize = 3;
/// Persisted state older than this triggers a full instead of incremental
/// refresh at startup.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(6 * 60 * 60);

/// Pagination bookmarks for one partition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorPair {
    /// Newest edge seen — where the next incremental fetch resumes.
    pub newest: Option<String>,
    /// Oldest edge reached during the last full walk.
    pub oldest: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionCursors {
    pub primary: CursorPair,
    pub low_priority: CursorPair,
    pub archive: CursorPair,
}

impl PartitionCursors {
    pub fn get(&self, partition: InboxPartition) -> &CursorPair {
        match partition {
            InboxPartition::Primary => &self.primary,
            InboxPartition::LowPriority => &self.low_priority,
            InboxPartition::Archive => &self.archive,
        }
    }

    pub fn get_mut(&mut self, partition: InboxPartition) -> &mut CursorPair {
        match partition {
            InboxPartition::Primary => &mut self.primary,
            InboxPartition::LowPriority => &mut self.low_priority,
            InboxPartition::Archive => &mut self.archive,
        }
    }
}

/// The persisted mirror: one entry per conversation id, cursors per
/// partition, and the start time of the refresh that produced it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheState {
    pub items: Vec<IndexedConversation>,
    pub cursors: PartitionCursors,
    pub updated_at_ms: i64,
}

impl CacheState {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_stale(&self, now_ms: i64, max_age: Duration) -> bool {
        now_ms.saturating_sub(self.updated_at_ms) > max_age.as_millis() as i64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshMode {
    /// Discard the mirror and re-walk each partition's history.
    Full,
    /// Fetch only the newest page(s) per partition on top of current state.
    Incremental,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Completed,
    /// Another refresh held the single-flight lock; this request was dropped.
    AlreadyRunning,
}

/// Tuning knobs for the store, injected by the engine's config.
#[derive(Debug, Clone)]
pub struct CacheOptions {
    pub max_items: usize,
    pub full_page_cap: usize,
    pub incremental_page_cap: usize,
    pub stale_after: Duration,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            max_items: DEFAULT_MAX_ITEMS,
            full_page_cap: DEFAULT_FULL_PAGE_CAP,
            incremental_page_cap: DEFAULT_INCREMENTAL_PAGE_CAP,
            stale_after: DEFAULT_STALE_AFTER,
        }
    }
}

/// What one partition's page walk brought back, before the merge.
struct PartitionFetch {
    partition: InboxPartition,
    items: Vec<Conversation>,
    cursors: CursorPair,
    pages: usize,
}

/// The cache/index store: owns the committed [`CacheState`] and the only
/// code path that mutates it.
///
/// Readers take `snapshot()` — an `Arc` of the last committed state — and
/// never observe a partially merged mirror. Refreshes are single-flight:
/// the critical section is a `tokio::sync::Mutex` taken with `try_lock`,
/// so a request that arrives while one is in flight is dropped rather than
/// queued, and the caller retries later.
pub struct CacheStore {
    source: Arc<dyn ConversationSource>,
    persist: StateStore,
    options: CacheOptions,
    state: std::sync::RwLock<Arc<CacheState>>,
    refresh_lock: Mutex<()>,
    busy: AtomicBool,
    started: AtomicBool,
}

impl CacheStore {
    /// Open the store, loading whatever state the last session persisted
    /// (possibly stale, possibly empty — see [`CacheStore::ensure_started`]).
    pub async fn open(
        source: Arc<dyn ConversationSource>,
        persist: StateStore,
        options: CacheOptions,
    ) -> Self {
        let state = persist.load_cache().await;
        debug!(
            items = state.items.len(),
            updated_at_ms = state.updated_at_ms,
            "cache store opened"
        );
        Self {
            source,
            persist,
            options,
            state: std::sync::RwLock::new(Arc::new(state)),
            refresh_lock: Mutex::new(()),
            busy: AtomicBool::new(false),
            started: AtomicBool::new(false),
        }
    }

    /// The last committed state. Cheap; safe to call on every keystroke.
    pub fn snapshot(&self) -> Arc<CacheState> {
        self.state.read().expect("cache state lock poisoned").clone()
    }

    /// Whether a refresh is currently in flight — the UI's loading flag.
    pub fn busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Startup policy, at most once per store lifetime: empty or stale
    /// persisted state gets a full refresh, anything else an incremental
    /// one. Later calls are no-ops.
    pub async fn ensure_started(&self) -> Result<RefreshOutcome, RefreshError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Ok(RefreshOutcome::AlreadyRunning);
        }
        let snapshot = self.snapshot();
        let now_ms = chrono::Utc::now().timestamp_millis();
        let mode = if snapshot.is_empty() || snapshot.is_stale(now_ms, self.options.stale_after) {
            RefreshMode::Full
        } else {
            RefreshMode::Incremental
        };
        info!(mode = ?mode, "startup refresh");
        self.refresh(mode).await
    }

    /// Refresh the mirror from the remote source.
    ///
    /// Returns `AlreadyRunning` without fetching anything when a refresh is
    /// already in flight. On any partition failure the previously committed
    /// state is left untouched and nothing is persisted.
    pub async fn refresh(&self, mode: RefreshMode) -> Result<RefreshOutcome, RefreshError> {
        let _guard = match self.refresh_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                debug!(mode = ?mode, "refresh already in progress, dropping request");
                return Ok(RefreshOutcome::AlreadyRunning);
            }
        };

        self.busy.store(true, Ordering::SeqCst);
        let result = self.refresh_inner(mode).await;
        self.busy.store(false, Ordering::SeqCst);
        result.map(|()| RefreshOutcome::Completed)
    }

    async fn refresh_inner(&self, mode: RefreshMode) -> Result<(), RefreshError> {
        let started_at_ms = chrono::Utc::now().timestamp_millis();
        let base = match mode {
            RefreshMode::Full => CacheState::default(),
            RefreshMode::Incremental => (*self.snapshot()).clone(),
        };

        // Fan out over partitions, join before merging. One failed partition
        // fails the whole refresh — the committed state stays as it was.
        let (primary, low_priority, archive) = tokio::try_join!(
            self.fetch_partition(InboxPartition::Primary, &base, mode),
            self.fetch_partition(InboxPartition::LowPriority, &base, mode),
            self.fetch_partition(InboxPartition::Archive, &base, mode),
        )?;

        let mut next = base;
        for fetch in [primary, low_priority, archive] {
            info!(
                partition = %fetch.partition,
                items = fetch.items.len(),
                pages = fetch.pages,
                "partition fetched"
            );
            merge_partition(&mut next, fetch);
        }

        next.items
            .sort_by_cached_key(|item| Reverse(item.conversation.last_activity_millis()));
        next.items.truncate(self.options.max_items);
        next.updated_at_ms = started_at_ms;

        let committed = Arc::new(next);
        *self.state.write().expect("cache state lock poisoned") = committed.clone();
        info!(mode = ?mode, items = committed.items.len(), "refresh committed");

        // Commit-then-persist: a persist failure leaves the in-memory state
        // valid, and the next successful refresh retries the write.
        self.persist.save_cache(&committed).await?;
        Ok(())
    }

    async fn fetch_partition(
        &self,
        partition: InboxPartition,
        base: &CacheState,
        mode: RefreshMode,
    ) -> Result<PartitionFetch, SourceError> {
        match mode {
            RefreshMode::Full => self.walk_older(partition).await,
            RefreshMode::Incremental => {
                self.walk_newer(partition, base.cursors.get(partition).clone())
                    .await
            }
        }
    }

    /// Full-refresh walk: follow the `Older` direction until the remote
    /// runs out of history or the page cap is hit. Records the first page's
    /// newest cursor and the last page's oldest cursor.
    async fn walk_older(&self, partition: InboxPartition) -> Result<PartitionFetch, SourceError> {
        let mut items = Vec::new();
        let mut cursors = CursorPair::default();
        let mut cursor: Option<String> = None;
        let mut pages = 0;

        while pages < self.options.full_page_cap {
            let page = self
                .source
                .list_page(partition, cursor.as_deref(), PageDirection::Older)
                .await?;
            pages += 1;

            if cursors.newest.is_none() {
                cursors.newest = page.newest_cursor.clone();
            }
            if page.oldest_cursor.is_some() {
                cursors.oldest = page.oldest_cursor.clone();
            }

            let exhausted = page.items.is_empty();
            items.extend(page.items);

            if !page.has_more || exhausted {
                break;
            }
            match page.oldest_cursor {
                Some(next) => cursor = Some(next),
                // Remote claims more pages but gave no cursor to reach them.
                None => break,
            }
        }

        Ok(PartitionFetch {
            partition,
            items,
            cursors,
            pages,
        })
    }

    /// Incremental walk: resume from the stored newest cursor in the
    /// `Newer` direction, bounded by the incremental page cap. The oldest
    /// cursor is left as the last full walk recorded it.
    async fn walk_newer(
        &self,
        partition: InboxPartition,
        mut cursors: CursorPair,
    ) -> Result<PartitionFetch, SourceError> {
        let mut items = Vec::new();
        let mut cursor = cursors.newest.clone();
        let mut pages = 0;

        while pages < self.options.incremental_page_cap {
            let page = self
                .source
                .list_page(partition, cursor.as_deref(), PageDirection::Newer)
                .await?;
            pages += 1;

            if page.newest_cursor.is_some() {
                cursors.newest = page.newest_cursor.clone();
            }

            // A stale resume cursor shows up as an empty page with no
            // `has_more` — the walk just ends; the next full refresh
            // rebuilds the cursors from scratch.
            let exhausted = page.items.is_empty();
            items.extend(page.items);

            if !page.has_more || exhausted {
                break;
            }
            match page.newest_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        Ok(PartitionFetch {
            partition,
            items,
            cursors,
            pages,
        })
    }
}

/// Merge one partition's fetch into the running state: last write wins per
/// conversation id, and every merged entry is re-tagged with the partition
/// it was just fetched under, with its search fields recomputed.
fn merge_partition(state: &mut CacheState, fetch: PartitionFetch) {
    let mut by_id: HashMap<String, usize> = state
        .items
        .iter()
        .enumerate()
        .map(|(position, item)| (item.conversation.id.clone(), position))
        .collect();

    for conversation in fetch.items {
        let entry = IndexedConversation::new(conversation, fetch.partition);
        match by_id.entry(entry.conversation.id.clone()) {
            std::collections::hash_map::Entry::Occupied(occupied) => {
                state.items[*occupied.get()] = entry;
            }
            std::collections::hash_map::Entry::Vacant(vacant) => {
                vacant.insert(state.items.len());
                state.items.push(entry);
            }
        }
    }

    *state.cursors.get_mut(fetch.partition) = fetch.cursors;
}
