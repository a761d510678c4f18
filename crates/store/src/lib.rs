// crates/store/src/lib.rs
//! Local mirror of the remote conversation collection.
//!
//! The remote service exposes three cursor-paginated inbox partitions
//! (primary, low-priority, archive). This crate keeps a bounded local mirror
//! of them — merged by conversation id, sorted by activity, persisted as a
//! single versioned JSON blob — plus the usage (recent/frecency) state fed
//! by visit events.
//!
//! - **Write path**: `CacheStore::refresh` — fan-out page fetches per
//!   partition, join, merge, truncate, commit, persist. Guarded by a
//!   single-flight mutex; concurrent requests are dropped, not queued.
//! - **Read path**: `CacheStore::snapshot` — an `Arc` of the last committed
//!   state; readers never observe a partially merged mirror.

pub mod cache;
pub mod persist;
pub mod source;
pub mod testing;
pub mod usage;

pub use cache::{
    CacheOptions, CacheState, CacheStore, CursorPair, PartitionCursors, RefreshMode,
    RefreshOutcome,
};
pub use persist::StateStore;
pub use source::{ConversationPage, ConversationSource, PageDirection};
pub use usage::{UsageState, UsageStore};
