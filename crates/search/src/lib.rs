//! Full-text search over the cached conversation set.
//!
//! The cache mirrors the remote conversation collection locally; this crate
//! turns that mirror into an in-memory index and answers interactive queries
//! against it. Matching is an explicit, owned substring/token matcher — a
//! tagged variant per hit rather than an opaque fuzzy-library score — so the
//! scoring semantics stay testable in isolation.
//!
//! # Architecture
//!
//! - **Matcher** (`matcher`): one query token vs one normalized field value
//!   → `Option<TokenMatch>` (Exact / Prefix / WordStart / Interior)
//! - **Index** (`index`): `SearchIndex::build` over the cached set;
//!   `search` applies the conjunctive all-tokens-must-match policy and
//!   summarizes evidence per property
//! - **Ranker** (`rank`): combines match evidence with recency and
//!   conversation-type signals into a total order
//!
//! Everything here is pure and synchronous: no suspension points, no
//! locking, safe to call on every keystroke. The index is cheap to rebuild
//! (O(n) over cached conversations, each with at most three searchable
//! properties) and is reconstructed whenever the cache snapshot changes.

pub mod index;
pub mod matcher;
pub mod rank;

pub use index::{PropertyScore, SearchHit, SearchIndex, SearchProperty};
pub use matcher::{match_token, TokenMatch};
pub use rank::rank_conversations;
