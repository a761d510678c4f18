// crates/search/src/index.rs
//! In-memory search index over the cached conversation set.

use std::collections::BTreeSet;
use std::time::Instant;

use convo_view_core::{tokenize, IndexedConversation, SearchFields};
use tracing::debug;

use crate::matcher::match_token;

/// A searchable property of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchProperty {
    Title,
    Network,
    Participants,
}

impl SearchProperty {
    /// All searchable properties; the usual argument to [`SearchIndex::search`].
    pub const ALL: [SearchProperty; 3] = [
        SearchProperty::Title,
        SearchProperty::Network,
        SearchProperty::Participants,
    ];
}

/// Match evidence accumulated for one property of one conversation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropertyScore {
    /// Best (lowest) match confidence seen, `f64::INFINITY` when nothing
    /// matched this property.
    pub min_score: f64,
    /// Number of individual token-vs-field hits on this property.
    pub hit_count: usize,
}

impl Default for PropertyScore {
    fn default() -> Self {
        Self {
            min_score: f64::INFINITY,
            hit_count: 0,
        }
    }
}

impl PropertyScore {
    fn record(&mut self, score: f64) {
        self.min_score = self.min_score.min(score);
        self.hit_count += 1;
    }

    pub fn matched(&self) -> bool {
        self.hit_count > 0
    }
}

/// Per-conversation search result: evidence on each searchable property.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: String,
    pub title: PropertyScore,
    pub network: PropertyScore,
    pub participants: PropertyScore,
    /// Query tokens that matched at least one property.
    pub matched_tokens: Vec<String>,
}

impl SearchHit {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            title: PropertyScore::default(),
            network: PropertyScore::default(),
            participants: PropertyScore::default(),
            matched_tokens: Vec::new(),
        }
    }

    /// Evidence for one property, for callers that iterate properties.
    pub fn property(&self, property: SearchProperty) -> &PropertyScore {
        match property {
            SearchProperty::Title => &self.title,
            SearchProperty::Network => &self.network,
            SearchProperty::Participants => &self.participants,
        }
    }
}

struct IndexEntry {
    id: String,
    fields: SearchFields,
}

/// Immutable index over one committed cache snapshot.
///
/// Rebuilt whenever the snapshot changes; build is a flat O(n) copy of ids
/// and already-normalized search fields.
pub struct SearchIndex {
    entries: Vec<IndexEntry>,
}

impl SearchIndex {
    pub fn build(items: &[IndexedConversation]) -> Self {
        let entries = items
            .iter()
            .map(|item| IndexEntry {
                id: item.conversation.id.clone(),
                fields: item.search_fields.clone(),
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Search the indexed set for `raw_query` over the given properties.
    ///
    /// Policy: every non-stop-word query token must match at least one of
    /// the requested properties for a conversation to be included at all
    /// (conjunction, not union). An empty token list yields no results.
    pub fn search(&self, raw_query: &str, properties: &[SearchProperty]) -> Vec<SearchHit> {
        let tokens = tokenize(raw_query);
        if tokens.is_empty() {
            return Vec::new();
        }
        let start = Instant::now();
        let unique_tokens: BTreeSet<&str> = tokens.iter().map(String::as_str).collect();

        let mut hits = Vec::new();
        for entry in &self.entries {
            let mut hit = SearchHit::new(&entry.id);
            let mut matched: BTreeSet<&str> = BTreeSet::new();

            for token in &tokens {
                for &property in properties {
                    let mut on_property = false;
                    match property {
                        SearchProperty::Title => {
                            if let Some(m) = match_token(token, &entry.fields.title) {
                                hit.title.record(m.score());
                                on_property = true;
                            }
                        }
                        SearchProperty::Network => {
                            if let Some(m) = match_token(token, &entry.fields.network) {
                                hit.network.record(m.score());
                                on_property = true;
                            }
                        }
                        SearchProperty::Participants => {
                            for composite in &entry.fields.participants {
                                if let Some(m) = match_token(token, composite) {
                                    hit.participants.record(m.score());
                                    on_property = true;
                                }
                            }
                        }
                    }
                    if on_property {
                        matched.insert(token.as_str());
                    }
                }
            }

            if matched.len() == unique_tokens.len() {
                hit.matched_tokens = matched.into_iter().map(str::to_string).collect();
                hits.push(hit);
            }
        }

        debug!(
            query = raw_query,
            candidates = self.entries.len(),
            hits = hits.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "index search completed"
        );

        hits
    }
}
