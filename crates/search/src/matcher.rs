// crates/search/src/matcher.rs
//! Token-against-field matching with explicit match kinds.
//!
//! Both sides are expected to be pre-normalized (see `convo_view_core::normalize`).
//! A token either appears literally inside the field value or it does not
//! match at all; the variants only grade *where* it appeared.

/// How a query token landed inside a normalized field value.
///
/// Ordering of the variants reflects match affinity: an `Exact` hit is
/// stronger evidence than a `Prefix` hit, and so on down to `Interior`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenMatch {
    /// Token equals the entire field value.
    Exact,
    /// Field value starts with the token.
    Prefix,
    /// Token starts at a word boundary inside the field value.
    WordStart { at: usize },
    /// Token appears mid-word.
    Interior { at: usize },
}

impl TokenMatch {
    /// Match confidence, lower = better. Exact and substring hits all score
    /// near zero — the grading only breaks ties between hit kinds, it never
    /// lets a non-substring through.
    pub fn score(&self) -> f64 {
        match self {
            TokenMatch::Exact => 0.0,
            TokenMatch::Prefix => 0.01,
            TokenMatch::WordStart { .. } => 0.02,
            TokenMatch::Interior { .. } => 0.05,
        }
    }

    /// Byte offset of the hit within the field value.
    pub fn position(&self) -> usize {
        match self {
            TokenMatch::Exact | TokenMatch::Prefix => 0,
            TokenMatch::WordStart { at } | TokenMatch::Interior { at } => *at,
        }
    }
}

/// Match one normalized query token against one normalized field value.
///
/// Returns `None` unless the token is a literal substring of the field.
/// When the token occurs several times, a word-boundary occurrence is
/// preferred over an earlier mid-word one.
pub fn match_token(token: &str, field: &str) -> Option<TokenMatch> {
    if token.is_empty() || field.is_empty() {
        return None;
    }
    if field == token {
        return Some(TokenMatch::Exact);
    }

    let mut first_interior = None;
    for (at, _) in field.match_indices(token) {
        if at == 0 {
            return Some(TokenMatch::Prefix);
        }
        if field.as_bytes()[at - 1] == b' ' {
            return Some(TokenMatch::WordStart { at });
        }
        if first_interior.is_none() {
            first_interior = Some(at);
        }
    }
    first_interior.map(|at| TokenMatch::Interior { at })
}
