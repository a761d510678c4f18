// crates/core/src/normalize.rs
//! Text canonicalization for the search index.
//!
//! Converts raw conversation text (titles, participant names, handles) into
//! a normalized, comparable form:
//!
//! 1. Unicode canonical decomposition (NFD)
//! 2. Strip combining marks (diacritic folding: "José" → "jose")
//! 3. Lowercase
//! 4. Fold punctuation/symbols to spaces
//! 5. Collapse whitespace runs, trim
//!
//! `normalize` is total and idempotent — it never fails, and running it
//! twice yields the same string.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Punctuation and symbol characters folded to spaces before tokenization.
/// Kept to a fixed set so normalization stays deterministic across Unicode
/// versions.
const FOLDED_PUNCTUATION: &str = ".,;:!?\"'`()[]{}<>@#$%^&*+=|\\/~_-–—…";

/// Tokens dropped from queries and indexed fields. Deliberately tiny —
/// conversation titles are short, so aggressive stop-wording hurts recall.
const STOP_WORDS: &[&str] = &["and", "the", "of"];

/// Canonicalize free text into a comparable form. Empty input → empty output.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.nfd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_whitespace() || FOLDED_PUNCTUATION.contains(ch) {
            if !out.is_empty() && !out.ends_with(' ') {
                out.push(' ');
            }
            continue;
        }
        for folded in ch.to_lowercase() {
            out.push(folded);
        }
    }
    if out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Split normalized text into tokens, dropping empties and stop words.
pub fn tokenize(text: &str) -> Vec<String> {
    normalize(text)
        .split(' ')
        .filter(|token| !token.is_empty() && !STOP_WORDS.contains(token))
        .map(str::to_string)
        .collect()
}

/// Keep only ASCII digits — used to make phone numbers comparable
/// regardless of formatting ("+1 (555) 010-4477" → "15550104477").
pub fn digits_only(text: &str) -> String {
    text.chars().filter(char::is_ascii_digit).collect()
}
