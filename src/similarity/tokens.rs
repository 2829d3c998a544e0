//! Text normalization and token extraction shared by the similarity measures
//! and the keyword search strategy.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Common English words that carry no matching signal.
static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
        "from", "is", "are", "was", "were", "be", "been", "being", "this", "that", "these",
        "those", "it", "its", "as", "into", "will", "would", "should", "can", "could", "has",
        "have", "had", "not", "we", "our", "they", "their",
    ]
    .into_iter()
    .collect()
});

pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(word)
}

/// Lowercase and replace every non-alphanumeric character with a space,
/// collapsing runs of whitespace. "Fix login-page CSS!" -> "fix login page css".
pub fn normalize(text: &str) -> String {
    let lower = text.to_lowercase();
    let cleaned: String = lower
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized tokens in order of appearance.
pub fn tokens(text: &str) -> Vec<String> {
    normalize(text)
        .split_whitespace()
        .map(|t| t.to_string())
        .collect()
}

/// Set of normalized tokens strictly longer than `longer_than` characters.
pub fn word_set(text: &str, longer_than: usize) -> HashSet<String> {
    tokens(text)
        .into_iter()
        .filter(|t| t.len() > longer_than)
        .collect()
}

/// Like [`word_set`] with the stop-word filter applied on top.
pub fn significant_word_set(text: &str, longer_than: usize) -> HashSet<String> {
    word_set(text, longer_than)
        .into_iter()
        .filter(|t| !is_stop_word(t))
        .collect()
}

/// Jaccard index of two word sets. Either side empty yields 0.0.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}

/// Search terms for the keyword strategy: non-stop-word tokens longer than
/// three characters, first appearance wins, capped at `max_terms`.
pub fn extract_keywords(text: &str, max_terms: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    tokens(text)
        .into_iter()
        .filter(|t| t.len() > 3 && !is_stop_word(t))
        .filter(|t| seen.insert(t.clone()))
        .take(max_terms)
        .collect()
}
