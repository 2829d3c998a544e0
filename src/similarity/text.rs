//! Lexical text similarity: pure, deterministic, never fails.
//!
//! Two measures are exposed:
//! - [`token_sort_ratio`]: order-insensitive fuzzy ratio over the sorted
//!   token strings (character-bigram Sørensen–Dice via `strsim`).
//! - [`word_overlap`]: Jaccard index over stop-word-filtered words longer
//!   than three characters.

use super::tokens;

/// Order-insensitive fuzzy similarity of two strings in `[0, 1]`.
///
/// Both inputs are normalized, split into tokens, sorted and re-joined before
/// comparison, so reorderings of the same words score 1.0. Case differences
/// are ignored. Both empty yields 1.0, exactly one empty yields 0.0.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    let sorted_a = sorted_tokens(a);
    let sorted_b = sorted_tokens(b);

    if sorted_a.is_empty() && sorted_b.is_empty() {
        return 1.0;
    }
    if sorted_a.is_empty() || sorted_b.is_empty() {
        return 0.0;
    }

    strsim::sorensen_dice(&sorted_a, &sorted_b)
}

/// Jaccard overlap of meaningful words (longer than three characters, stop
/// words removed). Either side empty after filtering yields 0.0.
pub fn word_overlap(a: &str, b: &str) -> f64 {
    let set_a = tokens::significant_word_set(a, 3);
    let set_b = tokens::significant_word_set(b, 3);
    tokens::jaccard(&set_a, &set_b)
}

fn sorted_tokens(text: &str) -> String {
    let mut parts = tokens::tokens(text);
    parts.sort_unstable();
    parts.join(" ")
}
