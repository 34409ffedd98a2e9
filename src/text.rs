//! Lightweight preprocessing for open-ended survey text.
//!
//! Normalization keeps Unicode letters, numbers and whitespace only; the
//! second stage drops a small fixed stopword set. Both stages are total.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Conjunctions, articles and prepositions removed before matching.
pub const BASIC_STOPWORDS: [&str; 22] = [
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "in", "into", "is", "it",
    "of", "on", "or", "that", "the", "to", "we", "with",
];

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}\s]").expect("valid punctuation pattern"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

static STOPWORDS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| BASIC_STOPWORDS.into_iter().collect());

/// Lowercase, replace punctuation with spaces and squeeze whitespace.
///
/// Absent input yields an empty string.
pub fn normalize_text(text: Option<&str>) -> String {
    let Some(text) = text else {
        return String::new();
    };
    let lowered = text.to_lowercase();
    let no_punct = NON_WORD.replace_all(&lowered, " ");
    WHITESPACE.replace_all(&no_punct, " ").trim().to_string()
}

/// Drop stopword tokens, keeping the remaining tokens in order.
pub fn remove_stopwords(text: &str, stopwords: &HashSet<&str>) -> String {
    text.split_whitespace()
        .filter(|token| !stopwords.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Full preprocessing for a single string: normalize, then drop stopwords.
pub fn preprocess_text(text: &str) -> String {
    remove_stopwords(&normalize_text(Some(text)), &STOPWORDS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_punctuation_and_case() {
        assert_eq!(
            normalize_text(Some("  Tuition is TOO expensive!!  We can't cope.")),
            "tuition is too expensive we can t cope"
        );
    }

    #[test]
    fn test_normalize_absent_is_empty() {
        assert_eq!(normalize_text(None), "");
        assert_eq!(normalize_text(Some("   ")), "");
    }

    #[test]
    fn test_normalize_keeps_unicode_letters() {
        assert_eq!(normalize_text(Some("Guardería—CERRADA, año 2024")), "guardería cerrada año 2024");
    }

    #[test]
    fn test_remove_stopwords_preserves_order() {
        let stopwords: HashSet<&str> = BASIC_STOPWORDS.into_iter().collect();
        assert_eq!(
            remove_stopwords("we are on the waitlist for a center", &stopwords),
            "waitlist center"
        );
    }

    #[test]
    fn test_preprocess_is_idempotent() {
        let once = preprocess_text("The stress of juggling work and caregiving is overwhelming.");
        assert_eq!(once, "stress juggling work caregiving overwhelming");
        assert_eq!(preprocess_text(&once), once);
    }
}
