//! Lexical similarity scoring.
//!
//! Text is lowercased, stripped of punctuation and split on whitespace.
//! Two texts are compared by the cosine of their term vectors, where each
//! distinct term has weight one:
//!
//! ```text
//! similarity(a, b) = |terms(a) ∩ terms(b)| / sqrt(|terms(a)| * |terms(b)|)
//! ```
//!
//! The score is 0 for disjoint vocabularies, 1 for texts with the same
//! vocabulary, and never drops when a candidate gains a term the query
//! contains.

// Allow expect() on static regex patterns - these are guaranteed to compile
#![allow(clippy::expect_used)]

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Anything that is neither a letter, a digit nor whitespace.
static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}\s]").expect("static regex: punctuation"));

/// Lowercases `text` and removes punctuation.
#[must_use]
pub fn normalize(text: &str) -> String {
    PUNCTUATION.replace_all(&text.to_lowercase(), "").into_owned()
}

/// Splits normalized `text` into terms.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    normalize(text)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// The distinct terms of a text, precomputed once per stored record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermSet {
    terms: HashSet<String>,
}

impl TermSet {
    /// Builds the term set of `text`.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self {
            terms: tokenize(text).into_iter().collect(),
        }
    }

    /// Number of distinct terms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Returns true if the text had no terms after normalization.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Returns true if `term` (already normalized) is present.
    #[must_use]
    pub fn contains(&self, term: &str) -> bool {
        self.terms.contains(term)
    }

    /// Cosine similarity against `other`, in `[0, 1]`.
    ///
    /// Returns 0 if either side has no terms.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn similarity(&self, other: &Self) -> f64 {
        if self.is_empty() || other.is_empty() {
            return 0.0;
        }

        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        let shared = small.terms.iter().filter(|t| large.contains(t)).count();
        if shared == 0 {
            return 0.0;
        }
        if shared == self.len() && shared == other.len() {
            return 1.0;
        }

        let norm = ((self.len() * other.len()) as f64).sqrt();
        (shared as f64 / norm).clamp(0.0, 1.0)
    }
}

/// Scores `query` against `candidate` in `[0, 1]`.
#[must_use]
pub fn similarity(query: &str, candidate: &str) -> f64 {
    TermSet::from_text(query).similarity(&TermSet::from_text(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_normalize_strips_punctuation() {
        assert_eq!(normalize("Hello, World! API."), "hello world api");
        assert_eq!(normalize("Shadcn/ui"), "shadcnui");
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("  Successfully implemented\tuser-auth API "),
            vec!["successfully", "implemented", "userauth", "api"]
        );
        assert!(tokenize("?!... ---").is_empty());
    }

    #[test_case("authentication api", "authentication api", 1.0; "identical")]
    #[test_case("API Authentication!", "authentication api", 1.0; "case and punctuation")]
    #[test_case("cache latency", "authentication api", 0.0; "disjoint")]
    #[test_case("...", "authentication api", 0.0; "punctuation only query")]
    #[test_case("authentication", "", 0.0; "empty candidate")]
    fn test_similarity_anchors(query: &str, candidate: &str, expected: f64) {
        assert!((similarity(query, candidate) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_similarity_partial_overlap() {
        let score = similarity(
            "authentication API performance",
            "Successfully implemented user authentication API",
        );
        // 2 shared of 3 and 5 distinct terms
        assert!((score - 2.0 / 15.0_f64.sqrt()).abs() < 1e-12);
        assert!(score > 0.3);
    }

    #[test]
    fn test_similarity_symmetric() {
        let a = "slow database queries under load";
        let b = "database load testing";
        assert!((similarity(a, b) - similarity(b, a)).abs() < 1e-12);
    }

    #[test]
    fn test_similarity_monotonic_in_shared_terms() {
        let query = TermSet::from_text("database latency regression");
        let base = TermSet::from_text("observed regression in checkout flow");
        let more = TermSet::from_text("observed regression in checkout flow database");
        let repeated = TermSet::from_text("observed regression regression in checkout flow");

        assert!(query.similarity(&more) >= query.similarity(&base));
        assert!((query.similarity(&repeated) - query.similarity(&base)).abs() < 1e-12);
    }
}
