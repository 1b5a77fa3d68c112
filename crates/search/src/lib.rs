//! Fuzzy port-name matching.
//!
//! This crate provides:
//! - Unicode-aware normalization (case and diacritic folding)
//! - Noise-phrase stripping for itinerary labels
//! - Token-based Levenshtein / Jaro-Winkler confidence scoring
//!
//! All functions are pure and total: they never fail and empty input yields
//! empty output (or a zero score).

mod fuzzy;
mod normalize;
mod score;

pub use fuzzy::{edit_similarity, jaro_winkler_similarity};
pub use normalize::{match_key, normalize, sanitize_port_query, tokenize};
pub use score::{best_score, score_name, token_score, MatchKind};

/// Search result with confidence score.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SearchResult<T> {
    /// The matched item
    pub item: T,
    /// Confidence in `[0, 1]` (higher is better)
    pub score: f64,
}

impl<T> SearchResult<T> {
    /// Pair an item with its score
    pub fn new(item: T, score: f64) -> Self {
        Self { item, score }
    }
}
