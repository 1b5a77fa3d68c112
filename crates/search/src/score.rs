//! Query-to-name confidence scoring.
//!
//! The query is split into tokens and every token is compared against the
//! whole candidate name. Exact, prefix and substring hits score high; other
//! tokens fall back to typo-tolerant edit distance.

use crate::fuzzy::{edit_similarity, jaro_winkler_similarity};
use crate::normalize::match_key;

/// Below this edit similarity the Jaro-Winkler rescue is attempted.
const EDIT_RESCUE_BELOW: f64 = 0.75;

/// Scale applied to the Jaro-Winkler rescue.
const JARO_WINKLER_SCALE: f64 = 0.9;

/// Scale applied to any fuzzy (non-literal) token hit.
const FUZZY_SCALE: f64 = 0.8;

/// Which rule decided a token's contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchKind {
    /// Only edit-distance similarity
    Fuzzy,
    /// Token found inside the candidate
    Contains,
    /// Candidate starts with the token
    Prefix,
    /// Token equals the candidate
    Exact,
}

impl MatchKind {
    /// Fixed contribution for literal matches; `None` for fuzzy.
    pub fn weight(self) -> Option<f64> {
        match self {
            MatchKind::Exact => Some(1.0),
            MatchKind::Prefix => Some(0.95),
            MatchKind::Contains => Some(0.85),
            MatchKind::Fuzzy => None,
        }
    }
}

/// Contribution of a single normalized query token against a normalized
/// candidate.
pub fn token_score(token: &str, candidate: &str) -> (MatchKind, f64) {
    let kind = classify(token, candidate);
    if let Some(weight) = kind.weight() {
        return (kind, weight);
    }

    let mut sim = edit_similarity(token, candidate);
    if sim < EDIT_RESCUE_BELOW {
        sim = sim.max(jaro_winkler_similarity(token, candidate) * JARO_WINKLER_SCALE);
    }
    (kind, (sim * FUZZY_SCALE).max(0.0))
}

fn classify(token: &str, candidate: &str) -> MatchKind {
    if token == candidate {
        MatchKind::Exact
    } else if candidate.starts_with(token) {
        MatchKind::Prefix
    } else if token.chars().count() >= 3 && candidate.contains(token) {
        MatchKind::Contains
    } else {
        MatchKind::Fuzzy
    }
}

/// Confidence in `[0, 1]` that `candidate` names the place `query` means.
///
/// # Example
/// ```
/// use portmatch_search::score_name;
///
/// assert_eq!(score_name("Juneau", "juneau"), 1.0);
/// assert!(score_name("Cozumel", "Cozuml") > 0.65);
/// assert!(score_name("Port of Seattle", "Seattle") > 0.5);
/// ```
pub fn score_name(query: &str, candidate: &str) -> f64 {
    let query = match_key(query);
    let candidate = match_key(candidate);

    if query.is_empty() {
        return 0.0;
    }
    if query == candidate {
        return 1.0;
    }

    let tokens: Vec<&str> = query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty() {
        return 0.0;
    }

    let total: f64 = tokens
        .iter()
        .map(|token| token_score(token, &candidate).1)
        .sum();

    (total / tokens.len() as f64).clamp(0.0, 1.0)
}

/// Best score of `query` against a primary name and its aliases.
pub fn best_score<'a, I>(query: &str, names: I) -> f64
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .map(|name| score_name(query, name))
        .fold(0.0, f64::max)
}
