//! Character-level similarity primitives.
//!
//! Both functions operate on `char`s, not bytes, so accented names that
//! survived normalization are compared per letter.

/// Edit-distance similarity: `1 - levenshtein(a, b) / max(len(a), len(b))`.
///
/// Two empty strings are identical (`1.0`).
pub fn edit_similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    let distance = strsim::levenshtein(a, b);
    1.0 - distance as f64 / max_len as f64
}

/// Jaro-Winkler similarity in `[0, 1]`, favouring shared prefixes.
pub fn jaro_winkler_similarity(a: &str, b: &str) -> f64 {
    strsim::jaro_winkler(a, b)
}
