//! Text normalization for port names and queries.
//!
//! Two layers:
//! - [`normalize`] folds case and diacritics ("Cozumél" → "cozumel")
//! - [`sanitize_port_query`] strips noise phrases around the proper noun
//!   ("History of the Port of Tianjin" → "Tianjin")
//!
//! [`match_key`] combines both and is the identity used for cache lookups
//! and scoring.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static TRAILING_PARENTHETICAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\([^()]*\)\s*$").expect("valid parenthetical regex"));

static LEADING_NOISE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:history\s+of\s+)?(?:the\s+)?(?:port\s+of\s+|port\s*:\s*)")
        .expect("valid leading noise regex")
});

static TRAILING_NOISE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s+(?:cruise\s+(?:port|terminal)|port)\s*$").expect("valid trailing noise regex")
});

/// Trim, strip diacritical marks and lowercase.
///
/// # Example
/// ```
/// use portmatch_search::normalize;
///
/// assert_eq!(normalize("Cozumél"), "cozumel");
/// assert_eq!(normalize("  Seattle  "), "seattle");
/// ```
pub fn normalize(s: &str) -> String {
    let folded: String = s
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();
    folded.trim().to_string()
}

/// Remove noise phrases and annotations, keeping the proper-noun fragment.
///
/// Case is preserved. Input that would be stripped to nothing is returned
/// trimmed instead.
///
/// # Example
/// ```
/// use portmatch_search::sanitize_port_query;
///
/// assert_eq!(sanitize_port_query("History of the Port of Tianjin"), "Tianjin");
/// assert_eq!(sanitize_port_query("Port: Hilo"), "Hilo");
/// assert_eq!(sanitize_port_query("Kona (history)"), "Kona");
/// ```
pub fn sanitize_port_query(s: &str) -> String {
    let mut text = s.trim().to_string();

    loop {
        let stripped = TRAILING_PARENTHETICAL.replace(&text, "");
        if stripped.len() == text.len() {
            break;
        }
        text = stripped.into_owned();
    }

    text = LEADING_NOISE.replace(&text, "").into_owned();
    text = TRAILING_NOISE.replace(&text, "").into_owned();

    let cleaned = collapse_whitespace(&text)
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | ':' | '-'))
        .to_string();

    if cleaned.is_empty() {
        collapse_whitespace(s)
    } else {
        cleaned
    }
}

/// Normalized, sanitized form used as the identity of a port name.
pub fn match_key(s: &str) -> String {
    normalize(&sanitize_port_query(s))
}

/// Split normalized text on non-alphanumeric boundaries.
pub fn tokenize(s: &str) -> Vec<String> {
    normalize(s)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_diacritics_and_case() {
        assert_eq!(normalize("Cozumél"), "cozumel");
        assert_eq!(normalize("SÃO SEBASTIÃO"), "sao sebastiao");
        assert_eq!(normalize("Ålesund"), "alesund");
    }

    #[test]
    fn test_normalize_trims() {
        assert_eq!(normalize("  Seattle  "), "seattle");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_sanitize_examples() {
        assert_eq!(sanitize_port_query("History of the Port of Tianjin"), "Tianjin");
        assert_eq!(sanitize_port_query("Port: Hilo"), "Hilo");
        assert_eq!(sanitize_port_query("Kona (history)"), "Kona");
        assert_eq!(sanitize_port_query("Sitka"), "Sitka");
    }

    #[test]
    fn test_sanitize_suffixes() {
        assert_eq!(sanitize_port_query("Juneau Cruise Port"), "Juneau");
        assert_eq!(sanitize_port_query("Skagway cruise terminal"), "Skagway");
        assert_eq!(sanitize_port_query("Kona Port (tender)"), "Kona");
    }

    #[test]
    fn test_sanitize_keeps_port_names() {
        assert_eq!(sanitize_port_query("Port Canaveral"), "Port Canaveral");
        assert_eq!(sanitize_port_query("Portland"), "Portland");
        assert_eq!(sanitize_port_query("Newport"), "Newport");
    }

    #[test]
    fn test_sanitize_never_empties() {
        assert_eq!(sanitize_port_query("  Port  "), "Port");
        assert_eq!(sanitize_port_query(""), "");
    }

    #[test]
    fn test_match_key() {
        assert_eq!(match_key("Port of Seattle"), "seattle");
        assert_eq!(match_key("  COZUMÉL (Mexico)"), "cozumel");
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("St. John's, Antigua"), vec!["st", "john", "s", "antigua"]);
        assert!(tokenize(" -- ").is_empty());
    }

    proptest! {
        #[test]
        fn prop_normalize_idempotent(s in "[ a-zA-Z\\u{00C0}-\\u{024F}]{0,30}") {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn prop_sanitize_idempotent_on_clean_names(s in "[A-Z][a-z]{2,12}") {
            prop_assert_eq!(sanitize_port_query(&s), s);
        }
    }
}
