//! Port entries and their provenance.

use crate::error::{PortsError, Result};
use portmatch_geo::{is_valid_lat_lng, Coordinate};
use portmatch_search::{match_key, normalize, SearchResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A scored port returned by searches.
pub type PortMatch = SearchResult<PortEntry>;

/// Where a [`PortEntry`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortSource {
    /// Hand-vetted cruise port list
    Curated,
    /// Bulk-imported port list
    Master,
    /// Persisted in the ports cache
    Cache,
    /// Fresh from the online geocoder, not yet cached
    Online,
    /// Synthetic or unlabelled
    #[default]
    Unknown,
}

impl PortSource {
    /// Tie-break rank for equal scores, lower wins.
    pub fn rank(self) -> u8 {
        match self {
            PortSource::Cache => 0,
            PortSource::Curated => 1,
            PortSource::Master => 2,
            PortSource::Online | PortSource::Unknown => 3,
        }
    }

    /// Lowercase wire name
    pub fn as_str(self) -> &'static str {
        match self {
            PortSource::Curated => "curated",
            PortSource::Master => "master",
            PortSource::Cache => "cache",
            PortSource::Online => "online",
            PortSource::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PortSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A geographic port, terminal or anchorage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortEntry {
    /// Display name
    pub name: String,
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lng: f64,
    /// ISO country code or country name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// State/province code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_code: Option<String>,
    /// Alternate names used for matching
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    /// Provenance
    #[serde(default)]
    pub source: PortSource,
    /// Whether the port serves cruise ships
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_cruise: Option<bool>,
    /// UN/LOCODE
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locode: Option<String>,
    /// Text that produced this entry from an online lookup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_query: Option<String>,
    /// Epoch ms when first persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<i64>,
    /// Epoch ms of the last cache read or write
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_accessed: Option<i64>,
}

impl PortEntry {
    /// Create an entry with only the required fields set.
    pub fn new(name: impl Into<String>, lat: f64, lng: f64, source: PortSource) -> Self {
        Self {
            name: name.into(),
            lat,
            lng,
            country: None,
            region_code: None,
            aliases: Vec::new(),
            source,
            is_cruise: None,
            locode: None,
            original_query: None,
            saved_at: None,
            last_accessed: None,
        }
    }

    /// Set the country
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// Set the alias list
    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    /// Position as a [`Coordinate`]
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }

    /// Identity of the display name: case and diacritics folded, words kept.
    ///
    /// Two entries are the same port only when their keys are equal, so
    /// "Port of Spain" and "Spain" stay distinct. Query matching goes through
    /// [`answers_to`](Self::answers_to) instead.
    pub fn key(&self) -> String {
        normalize(&self.name)
    }

    /// Display name followed by aliases.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    /// Whether `key` (already a match key) names this entry or one of its aliases.
    pub fn answers_to(&self, key: &str) -> bool {
        !key.is_empty() && self.names().any(|name| match_key(name) == key)
    }

    /// Check the name and coordinate invariants.
    pub fn validate(&self) -> Result<()> {
        if self.key().is_empty() {
            return Err(PortsError::InvalidEntry("empty name".to_string()));
        }
        if !is_valid_lat_lng(self.lat, self.lng) {
            return Err(PortsError::InvalidEntry(format!(
                "{}: coordinate {}, {} out of range",
                self.name, self.lat, self.lng
            )));
        }
        Ok(())
    }
}

/// Ranking order: score descending, then cache, curated, master, other,
/// then shorter display name.
pub(crate) fn compare_matches(a: &PortMatch, b: &PortMatch) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.item.source.rank().cmp(&b.item.source.rank()))
        .then_with(|| a.item.name.chars().count().cmp(&b.item.name.chars().count()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_case_wire_format() {
        let mut entry = PortEntry::new("Kailua-Kona", 19.64, -155.9969, PortSource::Cache)
            .with_aliases(["Kona"]);
        entry.original_query = Some("Kona (history)".to_string());
        entry.saved_at = Some(1_700_000_000_000);
        entry.last_accessed = Some(1_700_000_000_500);

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["source"], "cache");
        assert_eq!(json["originalQuery"], "Kona (history)");
        assert_eq!(json["savedAt"], 1_700_000_000_000_i64);
        assert_eq!(json["lastAccessed"], 1_700_000_000_500_i64);
        assert!(json.get("country").is_none());
    }

    #[test]
    fn test_unknown_fields_ignored_and_defaults() {
        let entry: PortEntry =
            serde_json::from_str(r#"{"name":"Sitka","lat":57.05,"lng":-135.33,"extra":{"x":1}}"#)
                .unwrap();
        assert_eq!(entry.source, PortSource::Unknown);
        assert!(entry.aliases.is_empty());
        assert!(entry.saved_at.is_none());
    }

    #[test]
    fn test_empty_aliases_omitted() {
        let entry = PortEntry::new("Sitka", 57.05, -135.33, PortSource::Curated);
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("aliases"));
    }

    #[test]
    fn test_key_keeps_noise_words() {
        let entry = PortEntry::new("Port of Spain", 10.65, -61.52, PortSource::Master);
        assert_eq!(entry.key(), "port of spain");
        assert_ne!(entry.key(), PortEntry::new("Spain", 40.0, -3.7, PortSource::Online).key());
        assert!(entry.answers_to(&match_key("Port of Spain")));
    }

    #[test]
    fn test_answers_to_alias() {
        let entry = PortEntry::new("Charlotte Amalie", 18.34, -64.93, PortSource::Curated)
            .with_aliases(["St. Thomas"]);
        assert!(entry.answers_to(&match_key("st. thomas")));
        assert!(entry.answers_to(&match_key("Port of Charlotte Amalie")));
        assert!(!entry.answers_to(""));
    }

    #[test]
    fn test_validate() {
        assert!(PortEntry::new("Hilo", 19.73, -155.09, PortSource::Curated).validate().is_ok());
        assert!(PortEntry::new("  ", 19.73, -155.09, PortSource::Curated).validate().is_err());
        assert!(PortEntry::new("Nowhere", 95.0, 0.0, PortSource::Curated).validate().is_err());
        assert!(PortEntry::new("Nowhere", f64::NAN, 0.0, PortSource::Curated).validate().is_err());
    }

    #[test]
    fn test_compare_matches_tie_break() {
        let cache = PortMatch::new(PortEntry::new("Nassau", 25.0, -77.3, PortSource::Cache), 0.9);
        let curated = PortMatch::new(PortEntry::new("Nassau", 25.0, -77.3, PortSource::Curated), 0.9);
        let short = PortMatch::new(PortEntry::new("Ab", 0.0, 0.0, PortSource::Master), 0.9);
        let long = PortMatch::new(PortEntry::new("Abcdef", 0.0, 0.0, PortSource::Master), 0.9);
        let best = PortMatch::new(PortEntry::new("Zzz", 0.0, 0.0, PortSource::Online), 0.95);

        let mut all = vec![long.clone(), short.clone(), curated.clone(), cache.clone(), best.clone()];
        all.sort_by(compare_matches);
        assert_eq!(all, vec![best, cache, curated, short, long]);
    }
}
