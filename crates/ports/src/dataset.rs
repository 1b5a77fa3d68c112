//! Read-only reference datasets.
//!
//! The index merges a small curated cruise-port list with a larger master
//! list. Master entries whose name collides with a curated entry are dropped
//! at load time so each place appears once, with curated data.

use crate::error::{PortsError, Result};
use crate::model::{compare_matches, PortEntry, PortMatch, PortSource};
use portmatch_geo::{haversine_distance, Coordinate};
use portmatch_search::{best_score, match_key};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

const CURATED_JSON: &str = include_str!("../data/curated_ports.json");
const MASTER_JSON: &str = include_str!("../data/master_ports.json");

/// Candidates scoring below this are never returned.
pub const DEFAULT_MIN_SCORE: f64 = 0.5;

/// Merged curated + master port list.
#[derive(Debug, Clone)]
pub struct DatasetIndex {
    entries: Vec<PortEntry>,
    min_score: f64,
}

impl DatasetIndex {
    /// Index over the datasets bundled with this crate.
    pub fn builtin() -> Result<Self> {
        Self::from_json(CURATED_JSON, MASTER_JSON)
    }

    /// Index over caller-supplied curated and master JSON arrays.
    ///
    /// Elements that fail to decode or validate are skipped with a warning;
    /// a document that is not an array is an error.
    pub fn from_json(curated: &str, master: &str) -> Result<Self> {
        let curated = decode_dataset(curated, PortSource::Curated)?;
        let master = decode_dataset(master, PortSource::Master)?;
        Ok(Self::from_entries(curated, master))
    }

    /// Bundled curated list plus a master list read from `path`.
    pub fn with_master_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let master = std::fs::read_to_string(path)
            .map_err(|e| PortsError::Dataset(format!("{}: {e}", path.display())))?;
        Self::from_json(CURATED_JSON, &master)
    }

    fn from_entries(curated: Vec<PortEntry>, master: Vec<PortEntry>) -> Self {
        let mut seen: HashSet<String> = HashSet::with_capacity(curated.len() + master.len());
        let mut entries = Vec::with_capacity(curated.len() + master.len());

        for entry in curated.into_iter().chain(master) {
            if seen.insert(entry.key()) {
                entries.push(entry);
            } else {
                debug!(name = %entry.name, source = %entry.source, "Skipping duplicate dataset entry");
            }
        }

        Self {
            entries,
            min_score: DEFAULT_MIN_SCORE,
        }
    }

    /// Override the score floor.
    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = min_score.clamp(0.0, 1.0);
        self
    }

    /// Current score floor
    pub fn min_score(&self) -> f64 {
        self.min_score
    }

    /// Rank entries against `query` by name and aliases, best first.
    ///
    /// Equal scores prefer curated entries, then shorter names.
    pub fn search(&self, query: &str, limit: usize) -> Vec<PortMatch> {
        if limit == 0 || match_key(query).is_empty() {
            return Vec::new();
        }

        let mut matches: Vec<PortMatch> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let score = best_score(query, entry.names());
                (score >= self.min_score).then(|| PortMatch::new(entry.clone(), score))
            })
            .collect();

        matches.sort_by(compare_matches);
        matches.truncate(limit);
        matches
    }

    /// Entries closest to `coordinate` with their distance in km.
    pub fn nearest(&self, coordinate: &Coordinate, limit: usize) -> Vec<(PortEntry, f64)> {
        let mut ranked: Vec<(PortEntry, f64)> = self
            .entries
            .iter()
            .map(|entry| {
                let distance = haversine_distance(coordinate, &entry.coordinate());
                (entry.clone(), distance)
            })
            .collect();

        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
        ranked.truncate(limit);
        ranked
    }

    /// Number of indexed entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all entries, curated first.
    pub fn iter(&self) -> impl Iterator<Item = &PortEntry> {
        self.entries.iter()
    }
}

fn decode_dataset(json: &str, source: PortSource) -> Result<Vec<PortEntry>> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let serde_json::Value::Array(items) = value else {
        return Err(PortsError::Dataset(format!("{source} dataset is not a JSON array")));
    };

    let mut entries = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let decoded = serde_json::from_value::<PortEntry>(item)
            .map_err(PortsError::from)
            .and_then(|entry| entry.validate().map(|()| entry));
        match decoded {
            Ok(mut entry) => {
                entry.source = source;
                entries.push(entry);
            }
            Err(e) => warn!(%source, index, error = %e, "Skipping invalid dataset entry"),
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> DatasetIndex {
        DatasetIndex::builtin().expect("bundled datasets decode")
    }

    #[test]
    fn test_builtin_loads_both_lists() {
        let index = index();
        assert!(index.len() > 90);
        assert!(index.iter().any(|e| e.source == PortSource::Curated));
        assert!(index.iter().any(|e| e.source == PortSource::Master));
    }

    #[test]
    fn test_curated_wins_duplicates() {
        let index = index();
        let seattle: Vec<_> = index.iter().filter(|e| e.key() == "seattle").collect();
        assert_eq!(seattle.len(), 1);
        assert_eq!(seattle[0].source, PortSource::Curated);
    }

    #[test]
    fn test_search_exact_and_alias() {
        let index = index();

        let juneau = index.search("Juneau", 5);
        assert_eq!(juneau[0].item.name, "Juneau");
        assert_eq!(juneau[0].score, 1.0);

        let kona = index.search("Kona", 3);
        assert_eq!(kona[0].item.name, "Kailua-Kona");

        let barbados = index.search("Barbados", 1);
        assert_eq!(barbados[0].item.name, "Bridgetown");
    }

    #[test]
    fn test_search_typo_and_noise() {
        let index = index();
        assert_eq!(index.search("Cozuml", 1)[0].item.name, "Cozumel");
        assert_eq!(index.search("Port of Seattle", 1)[0].item.name, "Seattle");
        assert_eq!(index.search("History of the Port of Tianjin", 1)[0].item.name, "Tianjin");
    }

    #[test]
    fn test_search_respects_floor_and_limit() {
        let index = index();
        let results = index.search("Reykjavik", 10);
        assert!(results.iter().all(|m| m.score >= DEFAULT_MIN_SCORE));
        assert!(results.iter().all(|m| m.item.name != "Bridgetown"));

        assert!(index.search("Juneau", 0).is_empty());
        assert!(index.search("   ", 5).is_empty());
        assert!(index.search("New", 1).len() <= 1);
    }

    #[test]
    fn test_search_tie_prefers_shorter_name() {
        // "new" is a prefix of both, scoring 0.95 each
        let results = index().search("New", 2);
        assert_eq!(results[0].item.name, "New York");
        assert_eq!(results[1].item.name, "New Orleans");
    }

    #[test]
    fn test_search_tie_prefers_curated() {
        let curated = r#"[{"name":"Port Royal","lat":17.93,"lng":-76.84}]"#;
        let master = r#"[{"name":"Port Royale","lat":32.37,"lng":-80.69}]"#;
        let index = DatasetIndex::from_json(curated, master).unwrap().with_min_score(0.0);

        let results = index.search("Port Roy", 2);
        assert_eq!(results[0].score, results[1].score);
        assert_eq!(results[0].item.source, PortSource::Curated);
    }

    #[test]
    fn test_invalid_elements_skipped() {
        let curated = r#"[
            {"name":"Hilo","lat":19.73,"lng":-155.09},
            {"name":"","lat":1.0,"lng":1.0},
            {"name":"Nowhere","lat":123.0,"lng":1.0},
            {"lat":1.0}
        ]"#;
        let index = DatasetIndex::from_json(curated, "[]").unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.iter().next().map(|e| e.source), Some(PortSource::Curated));
    }

    #[test]
    fn test_non_array_is_error() {
        let err = DatasetIndex::from_json(r#"{"ports":[]}"#, "[]").unwrap_err();
        assert!(matches!(err, PortsError::Dataset(_)));
        assert!(matches!(DatasetIndex::from_json("not json", "[]"), Err(PortsError::Json(_))));
    }

    #[test]
    fn test_with_master_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("master.json");
        std::fs::write(&path, r#"[{"name":"Qaqortoq","lat":60.7184,"lng":-46.0356,"locode":"GLJJU"}]"#)
            .unwrap();

        let index = DatasetIndex::with_master_file(&path).unwrap();
        let hit = &index.search("Qaqortoq", 1)[0];
        assert_eq!(hit.item.source, PortSource::Master);
        assert_eq!(hit.item.locode.as_deref(), Some("GLJJU"));

        assert!(DatasetIndex::with_master_file(dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_nearest() {
        let near_juneau = Coordinate::new(58.30, -134.42);
        let nearest = index().nearest(&near_juneau, 2);
        assert_eq!(nearest.len(), 2);
        assert_eq!(nearest[0].0.name, "Juneau");
        assert!(nearest[0].1 < 5.0);
        assert!(nearest[0].1 <= nearest[1].1);
    }
}
