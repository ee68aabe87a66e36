//! Persistent list of past searches, most recent first.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub query: String,
    pub searched_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SearchHistory {
    path: PathBuf,
    max_entries: usize,
    entries: Vec<HistoryEntry>,
}

impl SearchHistory {
    /// An empty history that will be written to `path` on the next save.
    pub fn empty(path: impl Into<PathBuf>, max_entries: usize) -> Self {
        Self { path: path.into(), max_entries: max_entries.max(1), entries: Vec::new() }
    }

    /// Read the history file. A missing file is an empty history.
    pub fn load(path: impl Into<PathBuf>, max_entries: usize) -> Result<Self> {
        let mut history = Self::empty(path, max_entries);
        if !history.path.exists() {
            return Ok(history);
        }

        let contents = fs::read_to_string(&history.path)
            .with_context(|| format!("Failed to read history file: {}", history.path.display()))?;
        let mut entries: Vec<HistoryEntry> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse history file: {}", history.path.display()))?;

        entries.truncate(history.max_entries);
        debug!(count = entries.len(), "loaded search history");
        history.entries = entries;
        Ok(history)
    }

    /// Like [`SearchHistory::load`], but an unreadable file is logged and
    /// replaced by an empty history.
    pub fn load_or_empty(path: impl Into<PathBuf>, max_entries: usize) -> Self {
        let path = path.into();
        match Self::load(path.clone(), max_entries) {
            Ok(history) => history,
            Err(err) => {
                warn!("ignoring search history: {err:#}");
                Self::empty(path, max_entries)
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create history directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(&self.entries)
            .context("Failed to serialize search history")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write history file: {}", self.path.display()))?;
        Ok(())
    }

    /// Put `query` at the front, dropping any older copy and the overflow.
    pub fn record(&mut self, query: &str, at: DateTime<Utc>) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }
        self.entries.retain(|e| e.query != query);
        self.entries.insert(0, HistoryEntry { query: query.to_string(), searched_at: at });
        self.entries.truncate(self.max_entries);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn record_moves_repeat_to_front() {
        let mut h = SearchHistory::empty("unused.json", 10);
        h.record("Paris", t(0));
        h.record("Oslo", t(1));
        h.record("Paris", t(2));

        let queries: Vec<_> = h.entries().iter().map(|e| e.query.as_str()).collect();
        assert_eq!(queries, ["Paris", "Oslo"]);
        assert_eq!(h.entries()[0].searched_at, t(2));
    }

    #[test]
    fn record_truncates_to_max() {
        let mut h = SearchHistory::empty("unused.json", 3);
        for (i, city) in ["a1", "b2", "c3", "d4"].iter().enumerate() {
            h.record(city, t(i as i64));
        }
        assert_eq!(h.len(), 3);
        assert_eq!(h.entries()[0].query, "d4");
        assert_eq!(h.entries()[2].query, "b2");
    }

    #[test]
    fn blank_queries_are_ignored() {
        let mut h = SearchHistory::empty("unused.json", 3);
        h.record("   ", t(0));
        assert!(h.is_empty());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("history.json");

        let mut h = SearchHistory::empty(&path, 5);
        h.record("Lisbon", t(0));
        h.record("Porto", t(0) + Duration::minutes(5));
        h.save().unwrap();

        let loaded = SearchHistory::load(&path, 5).unwrap();
        assert_eq!(loaded.entries(), h.entries());
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let h = SearchHistory::load(dir.path().join("history.json"), 5).unwrap();
        assert!(h.is_empty());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "{not json").unwrap();

        let err = SearchHistory::load(&path, 5).unwrap_err();
        assert!(err.to_string().contains("Failed to parse history file"));
    }

    #[test]
    fn corrupt_file_falls_back_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "[[[").unwrap();

        let h = SearchHistory::load_or_empty(&path, 5);
        assert!(h.is_empty());
        assert_eq!(h.path(), path);
    }
}
