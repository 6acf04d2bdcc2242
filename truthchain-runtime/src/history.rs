//! Local verification history
//!
//! A JSON array of [`StoredVerification`] entries, newest first. An entry
//! for content already in the history replaces the old one in place.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use truthchain_core::{calculate_stats, StoredVerification, VerificationStats};

/// Entries kept before the oldest is dropped
pub const MAX_HISTORY_ENTRIES: usize = 10;

const HISTORY_FILE_NAME: &str = ".truthchain_history.json";

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// History persisted to a JSON file
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
    max_entries: usize,
}

impl HistoryStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            max_entries: MAX_HISTORY_ENTRIES,
        }
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }

    /// `~/.truthchain_history.json`, or the working directory without a home
    pub fn default_path() -> PathBuf {
        match env::var_os("HOME") {
            Some(home) => PathBuf::from(home).join(HISTORY_FILE_NAME),
            None => PathBuf::from(HISTORY_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries, newest first; unreadable history counts as empty
    pub fn list(&self) -> Vec<StoredVerification> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!("Failed to read history {}: {}", self.path.display(), e);
                return Vec::new();
            }
        };

        serde_json::from_str(&data).unwrap_or_else(|e| {
            warn!("Ignoring corrupt history {}: {}", self.path.display(), e);
            Vec::new()
        })
    }

    pub fn get(&self, id: &str) -> Option<StoredVerification> {
        self.list().into_iter().find(|entry| entry.id == id)
    }

    /// Insert or replace an entry
    pub fn save(&self, entry: StoredVerification) -> Result<(), HistoryError> {
        let mut entries = self.list();

        match entries.iter().position(|e| e.id == entry.id) {
            Some(index) => entries[index] = entry,
            None => {
                entries.insert(0, entry);
                entries.truncate(self.max_entries);
            }
        }

        self.write(&entries)
    }

    pub fn clear(&self) -> Result<(), HistoryError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Cleared history {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn stats(&self) -> VerificationStats {
        calculate_stats(&self.list())
    }

    fn write(&self, entries: &[StoredVerification]) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use truthchain_core::{Content, VerificationResult};

    fn entry(text: &str, score: u8, timestamp: i64) -> StoredVerification {
        let result = VerificationResult::from_score(score, "test", String::new());
        StoredVerification::new(&Content::Text(text.to_string()), &result, timestamp)
    }

    fn store() -> (tempfile::TempDir, HistoryStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"));
        (dir, store)
    }

    #[test]
    fn test_missing_file_is_empty() {
        let (_dir, store) = store();
        assert!(store.list().is_empty());
        assert_eq!(store.stats(), VerificationStats::default());
    }

    #[test]
    fn test_corrupt_file_is_empty() {
        let (_dir, store) = store();
        fs::write(store.path(), "{not json").unwrap();
        assert!(store.list().is_empty());

        // Saving over a corrupt file starts a fresh history
        store.save(entry("a", 80, 1)).unwrap();
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn test_newest_first_and_capped() {
        let (_dir, store) = store();
        for i in 0..12 {
            store.save(entry(&format!("claim {}", i), 60, i)).unwrap();
        }

        let entries = store.list();
        assert_eq!(entries.len(), MAX_HISTORY_ENTRIES);
        assert_eq!(entries[0].content, "claim 11");
        assert_eq!(entries[9].content, "claim 2");
    }

    #[test]
    fn test_same_content_replaced_in_place() {
        let (_dir, store) = store();
        store.save(entry("first", 40, 1)).unwrap();
        store.save(entry("second", 50, 2)).unwrap();
        store.save(entry("first", 90, 3)).unwrap();

        let entries = store.list();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].content, "second");
        assert_eq!(entries[1].content, "first");
        assert_eq!(entries[1].confidence_score, 90);
        assert_eq!(entries[1].timestamp, 3);
    }

    #[test]
    fn test_get_clear_and_stats() {
        let (_dir, store) = store();
        let saved = entry("claim", 75, 1);
        store.save(saved.clone()).unwrap();
        store.save(entry("other", 30, 2)).unwrap();

        assert_eq!(store.get(&saved.id), Some(saved));

        let stats = store.stats();
        assert_eq!(stats.total_verifications, 2);
        assert_eq!(stats.verified_content, 1);
        assert_eq!(stats.avg_confidence_score, 52.5);

        store.clear().unwrap();
        assert!(store.list().is_empty());
        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_file_is_camel_case_json() {
        let (_dir, store) = store();
        store.save(entry("claim", 75, 1)).unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw[0]["contentType"], "text");
        assert_eq!(raw[0]["isVerified"], true);
    }
}
