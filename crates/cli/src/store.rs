//! File-backed key-value store for the engine caches.
//!
//! One JSON object per file, loaded on open and rewritten whole on every
//! write. A missing, unreadable or malformed file opens as an empty store.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use filingdesk_recon::{KvStore, StoreError};

pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                log::warn!("cache file {} is corrupt, starting empty: {e}", path.display());
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                log::warn!("cannot read cache file {}: {e}", path.display());
                BTreeMap::new()
            }
        };
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Write `entries` to disk. The in-memory map is only replaced by the
    /// caller once this succeeds.
    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Write(format!("{}: {e}", parent.display())))?;
        }
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| StoreError::Write(e.to_string()))?;
        std::fs::write(&self.path, json)
            .map_err(|e| StoreError::Write(format!("{}: {e}", self.path.display())))
    }
}

impl KvStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        let mut next = self.entries.clone();
        next.insert(key.to_string(), value);
        self.flush(&next)?;
        self.entries = next;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if !self.entries.contains_key(key) {
            return Ok(());
        }
        let mut next = self.entries.clone();
        next.remove(key);
        self.flush(&next)?;
        self.entries = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache/feed.json");

        let mut store = JsonFileStore::open(&path);
        store.set("feed:ACME", "{}".into()).unwrap();
        store.set("feed:OTHER", "[]".into()).unwrap();
        store.remove("feed:OTHER").unwrap();

        let reopened = JsonFileStore::open(&path);
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.get("feed:ACME").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_corrupt_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed.json");
        std::fs::write(&path, "not json").unwrap();

        let mut store = JsonFileStore::open(&path);
        assert_eq!(store.len(), 0);
        // The next write replaces the garbage.
        store.set("k", "v".into()).unwrap();
        assert_eq!(JsonFileStore::open(&path).len(), 1);
    }

    #[test]
    fn test_unwritable_path_is_a_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();

        // Parent "directory" is a regular file.
        let mut store = JsonFileStore::open(blocker.join("feed.json"));
        assert!(matches!(store.set("k", "v".into()), Err(StoreError::Write(_))));
        // Nothing reached disk, so nothing is served.
        assert!(store.get("k").unwrap().is_none());
        assert_eq!(store.len(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_remove_keeps_entry() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed.json");
        let mut store = JsonFileStore::open(&path);
        store.set("k", "v".into()).unwrap();

        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o444)).unwrap();
        if std::fs::OpenOptions::new().write(true).open(&path).is_ok() {
            // Running as root: permissions are not enforced.
            return;
        }

        assert!(store.remove("k").is_err());
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }
}
