//! Key-value persistence port and its backends.
//!
//! Each dataset (a department's grades, the custom structure and grades, the
//! simple calculator's semesters) is serialized to one JSON document and
//! written as a single string value under its own key.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::PersistenceError;

/// Key of the custom-curriculum dataset.
pub const CUSTOM_KEY: &str = "custom-cgpa-data";

/// Key of the simple calculator dataset.
pub const SIMPLE_KEY: &str = "simple-cgpa-data";

/// Key of a built-in department's dataset.
pub fn department_key(department_code: &str) -> String {
    format!("{}-cgpa-data", department_code.trim().to_lowercase())
}

/// A durable string-keyed store.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;
    fn remove(&mut self, key: &str) -> Result<(), PersistenceError>;
    /// Every key currently held, sorted.
    fn keys(&self) -> Result<Vec<String>, PersistenceError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &mut T {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        (**self).remove(key)
    }

    fn keys(&self) -> Result<Vec<String>, PersistenceError> {
        (**self).keys()
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        (**self).remove(key)
    }

    fn keys(&self) -> Result<Vec<String>, PersistenceError> {
        (**self).keys()
    }
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

/// In-memory store with an optional byte quota, mirroring browser storage
/// limits.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that refuses writes once keys plus values exceed `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            quota: Some(bytes),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn used_without(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        if let Some(quota) = self.quota {
            let available = quota.saturating_sub(self.used_without(key));
            let needed = key.len() + value.len();
            if needed > available {
                return Err(PersistenceError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    available,
                });
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, PersistenceError> {
        Ok(self.entries.keys().cloned().collect())
    }
}

// ---------------------------------------------------------------------------
// File backend
// ---------------------------------------------------------------------------

/// Directory-backed store: one `<key>.json` file per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding `key`. Keys are limited to ASCII letters, digits, `-`
    /// and `_` so they cannot escape the directory.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, PersistenceError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(PersistenceError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

fn io_error(key: &str, source: io::Error) -> PersistenceError {
    PersistenceError::Io {
        key: key.to_string(),
        source,
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(key, e)),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir).map_err(|e| io_error(key, e))?;
        // Write the whole value next to the target, then swap it in.
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        fs::write(&tmp, value).map_err(|e| io_error(key, e))?;
        fs::rename(&tmp, &path).map_err(|e| io_error(key, e))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(key, e)),
        }
    }

    fn keys(&self) -> Result<Vec<String>, PersistenceError> {
        let dir_key = self.dir.display().to_string();
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&dir_key, e)),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| io_error(&dir_key, e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if self.path_for(key).is_ok() {
                keys.push(key.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

// ---------------------------------------------------------------------------
// Write-through helpers
// ---------------------------------------------------------------------------

/// Outcome of a store mutation.
///
/// A failed write never undoes the mutation: in-memory state stays the
/// source of truth and the caller decides how to warn the user.
#[derive(Debug)]
pub enum SaveStatus {
    /// State changed and was written.
    Saved,
    /// Nothing to do; state and storage untouched.
    Unchanged,
    /// State changed but the write failed.
    NotPersisted(PersistenceError),
}

impl SaveStatus {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveStatus::Saved)
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, SaveStatus::Unchanged)
    }

    /// The persistence failure, if the change may not have been saved.
    pub fn warning(&self) -> Option<&PersistenceError> {
        match self {
            SaveStatus::NotPersisted(err) => Some(err),
            _ => None,
        }
    }
}

/// Load a dataset, falling back to its default when the record is missing
/// or unreadable.
pub(crate) fn load_dataset<T, P>(port: &P, key: &str) -> T
where
    T: DeserializeOwned + Default,
    P: KeyValueStore + ?Sized,
{
    match port.get(key) {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("ignoring unreadable record at {key}: {e}");
                T::default()
            }
        },
        Ok(None) => T::default(),
        Err(e) => {
            tracing::warn!("could not read {key}: {e}");
            T::default()
        }
    }
}

/// Serialize and write a dataset as a single string value.
pub(crate) fn save_dataset<T, P>(port: &mut P, key: &str, value: &T) -> SaveStatus
where
    T: Serialize,
    P: KeyValueStore + ?Sized,
{
    let encoded = match serde_json::to_string(value) {
        Ok(encoded) => encoded,
        Err(e) => {
            tracing::warn!("could not encode {key}: {e}");
            return SaveStatus::NotPersisted(PersistenceError::Encode(e));
        }
    };
    match port.set(key, &encoded) {
        Ok(()) => {
            tracing::debug!(key, bytes = encoded.len(), "saved");
            SaveStatus::Saved
        }
        Err(e) => {
            tracing::warn!("save may not have persisted: {e}");
            SaveStatus::NotPersisted(e)
        }
    }
}

/// Remove every record the port holds. Returns the keys removed.
pub fn clear_all<P: KeyValueStore + ?Sized>(port: &mut P) -> Result<Vec<String>, PersistenceError> {
    let keys = port.keys()?;
    for key in &keys {
        port.remove(key)?;
    }
    tracing::debug!(count = keys.len(), "cleared all records");
    Ok(keys)
}

/// Remove a dataset's record.
pub(crate) fn purge<P: KeyValueStore + ?Sized>(port: &mut P, key: &str) -> SaveStatus {
    match port.remove(key) {
        Ok(()) => {
            tracing::debug!(key, "purged");
            SaveStatus::Saved
        }
        Err(e) => {
            tracing::warn!("could not remove {key}: {e}");
            SaveStatus::NotPersisted(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn department_keys() {
        assert_eq!(department_key("CSE"), "cse-cgpa-data");
        assert_eq!(department_key(" Mgt "), "mgt-cgpa-data");
    }

    #[test]
    fn memory_store_quota() {
        let mut store = MemoryStore::with_quota(16);
        store.set("k", "0123456789").unwrap();
        // Overwriting the same key only counts the new value.
        store.set("k", "012345678901234").unwrap();
        let err = store.set("other", "x").unwrap_err();
        assert!(matches!(err, PersistenceError::QuotaExceeded { .. }));
        assert_eq!(store.get("k").unwrap().as_deref(), Some("012345678901234"));
        store.remove("k").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("data"));
        assert_eq!(store.get("custom-cgpa-data").unwrap(), None);

        store.set("custom-cgpa-data", r#"{"grades":{}}"#).unwrap();
        assert_eq!(
            store.get("custom-cgpa-data").unwrap().as_deref(),
            Some(r#"{"grades":{}}"#)
        );
        assert!(dir.path().join("data/custom-cgpa-data.json").exists());

        store.remove("custom-cgpa-data").unwrap();
        store.remove("custom-cgpa-data").unwrap();
        assert_eq!(store.get("custom-cgpa-data").unwrap(), None);
    }

    #[test]
    fn clear_all_empties_every_backend() {
        let mut memory = MemoryStore::new();
        memory.set(SIMPLE_KEY, "{}").unwrap();
        memory.set(CUSTOM_KEY, "{}").unwrap();
        assert_eq!(clear_all(&mut memory).unwrap(), [CUSTOM_KEY, SIMPLE_KEY]);
        assert!(memory.is_empty());

        let dir = tempfile::tempdir().unwrap();
        let mut files = FileStore::new(dir.path().join("data"));
        assert!(files.keys().unwrap().is_empty());
        files.set(&department_key("CSE"), "{}").unwrap();
        files.set(SIMPLE_KEY, "{}").unwrap();
        fs::write(dir.path().join("data/notes.txt"), "keep").unwrap();

        assert_eq!(files.keys().unwrap(), ["cse-cgpa-data", SIMPLE_KEY]);
        assert_eq!(clear_all(&mut files).unwrap().len(), 2);
        assert!(files.keys().unwrap().is_empty());
        assert!(dir.path().join("data/notes.txt").exists());
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path());
        assert!(matches!(
            store.set("../escape", "{}"),
            Err(PersistenceError::InvalidKey(_))
        ));
        assert!(store.get("").is_err());
    }

    #[test]
    fn load_falls_back_on_garbage() {
        let mut store = MemoryStore::new();
        store.set("k", "not json").unwrap();
        let loaded: BTreeMap<String, f64> = load_dataset(&store, "k");
        assert!(loaded.is_empty());
    }

    #[test]
    fn save_reports_quota_failure() {
        let mut store = MemoryStore::with_quota(4);
        let mut value = BTreeMap::new();
        value.insert("a".to_string(), 1.0);
        let status = save_dataset(&mut store, "key", &value);
        assert!(status.warning().is_some());
        assert!(!status.is_saved());
    }
}
