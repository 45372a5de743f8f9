//! Durable key/value slots for the store snapshot.
//!
//! A storage holds whole documents under a fixed key, read once at startup and
//! rewritten on every mutation.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::error::{TodoError, TodoResult};

pub trait SnapshotStorage: Send + Sync {
    /// Read the document stored under `key`, if any
    fn load(&self, key: &str) -> TodoResult<Option<String>>;

    /// Replace the document stored under `key`
    fn save(&self, key: &str, contents: &str) -> TodoResult<()>;
}

/// One JSON file per key inside a data directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl SnapshotStorage for FileStorage {
    fn load(&self, key: &str) -> TodoResult<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TodoError::Storage(format!(
                "failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn save(&self, key: &str, contents: &str) -> TodoResult<()> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            TodoError::Storage(format!("failed to create {}: {}", self.dir.display(), e))
        })?;

        // Write then rename so a crash never leaves a half-written snapshot
        let path = self.path_for(key);
        let tmp = self.dir.join(format!(".{}.json.tmp", key));
        fs::write(&tmp, contents)
            .map_err(|e| TodoError::Storage(format!("failed to write {}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &path).map_err(|e| {
            TodoError::Storage(format!("failed to replace {}: {}", path.display(), e))
        })?;

        tracing::trace!(path = %path.display(), bytes = contents.len(), "Snapshot saved");
        Ok(())
    }
}

/// Process-local storage, shared between clones.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStorage for MemoryStorage {
    fn load(&self, key: &str) -> TodoResult<Option<String>> {
        let slots = self
            .slots
            .lock()
            .map_err(|_| TodoError::Storage("memory storage poisoned".to_string()))?;
        Ok(slots.get(key).cloned())
    }

    fn save(&self, key: &str, contents: &str) -> TodoResult<()> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| TodoError::Storage("memory storage poisoned".to_string()))?;
        slots.insert(key.to_string(), contents.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_shared_between_clones() {
        let storage = MemoryStorage::new();
        let other = storage.clone();

        assert_eq!(storage.load("k").unwrap(), None);
        storage.save("k", "v1").unwrap();
        assert_eq!(other.load("k").unwrap().as_deref(), Some("v1"));
    }

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested"));

        assert_eq!(storage.load("todo-storage").unwrap(), None);
        storage.save("todo-storage", "{\"a\":1}").unwrap();
        storage.save("todo-storage", "{\"a\":2}").unwrap();

        assert_eq!(
            storage.load("todo-storage").unwrap().as_deref(),
            Some("{\"a\":2}")
        );
        assert!(storage.path_for("todo-storage").exists());
    }

    #[test]
    fn test_file_storage_surfaces_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "x").unwrap();

        let storage = FileStorage::new(&blocker);
        let err = storage.save("todo-storage", "{}").unwrap_err();
        assert!(matches!(err, TodoError::Storage(_)));
    }
}
