//! Persistent Mirror Module
//!
//! Best-effort durable copy of cache entries. The store calls into the mirror
//! on every write and on memory misses, and swallows whatever it returns as
//! an error.

use std::fs;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::cache::CacheEntry;
use crate::error::{PerfError, Result};

// == Storage Mirror ==
/// Durable backing for a [`CacheStore`](crate::cache::CacheStore).
pub trait StorageMirror<V>: Send + Sync {
    /// Writes an entry under `key`, replacing any previous copy.
    fn persist(&self, key: &str, entry: &CacheEntry<V>) -> Result<()>;

    /// Reads the entry stored under `key`, if any.
    fn restore(&self, key: &str) -> Result<Option<CacheEntry<V>>>;

    /// Deletes the copy stored under `key`. Missing keys are not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Deletes every stored copy.
    fn clear(&self) -> Result<()>;
}

// == JSON File Mirror ==
/// Stores one JSON document per key inside a directory.
///
/// File names are the hex encoding of the key, so any caller-chosen key maps
/// to a valid file name.
#[derive(Debug)]
pub struct JsonFileMirror<V> {
    dir: PathBuf,
    _value: PhantomData<fn() -> V>,
}

impl<V> JsonFileMirror<V> {
    /// Creates a mirror rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| storage_error(&dir, e))?;
        Ok(Self {
            dir,
            _value: PhantomData,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let encoded: String = key.bytes().map(|b| format!("{:02x}", b)).collect();
        self.dir.join(format!("{}.json", encoded))
    }
}

impl<V> StorageMirror<V> for JsonFileMirror<V>
where
    V: Serialize + DeserializeOwned,
{
    fn persist(&self, key: &str, entry: &CacheEntry<V>) -> Result<()> {
        let path = self.path_for(key);
        let bytes = serde_json::to_vec(entry)?;
        fs::write(&path, bytes).map_err(|e| storage_error(&path, e))
    }

    fn restore(&self, key: &str) -> Result<Option<CacheEntry<V>>> {
        let path = self.path_for(key);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error(&path, e)),
        }
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error(&path, e)),
        }
    }

    fn clear(&self) -> Result<()> {
        let entries = fs::read_dir(&self.dir).map_err(|e| storage_error(&self.dir, e))?;
        for entry in entries {
            let path = entry.map_err(|e| storage_error(&self.dir, e))?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                fs::remove_file(&path).map_err(|e| storage_error(&path, e))?;
            }
        }
        Ok(())
    }
}

fn storage_error(path: &Path, err: std::io::Error) -> PerfError {
    PerfError::Storage(format!("{}: {}", path.display(), err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_persist_and_restore() {
        let dir = tempfile::tempdir().unwrap();
        let mirror: JsonFileMirror<Value> = JsonFileMirror::new(dir.path()).unwrap();

        let entry = CacheEntry::new(json!({"event": 42}), Some(60_000));
        mirror.persist("events/42", &entry).unwrap();

        let restored = mirror.restore("events/42").unwrap().unwrap();
        assert_eq!(restored.value, json!({"event": 42}));
        assert_eq!(restored.expires_at, entry.expires_at);
    }

    #[test]
    fn test_restore_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let mirror: JsonFileMirror<Value> = JsonFileMirror::new(dir.path()).unwrap();
        assert!(mirror.restore("absent").unwrap().is_none());
        assert!(mirror.remove("absent").is_ok());
    }

    #[test]
    fn test_clear_removes_all_files() {
        let dir = tempfile::tempdir().unwrap();
        let mirror: JsonFileMirror<Value> = JsonFileMirror::new(dir.path()).unwrap();
        mirror.persist("a", &CacheEntry::new(json!(1), None)).unwrap();
        mirror.persist("b", &CacheEntry::new(json!(2), None)).unwrap();

        mirror.clear().unwrap();

        assert!(mirror.restore("a").unwrap().is_none());
        assert!(mirror.restore("b").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mirror: JsonFileMirror<Value> = JsonFileMirror::new(dir.path()).unwrap();
        fs::write(mirror.path_for("bad"), b"{not json").unwrap();

        assert!(matches!(
            mirror.restore("bad"),
            Err(PerfError::Serialization(_))
        ));
    }
}
