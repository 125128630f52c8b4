//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with LRU tracking, lazy TTL
//! expiration and an optional best-effort persistent mirror.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{current_timestamp_ms, CacheEntry, CacheStats, LruTracker, StorageMirror};

// == Cache Store ==
/// Memory cache with LRU eviction and per-entry TTL.
///
/// Expiry is checked lazily when a key is read; nothing runs in the
/// background unless a sweep task is spawned explicitly.
pub struct CacheStore<V = Value> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// LRU access tracker
    lru: LruTracker,
    /// Hit, miss and eviction counters
    stats: CacheStats,
    /// Maximum number of entries held in memory
    max_items: usize,
    /// TTL applied by memoized functions that do not choose their own
    default_ttl_ms: Option<u64>,
    /// Optional durable copy of every entry
    mirror: Option<Box<dyn StorageMirror<V>>>,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates a memory-only store holding at most `max_items` entries.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(max_items: usize) -> Self {
        let max_items = max_items.max(1);
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(max_items),
            max_items,
            default_ttl_ms: None,
            mirror: None,
        }
    }

    /// Sets the TTL used by [`with_cache`](crate::cache::with_cache) wrappers.
    pub fn with_default_ttl(mut self, ttl_ms: u64) -> Self {
        self.default_ttl_ms = Some(ttl_ms);
        self
    }

    /// Attaches a persistent mirror.
    pub fn with_mirror(mut self, mirror: impl StorageMirror<V> + 'static) -> Self {
        self.mirror = Some(Box::new(mirror));
        self
    }

    pub fn default_ttl_ms(&self) -> Option<u64> {
        self.default_ttl_ms
    }

    // == Set ==
    /// Stores a value, overwriting any previous entry under `key`.
    ///
    /// A new key arriving at capacity evicts the least recently accessed
    /// entry first. `ttl_ms = None` means the entry never expires. Mirror
    /// failures are logged and never affect the memory insert.
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl_ms: Option<u64>) {
        let key = key.into();
        let entry = CacheEntry::new(value, ttl_ms);

        if let Some(mirror) = &self.mirror {
            if let Err(e) = mirror.persist(&key, &entry) {
                warn!(key = %key, error = %e, "Cache mirror write failed, keeping memory copy only");
            }
        }

        self.insert_entry(key, entry);
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns None when the key is absent or expired. Expired entries are
    /// removed and counted as misses. On a memory miss the mirror is
    /// consulted and a live entry found there is brought back into memory.
    pub fn get(&mut self, key: &str) -> Option<V> {
        if let Some(entry) = self.entries.get(key) {
            if entry.is_expired() {
                debug!(key = %key, "Cache entry expired");
                self.remove_entry(key);
                self.stats.record_miss();
                return None;
            }

            let value = entry.value.clone();
            self.lru.touch(key);
            self.stats.record_hit();
            return Some(value);
        }

        match self.restore_from_mirror(key) {
            Some(entry) => {
                let value = entry.value.clone();
                self.insert_entry(key.to_string(), entry);
                self.stats.record_hit();
                Some(value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Delete ==
    /// Removes an entry by key, returning whether it was present in memory.
    pub fn delete(&mut self, key: &str) -> bool {
        let existed = self.entries.contains_key(key);
        self.remove_entry(key);
        existed
    }

    // == Clear ==
    /// Removes all entries and resets the counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.stats.reset();

        if let Some(mirror) = &self.mirror {
            if let Err(e) = mirror.clear() {
                warn!(error = %e, "Cache mirror clear failed");
            }
        }
    }

    // == Stats ==
    /// Returns a snapshot of the cache statistics.
    ///
    /// `memory_items` counts live entries only; expired entries still waiting
    /// for a read or a sweep are left out.
    pub fn stats(&self) -> CacheStats {
        let now = current_timestamp_ms();
        CacheStats {
            memory_items: self
                .entries
                .values()
                .filter(|entry| !entry.is_expired_at(now))
                .count(),
            ..self.stats.clone()
        }
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from memory.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.remove_entry(key);
        }

        expired_keys.len()
    }

    /// Returns the number of entries in memory, expired-but-unread included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entry is held in memory.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the maximum number of entries held in memory.
    pub fn capacity(&self) -> usize {
        self.max_items
    }

    // == Internals ==
    fn insert_entry(&mut self, key: String, entry: CacheEntry<V>) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_items {
            if let Some(evicted) = self.lru.evict_oldest() {
                debug!(key = %evicted, "Evicting least recently used cache entry");
                self.entries.remove(&evicted);
                self.stats.record_eviction();
            }
        }

        self.lru.touch(&key);
        self.entries.insert(key, entry);
    }

    fn remove_entry(&mut self, key: &str) {
        self.entries.remove(key);
        self.lru.remove(key);

        if let Some(mirror) = &self.mirror {
            if let Err(e) = mirror.remove(key) {
                warn!(key = %key, error = %e, "Cache mirror delete failed");
            }
        }
    }

    fn restore_from_mirror(&self, key: &str) -> Option<CacheEntry<V>> {
        let mirror = self.mirror.as_ref()?;
        match mirror.restore(key) {
            Ok(Some(entry)) if !entry.is_expired() => {
                debug!(key = %key, "Restored cache entry from mirror");
                Some(entry)
            }
            Ok(Some(_)) => {
                if let Err(e) = mirror.remove(key) {
                    warn!(key = %key, error = %e, "Cache mirror delete failed");
                }
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache mirror read failed");
                None
            }
        }
    }
}

impl<V> fmt::Debug for CacheStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("entries", &self.entries.len())
            .field("max_items", &self.max_items)
            .field("default_ttl_ms", &self.default_ttl_ms)
            .field("mirrored", &self.mirror.is_some())
            .finish()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::JsonFileMirror;
    use crate::error::{PerfError, Result};
    use serde_json::json;
    use std::thread::sleep;
    use std::time::Duration;

    /// Mirror whose every operation fails.
    struct BrokenMirror;

    impl StorageMirror<Value> for BrokenMirror {
        fn persist(&self, _key: &str, _entry: &CacheEntry<Value>) -> Result<()> {
            Err(PerfError::Storage("quota exceeded".to_string()))
        }
        fn restore(&self, _key: &str) -> Result<Option<CacheEntry<Value>>> {
            Err(PerfError::Storage("unavailable".to_string()))
        }
        fn remove(&self, _key: &str) -> Result<()> {
            Err(PerfError::Storage("unavailable".to_string()))
        }
        fn clear(&self) -> Result<()> {
            Err(PerfError::Storage("unavailable".to_string()))
        }
    }

    #[test]
    fn test_store_new() {
        let store: CacheStore = CacheStore::new(100);
        assert!(store.is_empty());
        assert_eq!(store.capacity(), 100);
        assert_eq!(CacheStore::<Value>::new(0).capacity(), 1);
    }

    #[test]
    fn test_store_set_and_get() {
        let mut store = CacheStore::new(100);

        store.set("key1", json!("value1"), None);

        assert_eq!(store.get("key1"), Some(json!("value1")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let mut store: CacheStore = CacheStore::new(100);
        assert_eq!(store.get("nonexistent"), None);
        assert_eq!(store.stats().miss_count, 1);
    }

    #[test]
    fn test_store_overwrite() {
        let mut store = CacheStore::new(100);

        store.set("key1", json!(1), None);
        store.set("key1", json!(2), None);

        assert_eq!(store.get("key1"), Some(json!(2)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_ttl_expiration() {
        let mut store = CacheStore::new(100);

        store.set("key1", json!("value1"), Some(50));
        assert!(store.get("key1").is_some());

        sleep(Duration::from_millis(80));

        assert_eq!(store.get("key1"), None);
        assert!(store.is_empty(), "expired entry is removed on read");
        let stats = store.stats();
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.miss_count, 1);
    }

    #[test]
    fn test_store_lru_eviction() {
        let mut store = CacheStore::new(3);

        store.set("key1", json!(1), None);
        store.set("key2", json!(2), None);
        store.set("key3", json!(3), None);
        store.set("key4", json!(4), None);

        assert_eq!(store.len(), 3);
        assert_eq!(store.get("key1"), None);
        assert!(store.get("key2").is_some());
        assert!(store.get("key3").is_some());
        assert!(store.get("key4").is_some());
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn test_store_lru_touch_on_get() {
        let mut store = CacheStore::new(3);

        store.set("key1", json!(1), None);
        store.set("key2", json!(2), None);
        store.set("key3", json!(3), None);

        store.get("key1");
        store.set("key4", json!(4), None);

        assert!(store.get("key1").is_some());
        assert_eq!(store.get("key2"), None);
    }

    #[test]
    fn test_store_overwrite_at_capacity_does_not_evict() {
        let mut store = CacheStore::new(2);

        store.set("a", json!(1), None);
        store.set("b", json!(2), None);
        store.set("a", json!(3), None);

        assert_eq!(store.len(), 2);
        assert_eq!(store.stats().evictions, 0);
        assert_eq!(store.get("b"), Some(json!(2)));
    }

    #[test]
    fn test_store_clear_resets_counters() {
        let mut store = CacheStore::new(10);
        store.set("a", json!(1), None);
        store.get("a");
        store.get("b");

        store.clear();

        let stats = store.stats();
        assert_eq!(stats.memory_items, 0);
        assert_eq!(stats.hit_count, 0);
        assert_eq!(stats.miss_count, 0);
        assert_eq!(stats.max_memory_items, 10);
    }

    #[test]
    fn test_stats_exclude_unread_expired_entries() {
        let mut store = CacheStore::new(10);
        store.set("short", json!(1), Some(20));
        store.set("live", json!(2), None);

        sleep(Duration::from_millis(60));

        assert_eq!(store.stats().memory_items, 1);
        assert_eq!(store.len(), 2, "expiry stays lazy until a read or sweep");
        assert_eq!(store.stats().miss_count, 0);
    }

    #[test]
    fn test_store_delete() {
        let mut store = CacheStore::new(10);
        store.set("a", json!(1), None);

        assert!(store.delete("a"));
        assert!(!store.delete("a"));
        assert_eq!(store.get("a"), None);
    }

    #[test]
    fn test_store_cleanup_expired() {
        let mut store = CacheStore::new(100);

        store.set("key1", json!(1), Some(50));
        store.set("key2", json!(2), Some(10_000));

        sleep(Duration::from_millis(80));

        assert_eq!(store.cleanup_expired(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.get("key2").is_some());
    }

    #[test]
    fn test_broken_mirror_never_fails_operations() {
        let mut store = CacheStore::new(10).with_mirror(BrokenMirror);

        store.set("a", json!({"ok": true}), Some(1_000));
        assert_eq!(store.get("a"), Some(json!({"ok": true})));
        assert_eq!(store.get("missing"), None);
        assert!(store.delete("a"));
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_mirror_rehydrates_after_memory_loss() {
        let dir = tempfile::tempdir().unwrap();

        let mut first = CacheStore::new(10).with_mirror(JsonFileMirror::new(dir.path()).unwrap());
        first.set("session", json!({"user": "ana"}), Some(60_000));

        let mut second: CacheStore =
            CacheStore::new(10).with_mirror(JsonFileMirror::new(dir.path()).unwrap());
        assert_eq!(second.get("session"), Some(json!({"user": "ana"})));
        assert_eq!(second.len(), 1);
        assert_eq!(second.stats().hit_count, 1);
    }

    #[test]
    fn test_mirror_skips_expired_copies() {
        let dir = tempfile::tempdir().unwrap();
        let mut first = CacheStore::new(10).with_mirror(JsonFileMirror::new(dir.path()).unwrap());
        first.set("stale", json!(1), Some(20));

        sleep(Duration::from_millis(50));

        let mut second: CacheStore =
            CacheStore::new(10).with_mirror(JsonFileMirror::new(dir.path()).unwrap());
        assert_eq!(second.get("stale"), None);
        assert_eq!(second.stats().miss_count, 1);
    }
}
