//! Cache Module
//!
//! Provides in-memory caching with lazy TTL expiration, LRU eviction, an
//! optional persistent mirror and async function memoization.

mod entry;
mod lru;
mod memoize;
mod mirror;
mod stats;
mod store;


// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use lru::LruTracker;
pub use memoize::{shared, with_cache, Memoized, SharedCache};
pub use mirror::{JsonFileMirror, StorageMirror};
pub use stats::CacheStats;
pub use store::CacheStore;
