//! Cache Statistics Module
//!
//! Tracks cache hits, misses and evictions.

use serde::Serialize;

// == Cache Stats ==
/// Read-only snapshot of cache health.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Current number of entries held in memory
    pub memory_items: usize,
    /// Capacity bound of the store
    pub max_memory_items: usize,
    /// Number of successful retrievals
    pub hit_count: u64,
    /// Number of failed retrievals (absent or expired)
    pub miss_count: u64,
    /// Number of entries evicted by the LRU policy
    pub evictions: u64,
}

impl CacheStats {
    /// Creates a snapshot with all counters at zero.
    pub fn new(max_memory_items: usize) -> Self {
        Self {
            max_memory_items,
            ..Self::default()
        }
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hit_count += 1;
    }

    pub fn record_miss(&mut self) {
        self.miss_count += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    /// Zeroes the counters, keeping the capacity bound.
    pub fn reset(&mut self) {
        *self = Self::new(self.max_memory_items);
    }
}
