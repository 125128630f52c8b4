//! Query statistics types.

use serde::Serialize;
use serde_json::Value;

// == Query Stat Entry ==
/// One execution (or cache answer) of a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryStatEntry {
    /// Normalized query text
    pub query: String,
    pub params: Value,
    /// Wall-clock duration; zero for cache hits
    pub duration_ms: f64,
    /// Unix milliseconds
    pub timestamp: u64,
    pub cache_hit: bool,
}

// == Query Cache Stats ==
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryCacheStats {
    pub size: usize,
    pub max_size: usize,
    pub hit_rate: f64,
}

// == Query Summary ==
/// Aggregates over every log entry sharing a normalized query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySummary {
    pub query: String,
    pub count: usize,
    pub cache_hits: usize,
    pub avg_duration_ms: f64,
    pub max_duration_ms: f64,
}

impl QuerySummary {
    pub(crate) fn from_entries<'a>(
        query: String,
        entries: impl IntoIterator<Item = &'a QueryStatEntry>,
    ) -> Self {
        let mut summary = Self {
            query,
            count: 0,
            cache_hits: 0,
            avg_duration_ms: 0.0,
            max_duration_ms: 0.0,
        };
        let mut total = 0.0;
        for entry in entries {
            summary.count += 1;
            if entry.cache_hit {
                summary.cache_hits += 1;
            }
            total += entry.duration_ms;
            summary.max_duration_ms = summary.max_duration_ms.max(entry.duration_ms);
        }
        if summary.count > 0 {
            summary.avg_duration_ms = total / summary.count as f64;
        }
        summary
    }
}
