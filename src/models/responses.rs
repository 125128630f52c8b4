//! Response DTOs for the diagnostics API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::preload::TaskStatus;
use crate::query::{QueryCacheStats, QueryStatEntry, QuerySummary};

/// Response body for GET /cache/stats
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatsResponse {
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for CacheStatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            stats,
        }
    }
}

/// One entry of GET /preload/status
#[derive(Debug, Clone, Serialize)]
pub struct TaskStatusEntry {
    pub id: String,
    pub status: TaskStatus,
}

/// Response body for GET /query/stats
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryStatsResponse {
    /// False when no optimizer is attached
    pub enabled: bool,
    pub entries: Vec<QueryStatEntry>,
    pub summary: Vec<QuerySummary>,
    pub slow_queries: Vec<QueryStatEntry>,
    pub cache: Option<QueryCacheStats>,
}

impl QueryStatsResponse {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            entries: Vec::new(),
            summary: Vec::new(),
            slow_queries: Vec::new(),
            cache: None,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Generic acknowledgement body
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_stats_response_flattens() {
        let mut stats = CacheStats::new(10);
        stats.record_hit();
        stats.record_miss();

        let json = serde_json::to_value(CacheStatsResponse::from(stats)).unwrap();

        assert_eq!(json["maxMemoryItems"], 10);
        assert_eq!(json["hitCount"], 1);
        assert_eq!(json["hitRate"], 0.5);
    }

    #[test]
    fn test_task_status_serialize() {
        let entry = TaskStatusEntry {
            id: "checkout".to_string(),
            status: TaskStatus::Failed("offline".to_string()),
        };
        let json = serde_json::to_value(entry).unwrap();
        assert_eq!(json["status"]["state"], "failed");
        assert_eq!(json["status"]["error"], "offline");
    }

    #[test]
    fn test_health_response() {
        let resp = HealthResponse::healthy();
        assert_eq!(resp.status, "healthy");
        assert!(!resp.timestamp.is_empty());
    }
}
