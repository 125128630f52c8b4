//! Configuration Module
//!
//! Handles loading the performance layer configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Performance layer configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct PerfConfig {
    /// Capacity bound of the shared cache store
    pub cache_max_items: usize,
    /// Default TTL in milliseconds applied by memoized functions
    pub cache_default_ttl_ms: u64,
    /// Interval of the expired-entry sweep in milliseconds, 0 disables it
    pub cache_sweep_interval_ms: u64,
    /// Directory for the JSON file mirror, None keeps the cache memory-only
    pub cache_mirror_dir: Option<PathBuf>,
    /// Capacity of the query optimizer's result cache
    pub query_cache_max_size: usize,
    /// TTL in milliseconds of cached query results
    pub query_cache_ttl_ms: u64,
    /// Duration at which a query is logged as slow
    pub slow_query_threshold_ms: u64,
    /// Ceiling of the query statistics log
    pub query_log_max: usize,
    /// Ceiling of the metric log
    pub max_metrics: usize,
    /// Length of the behavior window kept by the smart preloader
    pub behavior_window: usize,
    /// Diagnostics HTTP server port
    pub server_port: u16,
}

impl PerfConfig {
    /// Creates a new PerfConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_ITEMS` - Cache capacity (default: 100)
    /// - `CACHE_DEFAULT_TTL_MS` - Default memoization TTL (default: 300000)
    /// - `CACHE_SWEEP_INTERVAL_MS` - Expired-entry sweep interval (default: 0, disabled)
    /// - `CACHE_MIRROR_DIR` - JSON file mirror directory (default: unset)
    /// - `QUERY_CACHE_MAX_SIZE` - Query result cache capacity (default: 100)
    /// - `QUERY_CACHE_TTL_MS` - Query result TTL (default: 300000)
    /// - `SLOW_QUERY_THRESHOLD_MS` - Slow query threshold (default: 1000)
    /// - `QUERY_LOG_MAX` - Query statistics log ceiling (default: 1000)
    /// - `MAX_METRICS` - Metric log ceiling (default: 1000)
    /// - `BEHAVIOR_WINDOW` - Behavior window length (default: 10)
    /// - `SERVER_PORT` - Diagnostics HTTP port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_max_items: env_or("CACHE_MAX_ITEMS", defaults.cache_max_items),
            cache_default_ttl_ms: env_or("CACHE_DEFAULT_TTL_MS", defaults.cache_default_ttl_ms),
            cache_sweep_interval_ms: env_or(
                "CACHE_SWEEP_INTERVAL_MS",
                defaults.cache_sweep_interval_ms,
            ),
            cache_mirror_dir: env::var("CACHE_MIRROR_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            query_cache_max_size: env_or("QUERY_CACHE_MAX_SIZE", defaults.query_cache_max_size),
            query_cache_ttl_ms: env_or("QUERY_CACHE_TTL_MS", defaults.query_cache_ttl_ms),
            slow_query_threshold_ms: env_or(
                "SLOW_QUERY_THRESHOLD_MS",
                defaults.slow_query_threshold_ms,
            ),
            query_log_max: env_or("QUERY_LOG_MAX", defaults.query_log_max),
            max_metrics: env_or("MAX_METRICS", defaults.max_metrics),
            behavior_window: env_or("BEHAVIOR_WINDOW", defaults.behavior_window),
            server_port: env_or("SERVER_PORT", defaults.server_port),
        }
    }
}

impl Default for PerfConfig {
    fn default() -> Self {
        Self {
            cache_max_items: 100,
            cache_default_ttl_ms: 300_000,
            cache_sweep_interval_ms: 0,
            cache_mirror_dir: None,
            query_cache_max_size: 100,
            query_cache_ttl_ms: 300_000,
            slow_query_threshold_ms: 1000,
            query_log_max: 1000,
            max_metrics: 1000,
            behavior_window: 10,
            server_port: 3000,
        }
    }
}

/// Reads and parses an environment variable, falling back to `default`.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
