//! Database Optimizer
//!
//! Wraps the host's query executor with a bounded result cache and a timing
//! log. Execution errors are returned to the caller; only successful results
//! are cached.

use std::collections::{BTreeMap, VecDeque};
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::cache::{current_timestamp_ms, CacheStore};
use crate::error::{PerfError, Result};
use crate::monitor::PerformanceMonitor;
use crate::query::{normalize_query, QueryCacheStats, QueryStatEntry, QuerySummary};

/// Metric name used for executed query durations, in milliseconds.
pub const QUERY_DURATION_METRIC: &str = "query_duration";

/// Default ceiling of the query statistics log.
pub const DEFAULT_QUERY_LOG_MAX: usize = 1000;

// == Query Executor ==
/// Host-supplied collaborator that actually runs a query.
///
/// Implemented for any `Fn(String, Value) -> Future<Output = anyhow::Result<Value>>`.
pub trait QueryExecutor: Send + Sync {
    fn execute<'a>(&'a self, query: &'a str, params: &'a Value)
        -> BoxFuture<'a, anyhow::Result<Value>>;
}

impl<F, Fut> QueryExecutor for F
where
    F: Fn(String, Value) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    fn execute<'a>(
        &'a self,
        query: &'a str,
        params: &'a Value,
    ) -> BoxFuture<'a, anyhow::Result<Value>> {
        self(query.to_string(), params.clone()).boxed()
    }
}

/// Type-erased executor, for holding optimizers over different executors
/// behind one type.
#[derive(Clone)]
pub struct DynExecutor(Arc<dyn QueryExecutor>);

impl DynExecutor {
    pub fn new(executor: impl QueryExecutor + 'static) -> Self {
        Self(Arc::new(executor))
    }
}

impl QueryExecutor for DynExecutor {
    fn execute<'a>(
        &'a self,
        query: &'a str,
        params: &'a Value,
    ) -> BoxFuture<'a, anyhow::Result<Value>> {
        self.0.execute(query, params)
    }
}

// == Query Options ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Serve from and populate the result cache
    pub cache: bool,
}

impl QueryOptions {
    pub fn cached() -> Self {
        Self { cache: true }
    }

    pub fn uncached() -> Self {
        Self { cache: false }
    }
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self::cached()
    }
}

// == Database Optimizer ==
pub struct DatabaseOptimizer<E> {
    executor: E,
    cache: Mutex<CacheStore<Value>>,
    cache_ttl_ms: Option<u64>,
    log: RwLock<VecDeque<QueryStatEntry>>,
    max_log_entries: usize,
    slow_threshold_ms: f64,
    monitor: Option<Arc<PerformanceMonitor>>,
}

impl<E: QueryExecutor> DatabaseOptimizer<E> {
    /// Creates an optimizer caching at most `max_cached` results for
    /// `cache_ttl_ms` each. A TTL of zero keeps results until evicted.
    pub fn new(executor: E, max_cached: usize, cache_ttl_ms: u64) -> Self {
        Self {
            executor,
            cache: Mutex::new(CacheStore::new(max_cached)),
            cache_ttl_ms: (cache_ttl_ms > 0).then_some(cache_ttl_ms),
            log: RwLock::new(VecDeque::new()),
            max_log_entries: DEFAULT_QUERY_LOG_MAX,
            slow_threshold_ms: 1000.0,
            monitor: None,
        }
    }

    /// Caps the statistics log; the oldest entry is dropped once it is full.
    pub fn with_log_capacity(mut self, max_entries: usize) -> Self {
        self.max_log_entries = max_entries.max(1);
        self
    }

    /// Sets the duration above which executions are logged as slow.
    pub fn with_slow_threshold(mut self, threshold_ms: u64) -> Self {
        self.slow_threshold_ms = threshold_ms as f64;
        self
    }

    /// Reports every executed query's duration to `monitor`.
    pub fn with_monitor(mut self, monitor: Arc<PerformanceMonitor>) -> Self {
        self.monitor = Some(monitor);
        self
    }

    // == Execute ==
    /// Runs a query, answering from the result cache when allowed.
    ///
    /// Pass `Value::Null` when the query takes no parameters.
    pub async fn execute_optimized_query(
        &self,
        query: &str,
        params: Value,
        options: QueryOptions,
    ) -> Result<Value> {
        let normalized = normalize_query(query);
        // serde_json's default Map keeps object keys sorted, so params that
        // differ only in field order share a key. Enabling serde_json's
        // `preserve_order` feature would break this.
        let cache_key = format!("{}|{}", normalized, params);

        if options.cache {
            let cached = self.cache.lock().get(&cache_key);
            if let Some(result) = cached {
                debug!(query = %normalized, "Query served from cache");
                self.append_stat(normalized, params, 0.0, true);
                return Ok(result);
            }
        }

        let started = Instant::now();
        let result = self
            .executor
            .execute(query, &params)
            .await
            .map_err(|source| PerfError::QueryExecution {
                query: normalized.clone(),
                source,
            })?;
        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

        if duration_ms >= self.slow_threshold_ms {
            warn!(query = %normalized, duration_ms, "Slow query");
        }
        if let Some(monitor) = &self.monitor {
            monitor.record_metric(QUERY_DURATION_METRIC, duration_ms);
        }
        if options.cache {
            self.cache
                .lock()
                .set(cache_key, result.clone(), self.cache_ttl_ms);
        }

        self.append_stat(normalized, params, duration_ms, false);
        Ok(result)
    }

    // == Statistics ==
    /// Every retained execution, oldest first.
    pub fn get_query_stats(&self) -> Vec<QueryStatEntry> {
        self.log.read().iter().cloned().collect()
    }

    /// Entries whose duration is at least `threshold_ms`.
    pub fn get_slow_queries(&self, threshold_ms: f64) -> Vec<QueryStatEntry> {
        self.log
            .read()
            .iter()
            .filter(|entry| entry.duration_ms >= threshold_ms)
            .cloned()
            .collect()
    }

    /// Per-normalized-query aggregates, sorted by query text.
    pub fn query_summary(&self) -> Vec<QuerySummary> {
        let log = self.log.read();
        let mut groups: BTreeMap<&str, Vec<&QueryStatEntry>> = BTreeMap::new();
        for entry in log.iter() {
            groups.entry(entry.query.as_str()).or_default().push(entry);
        }
        groups
            .into_iter()
            .map(|(query, entries)| QuerySummary::from_entries(query.to_string(), entries))
            .collect()
    }

    pub fn get_cache_stats(&self) -> QueryCacheStats {
        let stats = self.cache.lock().stats();
        QueryCacheStats {
            size: stats.memory_items,
            max_size: stats.max_memory_items,
            hit_rate: stats.hit_rate(),
        }
    }

    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }

    pub fn clear_stats(&self) {
        self.log.write().clear();
    }

    fn append_stat(&self, query: String, params: Value, duration_ms: f64, cache_hit: bool) {
        let mut log = self.log.write();
        if log.len() >= self.max_log_entries {
            log.pop_front();
        }
        log.push_back(QueryStatEntry {
            query,
            params,
            duration_ms,
            timestamp: current_timestamp_ms(),
            cache_hit,
        });
    }
}
