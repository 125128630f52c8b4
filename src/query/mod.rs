//! Query Optimization Module
//!
//! Caches query results, times executions and keeps a per-query log.

mod normalize;
mod optimizer;
mod stats;

pub use normalize::normalize_query;
pub use optimizer::{
    DatabaseOptimizer, DynExecutor, QueryExecutor, QueryOptions, DEFAULT_QUERY_LOG_MAX,
    QUERY_DURATION_METRIC,
};
pub use stats::{QueryCacheStats, QueryStatEntry, QuerySummary};
