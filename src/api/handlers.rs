//! API Handlers
//!
//! HTTP request handlers for the diagnostics endpoints, plus the shared
//! application state holding the long-lived component instances.

use std::sync::Arc;

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    Json,
};
use tracing::warn;

use crate::cache::{shared, CacheStore, JsonFileMirror, SharedCache};
use crate::chunks::{ChunkLoadStats, CodeSplittingManager};
use crate::config::PerfConfig;
use crate::error::{PerfError, Result};
use crate::models::{
    BehaviorRequest, CacheStatsResponse, HealthResponse, MessageResponse, QueryStatsResponse,
    RecordMetricRequest, TaskStatusEntry,
};
use crate::monitor::{PerformanceMonitor, Report, Thresholds};
use crate::preload::{PreloadSummary, Preloader, SmartPreloader};
use crate::query::{DatabaseOptimizer, DynExecutor, QueryExecutor, QUERY_DURATION_METRIC};

/// Application state shared across all handlers.
///
/// Each component is constructed once and handed to whoever needs it.
#[derive(Clone)]
pub struct AppState {
    pub cache: SharedCache,
    pub preloader: Arc<Preloader>,
    pub smart_preloader: Arc<SmartPreloader>,
    pub chunks: Arc<CodeSplittingManager>,
    pub monitor: Arc<PerformanceMonitor>,
    /// Present once the host supplies a query executor
    pub optimizer: Option<Arc<DatabaseOptimizer<DynExecutor>>>,
    /// Duration at which queries are listed as slow
    pub slow_query_threshold_ms: f64,
}

impl AppState {
    /// Creates a new AppState with the given cache store and default components.
    pub fn new(cache: CacheStore) -> Self {
        Self::with_parts(cache, &PerfConfig::default())
    }

    /// Creates a new AppState from configuration.
    ///
    /// A mirror directory that cannot be opened leaves the cache memory-only.
    pub fn from_config(config: &PerfConfig) -> Self {
        let mut cache = CacheStore::new(config.cache_max_items)
            .with_default_ttl(config.cache_default_ttl_ms);

        if let Some(dir) = &config.cache_mirror_dir {
            match JsonFileMirror::new(dir) {
                Ok(mirror) => cache = cache.with_mirror(mirror),
                Err(e) => warn!(error = %e, "Cache mirror unavailable, using memory only"),
            }
        }

        Self::with_parts(cache, config)
    }

    fn with_parts(cache: CacheStore, config: &PerfConfig) -> Self {
        let thresholds = Thresholds::default().with_ceiling(
            QUERY_DURATION_METRIC,
            config.slow_query_threshold_ms as f64,
        );
        let monitor = Arc::new(
            PerformanceMonitor::with_capacity(config.max_metrics).with_thresholds(thresholds),
        );
        let preloader = Arc::new(Preloader::new());
        let smart_preloader = Arc::new(SmartPreloader::new(
            preloader.clone(),
            config.behavior_window,
        ));
        let chunks = Arc::new(CodeSplittingManager::new().with_monitor(monitor.clone()));

        Self {
            cache: shared(cache),
            preloader,
            smart_preloader,
            chunks,
            monitor,
            optimizer: None,
            slow_query_threshold_ms: config.slow_query_threshold_ms as f64,
        }
    }

    /// Attaches a query optimizer over the host's executor.
    pub fn with_optimizer(
        mut self,
        executor: impl QueryExecutor + 'static,
        config: &PerfConfig,
    ) -> Self {
        let optimizer = DatabaseOptimizer::new(
            DynExecutor::new(executor),
            config.query_cache_max_size,
            config.query_cache_ttl_ms,
        )
        .with_slow_threshold(config.slow_query_threshold_ms)
        .with_log_capacity(config.query_log_max)
        .with_monitor(self.monitor.clone());
        self.optimizer = Some(Arc::new(optimizer));
        self
    }
}

/// Handler for GET /cache/stats
pub async fn cache_stats_handler(State(state): State<AppState>) -> Json<CacheStatsResponse> {
    let stats = state.cache.read().await.stats();
    Json(stats.into())
}

/// Handler for GET /preload/status
pub async fn preload_status_handler(State(state): State<AppState>) -> Json<Vec<TaskStatusEntry>> {
    let entries = state
        .preloader
        .registered_ids()
        .into_iter()
        .filter_map(|id| {
            let status = state.preloader.status(&id)?;
            Some(TaskStatusEntry { id, status })
        })
        .collect();
    Json(entries)
}

/// Handler for POST /behavior
///
/// Records a user action and runs whatever preloads it predicts.
pub async fn behavior_handler(
    State(state): State<AppState>,
    Json(req): Json<BehaviorRequest>,
) -> Result<Json<PreloadSummary>> {
    if let Some(error_msg) = req.validate() {
        return Err(PerfError::InvalidRequest(error_msg));
    }

    let summary = state.smart_preloader.record_behavior(req.action).await;
    Ok(Json(summary))
}

/// Handler for GET /chunks/stats
pub async fn chunk_stats_handler(State(state): State<AppState>) -> Json<ChunkLoadStats> {
    Json(state.chunks.stats())
}

/// Handler for GET /query/stats
pub async fn query_stats_handler(State(state): State<AppState>) -> Json<QueryStatsResponse> {
    let Some(optimizer) = &state.optimizer else {
        return Json(QueryStatsResponse::disabled());
    };

    Json(QueryStatsResponse {
        enabled: true,
        entries: optimizer.get_query_stats(),
        summary: optimizer.query_summary(),
        slow_queries: optimizer.get_slow_queries(state.slow_query_threshold_ms),
        cache: Some(optimizer.get_cache_stats()),
    })
}

/// Handler for GET /report
pub async fn report_handler(State(state): State<AppState>) -> Json<Report> {
    Json(state.monitor.get_performance_report())
}

/// Handler for GET /metrics/export
pub async fn export_handler(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let body = state.monitor.export_metrics()?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body))
}

/// Handler for PUT /metrics
pub async fn record_metric_handler(
    State(state): State<AppState>,
    Json(req): Json<RecordMetricRequest>,
) -> Result<Json<MessageResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(PerfError::InvalidRequest(error_msg));
    }

    state.monitor.record_metric(req.name.clone(), req.value);
    Ok(Json(MessageResponse::new(format!(
        "Metric '{}' recorded",
        req.name
    ))))
}

/// Handler for DELETE /metrics
pub async fn clear_metrics_handler(State(state): State<AppState>) -> Json<MessageResponse> {
    state.monitor.clear_metrics();
    Json(MessageResponse::new("Metrics cleared"))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
