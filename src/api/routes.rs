//! API Routes
//!
//! Configures the Axum router with all diagnostics endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    behavior_handler, cache_stats_handler, chunk_stats_handler, clear_metrics_handler,
    export_handler, health_handler, preload_status_handler, query_stats_handler,
    record_metric_handler, report_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/cache/stats", get(cache_stats_handler))
        .route("/preload/status", get(preload_status_handler))
        .route("/behavior", post(behavior_handler))
        .route("/chunks/stats", get(chunk_stats_handler))
        .route("/query/stats", get(query_stats_handler))
        .route("/report", get(report_handler))
        .route("/metrics/export", get(export_handler))
        .route(
            "/metrics",
            put(record_metric_handler).delete(clear_metrics_handler),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
