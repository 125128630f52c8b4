//! API Module
//!
//! HTTP handlers and routing for the diagnostics API.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /cache/stats` - Cache statistics
//! - `GET /preload/status` - Status of every registered preload task
//! - `POST /behavior` - Record a user action for prediction
//! - `GET /chunks/stats` - Chunk load counters
//! - `GET /query/stats` - Query log, summaries and result-cache statistics
//! - `GET /report` - Performance report
//! - `GET /metrics/export` - JSON export of metrics and report
//! - `PUT /metrics` - Record a metric
//! - `DELETE /metrics` - Clear the metric log

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
