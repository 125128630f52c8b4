//! Error types for the performance layer
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Perf Error Enum ==
/// Unified error type for the performance layer.
///
/// Only [`PerfError::QueryExecution`] ever reaches callers of the core
/// components; the remaining variants are logged and swallowed at the point
/// of use, or surface through the diagnostics API.
#[derive(Error, Debug)]
pub enum PerfError {
    /// The host's query-execution collaborator rejected the query
    #[error("Query execution failed for '{query}': {source}")]
    QueryExecution {
        query: String,
        #[source]
        source: anyhow::Error,
    },

    /// The persistent cache mirror failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// JSON encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for PerfError {
    fn into_response(self) -> Response {
        let status = match &self {
            PerfError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            PerfError::QueryExecution { .. } => StatusCode::BAD_GATEWAY,
            PerfError::Storage(_) | PerfError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the performance layer.
pub type Result<T> = std::result::Result<T, PerfError>;
