//! Request DTOs for the diagnostics API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Maximum accepted length of a metric name or behavior action
pub const MAX_NAME_LENGTH: usize = 128;

/// Request body for PUT /metrics
#[derive(Debug, Clone, Deserialize)]
pub struct RecordMetricRequest {
    /// Metric name
    pub name: String,
    /// Sample value
    pub value: f64,
}

impl RecordMetricRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_name("Metric name", &self.name).or_else(|| {
            (!self.value.is_finite()).then(|| "Metric value must be a finite number".to_string())
        })
    }
}

/// Request body for POST /behavior
#[derive(Debug, Clone, Deserialize)]
pub struct BehaviorRequest {
    /// Action tag, e.g. "select_event"
    pub action: String,
}

impl BehaviorRequest {
    pub fn validate(&self) -> Option<String> {
        validate_name("Action", &self.action)
    }
}

fn validate_name(what: &str, name: &str) -> Option<String> {
    if name.trim().is_empty() {
        return Some(format!("{} cannot be empty", what));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Some(format!(
            "{} exceeds maximum length of {} characters",
            what, MAX_NAME_LENGTH
        ));
    }
    None
}
