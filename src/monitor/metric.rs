//! Metric sample type.

use serde::{Deserialize, Serialize};

use crate::cache::current_timestamp_ms;

/// One recorded sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: f64,
    /// Unix milliseconds
    pub timestamp: u64,
}

impl Metric {
    /// Creates a sample stamped with the current time.
    pub fn now(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            timestamp: current_timestamp_ms(),
        }
    }
}
