//! Performance Monitor Module
//!
//! Collects named numeric metrics and turns them into reports with detected
//! issues and recommendations.

mod collector;
mod metric;
mod report;

pub use collector::{MetricsExport, PerformanceMonitor, DEFAULT_MAX_METRICS};
pub use metric::Metric;
pub use report::{Issue, MetricSummary, Report, Severity, Threshold, Thresholds};
