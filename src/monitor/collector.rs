//! Metric collector and report/export entry points.

use std::collections::VecDeque;
use std::future::Future;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::Result;
use crate::monitor::{Metric, Report, Thresholds};

/// Default ceiling of the metric log.
pub const DEFAULT_MAX_METRICS: usize = 1000;

// == Metrics Export ==
/// Payload produced by [`PerformanceMonitor::export_metrics`].
#[derive(Debug, Clone, Serialize)]
pub struct MetricsExport {
    /// ISO-8601 export time
    pub timestamp: String,
    pub metrics: Vec<Metric>,
    pub report: Report,
}

// == Performance Monitor ==
/// Ordered, bounded log of metrics. The oldest sample is dropped once the
/// ceiling is reached.
#[derive(Debug)]
pub struct PerformanceMonitor {
    log: RwLock<VecDeque<Metric>>,
    max_metrics: usize,
    thresholds: Thresholds,
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_METRICS)
    }

    pub fn with_capacity(max_metrics: usize) -> Self {
        Self {
            log: RwLock::new(VecDeque::new()),
            max_metrics: max_metrics.max(1),
            thresholds: Thresholds::default(),
        }
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    // == Record ==
    /// Appends a sample stamped with the current time.
    ///
    /// Non-finite values are dropped with a warning.
    pub fn record_metric(&self, name: impl Into<String>, value: f64) {
        let name = name.into();
        if !value.is_finite() {
            warn!(metric = %name, "Ignoring non-finite metric value");
            return;
        }

        let mut log = self.log.write();
        if log.len() >= self.max_metrics {
            log.pop_front();
        }
        debug!(metric = %name, value, "Recorded metric");
        log.push_back(Metric::now(name, value));
    }

    /// Awaits `fut` and records how long it took, in milliseconds.
    pub async fn measure<F: Future>(&self, name: impl Into<String>, fut: F) -> F::Output {
        let started = Instant::now();
        let output = fut.await;
        self.record_metric(name, started.elapsed().as_secs_f64() * 1000.0);
        output
    }

    // == Report ==
    pub fn get_performance_report(&self) -> Report {
        Report::build(self.snapshot(), &self.thresholds)
    }

    /// Serializes the log and a fresh report as pretty-printed JSON.
    pub fn export_metrics(&self) -> Result<String> {
        let metrics = self.snapshot();
        let export = MetricsExport {
            timestamp: chrono::Utc::now().to_rfc3339(),
            report: Report::build(metrics.clone(), &self.thresholds),
            metrics,
        };
        Ok(serde_json::to_string_pretty(&export)?)
    }

    pub fn clear_metrics(&self) {
        self.log.write().clear();
    }

    /// Returns the number of samples in the log.
    pub fn len(&self) -> usize {
        self.log.read().len()
    }

    /// Returns true if the log holds no samples.
    pub fn is_empty(&self) -> bool {
        self.log.read().is_empty()
    }

    fn snapshot(&self) -> Vec<Metric> {
        self.log.read().iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::Severity;
    use serde_json::Value;
    use std::time::Duration;

    #[test]
    fn test_recorded_metric_appears_in_report() {
        let monitor = PerformanceMonitor::new();

        monitor.record_metric("x", 100.0);

        let report = monitor.get_performance_report();
        assert!(!report.metrics.is_empty());
        assert!(report
            .metrics
            .iter()
            .any(|m| m.name == "x" && m.value == 100.0));
    }

    #[test]
    fn test_clear_metrics_empties_report() {
        let monitor = PerformanceMonitor::new();
        monitor.record_metric("x", 1.0);
        monitor.record_metric("y", 2.0);

        monitor.clear_metrics();

        let report = monitor.get_performance_report();
        assert_eq!(report.metrics.len(), 0);
        assert!(report.issues.is_empty());
        assert!(report.recommendations.is_empty());
    }

    #[test]
    fn test_ceiling_drops_oldest() {
        let monitor = PerformanceMonitor::with_capacity(3);
        for value in 1..=5 {
            monitor.record_metric("n", value as f64);
        }

        let values: Vec<f64> = monitor
            .get_performance_report()
            .metrics
            .iter()
            .map(|m| m.value)
            .collect();
        assert_eq!(values, vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_non_finite_values_ignored() {
        let monitor = PerformanceMonitor::new();
        monitor.record_metric("bad", f64::NAN);
        monitor.record_metric("bad", f64::INFINITY);
        assert!(monitor.is_empty());
    }

    #[test]
    fn test_report_flags_threshold_breach() {
        let monitor = PerformanceMonitor::new();
        monitor.record_metric("first_input_delay", 450.0);

        let report = monitor.get_performance_report();
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].severity, Severity::Critical);
        assert_eq!(report.recommendations.len(), 1);
    }

    #[test]
    fn test_export_schema() {
        let monitor = PerformanceMonitor::new();
        monitor.record_metric("page_load_time", 1200.0);

        let exported: Value = serde_json::from_str(&monitor.export_metrics().unwrap()).unwrap();

        let timestamp = exported["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
        assert_eq!(exported["metrics"][0]["name"], "page_load_time");
        assert_eq!(exported["metrics"][0]["value"], 1200.0);
        assert!(exported["metrics"][0]["timestamp"].is_u64());
        assert!(exported["report"]["summary"]["page_load_time"].is_object());
        assert!(exported["report"]["issues"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_export_empty_log() {
        let monitor = PerformanceMonitor::new();
        let exported: Value = serde_json::from_str(&monitor.export_metrics().unwrap()).unwrap();
        assert!(exported["metrics"].as_array().unwrap().is_empty());
        assert!(exported["report"]["metrics"].as_array().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_measure_records_elapsed() {
        let monitor = PerformanceMonitor::new();

        let value = monitor
            .measure("render", async {
                tokio::time::sleep(Duration::from_millis(250)).await;
                7
            })
            .await;

        assert_eq!(value, 7);
        let report = monitor.get_performance_report();
        assert_eq!(report.summary["render"].count, 1);
        assert!(report.summary["render"].latest >= 250.0);
    }
}
