//! Report Module
//!
//! Aggregates a metric log into per-name summaries, threshold issues and
//! recommendations.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::monitor::Metric;

// == Threshold ==
/// Ceiling for one metric and the advice given when it is exceeded.
#[derive(Debug, Clone, PartialEq)]
pub struct Threshold {
    pub ceiling: f64,
    pub recommendation: String,
}

// == Thresholds ==
/// Static ceilings keyed by metric name.
#[derive(Debug, Clone)]
pub struct Thresholds {
    by_metric: HashMap<String, Threshold>,
}

impl Thresholds {
    /// An empty set; no metric ever raises an issue.
    pub fn none() -> Self {
        Self {
            by_metric: HashMap::new(),
        }
    }

    /// Adds or replaces the ceiling for `metric`.
    pub fn with(
        mut self,
        metric: impl Into<String>,
        ceiling: f64,
        recommendation: impl Into<String>,
    ) -> Self {
        self.by_metric.insert(
            metric.into(),
            Threshold {
                ceiling,
                recommendation: recommendation.into(),
            },
        );
        self
    }

    /// Moves the ceiling of an already configured metric, keeping its
    /// recommendation. Unknown metrics are left alone.
    pub fn with_ceiling(mut self, metric: &str, ceiling: f64) -> Self {
        if let Some(threshold) = self.by_metric.get_mut(metric) {
            threshold.ceiling = ceiling;
        }
        self
    }

    pub fn get(&self, metric: &str) -> Option<&Threshold> {
        self.by_metric.get(metric)
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::none()
            .with(
                "page_load_time",
                3000.0,
                "Reduce initial bundle size and defer non-critical resources",
            )
            .with(
                "first_contentful_paint",
                1800.0,
                "Inline critical styles and preload above-the-fold assets",
            )
            .with(
                "largest_contentful_paint",
                2500.0,
                "Optimize and preload the largest visible image or block",
            )
            .with(
                "first_input_delay",
                100.0,
                "Break up long tasks on the main thread",
            )
            .with(
                "cumulative_layout_shift",
                0.1,
                "Reserve space for images and late-loading content",
            )
            .with(
                "query_duration",
                1000.0,
                "Cache frequent queries and add indexes for slow ones",
            )
            .with(
                "chunk_load_time",
                2000.0,
                "Split large chunks and preload the ones needed next",
            )
            .with(
                "memory_usage_mb",
                100.0,
                "Lower cache capacity or shorten entry TTLs",
            )
    }
}

// == Metric Summary ==
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSummary {
    pub count: usize,
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub latest: f64,
}

// == Issue ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    /// Worst value is more than twice the ceiling
    Critical,
}

/// A metric whose samples exceeded its ceiling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub metric: String,
    /// Worst recorded value
    pub value: f64,
    pub threshold: f64,
    /// Number of samples above the ceiling
    pub occurrences: usize,
    pub severity: Severity,
    pub message: String,
}

// == Report ==
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub metrics: Vec<Metric>,
    pub summary: BTreeMap<String, MetricSummary>,
    pub issues: Vec<Issue>,
    pub recommendations: Vec<String>,
}

impl Report {
    /// Builds a report from a metric log snapshot.
    pub fn build(metrics: Vec<Metric>, thresholds: &Thresholds) -> Self {
        let summary = summarize(&metrics);
        let issues = detect_issues(&metrics, &summary, thresholds);

        let mut recommendations: Vec<String> = Vec::new();
        for issue in &issues {
            if let Some(threshold) = thresholds.get(&issue.metric) {
                if !recommendations.contains(&threshold.recommendation) {
                    recommendations.push(threshold.recommendation.clone());
                }
            }
        }

        Self {
            metrics,
            summary,
            issues,
            recommendations,
        }
    }
}

fn summarize(metrics: &[Metric]) -> BTreeMap<String, MetricSummary> {
    let mut totals: BTreeMap<String, (MetricSummary, f64)> = BTreeMap::new();
    for metric in metrics {
        let (summary, total) = totals.entry(metric.name.clone()).or_insert((
            MetricSummary {
                count: 0,
                average: 0.0,
                min: f64::INFINITY,
                max: f64::NEG_INFINITY,
                latest: metric.value,
            },
            0.0,
        ));
        summary.count += 1;
        summary.min = summary.min.min(metric.value);
        summary.max = summary.max.max(metric.value);
        summary.latest = metric.value;
        *total += metric.value;
    }

    totals
        .into_iter()
        .map(|(name, (mut summary, total))| {
            summary.average = total / summary.count as f64;
            (name, summary)
        })
        .collect()
}

fn detect_issues(
    metrics: &[Metric],
    summary: &BTreeMap<String, MetricSummary>,
    thresholds: &Thresholds,
) -> Vec<Issue> {
    summary
        .iter()
        .filter_map(|(name, stats)| {
            let threshold = thresholds.get(name)?;
            if stats.max <= threshold.ceiling {
                return None;
            }
            let occurrences = metrics
                .iter()
                .filter(|m| m.name == *name && m.value > threshold.ceiling)
                .count();
            let severity = if stats.max > threshold.ceiling * 2.0 {
                Severity::Critical
            } else {
                Severity::Warning
            };
            Some(Issue {
                metric: name.clone(),
                value: stats.max,
                threshold: threshold.ceiling,
                occurrences,
                severity,
                message: format!(
                    "{} reached {} (threshold {}) in {} sample(s)",
                    name, stats.max, threshold.ceiling, occurrences
                ),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric(name: &str, value: f64) -> Metric {
        Metric {
            name: name.to_string(),
            value,
            timestamp: 0,
        }
    }

    #[test]
    fn test_empty_report() {
        let report = Report::build(Vec::new(), &Thresholds::default());
        assert!(report.metrics.is_empty());
        assert!(report.summary.is_empty());
        assert!(report.issues.is_empty());
        assert!(report.recommendations.is_empty());
    }

    #[test]
    fn test_summary_per_name() {
        let report = Report::build(
            vec![metric("x", 100.0), metric("y", 1.0), metric("x", 300.0)],
            &Thresholds::none(),
        );

        let x = &report.summary["x"];
        assert_eq!(x.count, 2);
        assert_eq!(x.average, 200.0);
        assert_eq!(x.min, 100.0);
        assert_eq!(x.max, 300.0);
        assert_eq!(x.latest, 300.0);
        assert_eq!(report.summary["y"].count, 1);
    }

    #[test]
    fn test_threshold_breach_raises_issue_and_recommendation() {
        let report = Report::build(
            vec![
                metric("page_load_time", 2000.0),
                metric("page_load_time", 4000.0),
                metric("first_input_delay", 50.0),
            ],
            &Thresholds::default(),
        );

        assert_eq!(report.issues.len(), 1);
        let issue = &report.issues[0];
        assert_eq!(issue.metric, "page_load_time");
        assert_eq!(issue.value, 4000.0);
        assert_eq!(issue.occurrences, 1);
        assert_eq!(issue.severity, Severity::Warning);
        assert_eq!(report.recommendations.len(), 1);
    }

    #[test]
    fn test_with_ceiling_keeps_recommendation() {
        let thresholds = Thresholds::default()
            .with_ceiling("query_duration", 5000.0)
            .with_ceiling("not_configured", 1.0);

        let threshold = thresholds.get("query_duration").unwrap();
        assert_eq!(threshold.ceiling, 5000.0);
        assert!(!threshold.recommendation.is_empty());
        assert!(thresholds.get("not_configured").is_none());

        let report = Report::build(vec![metric("query_duration", 2000.0)], &thresholds);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_critical_severity_and_dedup() {
        let thresholds = Thresholds::none()
            .with("a", 10.0, "shared advice")
            .with("b", 10.0, "shared advice");
        let report = Report::build(vec![metric("a", 25.0), metric("b", 11.0)], &thresholds);

        assert_eq!(report.issues.len(), 2);
        assert_eq!(report.issues[0].severity, Severity::Critical);
        assert_eq!(report.recommendations, vec!["shared advice"]);
    }
}
