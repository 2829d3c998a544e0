//! Metrics collection for observability

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec_with_registry, register_counter_with_registry,
    register_histogram_vec_with_registry, register_histogram_with_registry, Counter, CounterVec,
    Histogram, HistogramVec, Opts, Registry,
};
use std::sync::Arc;

/// Global metrics registry
pub static ENGINE_METRICS: Lazy<Arc<EngineMetrics>> =
    Lazy::new(|| Arc::new(EngineMetrics::new().expect("Failed to initialize metrics")));

/// Metrics collector
pub struct EngineMetrics {
    registry: Registry,

    // Analysis metrics
    pub analyses_total: CounterVec,
    pub analysis_duration: Histogram,
    pub actionable_duplicates: Counter,

    // Search metrics
    pub search_strategy_runs: CounterVec,
    pub search_strategy_duration: HistogramVec,
    pub candidates_considered: Counter,

    // Bulk metrics
    pub batches_total: Counter,
    pub cross_references: Counter,

    // Resolution metrics
    pub resolutions_total: CounterVec,
}

impl EngineMetrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let registry = Registry::new();

        let analyses_total = register_counter_vec_with_registry!(
            Opts::new("dedupe_analyses_total", "Total duplicate analyses by status"),
            &["status"],
            registry
        )?;

        let analysis_duration = register_histogram_with_registry!(
            "dedupe_analysis_duration_seconds",
            "Duration of one duplicate analysis in seconds",
            registry
        )?;

        let actionable_duplicates = register_counter_with_registry!(
            Opts::new(
                "dedupe_actionable_duplicates_total",
                "Duplicates strong enough to block blind creation"
            ),
            registry
        )?;

        let search_strategy_runs = register_counter_vec_with_registry!(
            Opts::new(
                "dedupe_search_strategy_runs_total",
                "Search strategy runs by strategy and outcome"
            ),
            &["strategy", "status"],
            registry
        )?;

        let search_strategy_duration = register_histogram_vec_with_registry!(
            "dedupe_search_strategy_duration_seconds",
            "Search strategy latency in seconds",
            &["strategy"],
            registry
        )?;

        let candidates_considered = register_counter_with_registry!(
            Opts::new(
                "dedupe_candidates_considered_total",
                "Raw candidates scored before the inclusion floor"
            ),
            registry
        )?;

        let batches_total = register_counter_with_registry!(
            Opts::new("dedupe_batches_total", "Bulk analysis batches processed"),
            registry
        )?;

        let cross_references = register_counter_with_registry!(
            Opts::new(
                "dedupe_cross_references_total",
                "Cross-references found between tasks of one batch"
            ),
            registry
        )?;

        let resolutions_total = register_counter_vec_with_registry!(
            Opts::new(
                "dedupe_resolutions_total",
                "Applied conflict resolutions by action"
            ),
            &["action"],
            registry
        )?;

        Ok(Self {
            registry,
            analyses_total,
            analysis_duration,
            actionable_duplicates,
            search_strategy_runs,
            search_strategy_duration,
            candidates_considered,
            batches_total,
            cross_references,
            resolutions_total,
        })
    }

    /// Get the metrics registry for exporting
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record one finished analysis
    pub fn record_analysis(&self, success: bool, duration_secs: f64, actionable: usize) {
        let status = if success { "success" } else { "error" };
        self.analyses_total.with_label_values(&[status]).inc();
        self.analysis_duration.observe(duration_secs);
        if actionable > 0 {
            self.actionable_duplicates.inc_by(actionable as f64);
        }
    }

    /// Record an analysis that failed before producing a report
    pub fn record_analysis_failure(&self) {
        self.analyses_total.with_label_values(&["error"]).inc();
    }

    /// Record one search strategy run
    pub fn record_search_strategy(&self, strategy: &str, status: &str, duration_secs: f64) {
        self.search_strategy_runs
            .with_label_values(&[strategy, status])
            .inc();
        self.search_strategy_duration
            .with_label_values(&[strategy])
            .observe(duration_secs);
    }

    /// Record raw candidates entering the scorer
    pub fn record_candidates(&self, count: usize) {
        self.candidates_considered.inc_by(count as f64);
    }

    /// Record a bulk batch and its cross-references
    pub fn record_batch(&self, cross_references: usize) {
        self.batches_total.inc();
        if cross_references > 0 {
            self.cross_references.inc_by(cross_references as f64);
        }
    }

    /// Record an applied resolution
    pub fn record_resolution(&self, action: &str) {
        self.resolutions_total.with_label_values(&[action]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_initialize_and_record() {
        ENGINE_METRICS.record_analysis(true, 0.05, 1);
        ENGINE_METRICS.record_search_strategy("text", "success", 0.01);
        ENGINE_METRICS.record_resolution("link_to_existing");

        let families = ENGINE_METRICS.registry().gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "dedupe_analyses_total"));
        assert!(families
            .iter()
            .any(|f| f.get_name() == "dedupe_search_strategy_runs_total"));
    }
}
