//! Prometheus metrics for the scheduler.
//!
//! # Metrics
//!
//! ## Gauges
//! - `rcaflow_graph_nodes` - Total vertices in the RCA graph
//! - `rcaflow_graph_nodes_muted` - Vertices currently muted
//!
//! ## Counters
//! - `rcaflow_ticks_total` - Completed scheduler ticks
//! - `rcaflow_evaluation_failures_total` - Contained evaluator failures
//!
//! ## Histograms
//! - `rcaflow_tick_duration_seconds` - Wall time of one full tick

use prometheus::{Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry};

/// Histogram buckets for tick durations (in seconds).
const TICK_DURATION_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
];

/// Scheduler metrics registry.
pub struct SchedulerMetrics {
    registry: Registry,

    /// Total vertices in the RCA graph.
    pub graph_nodes: IntGauge,
    /// Vertices currently muted.
    pub muted_nodes: IntGauge,
    /// Completed scheduler ticks.
    pub ticks_total: IntCounter,
    /// Evaluator failures contained within ticks.
    pub evaluation_failures: IntCounter,
    /// Wall time of one full tick.
    pub tick_duration: Histogram,
}

impl SchedulerMetrics {
    /// Create a new registry with all scheduler metrics registered.
    pub fn new() -> Self {
        let registry = Registry::new();

        let graph_nodes = IntGauge::with_opts(
            Opts::new("graph_nodes", "Total vertices in the RCA graph").namespace("rcaflow"),
        )
        .expect("metric creation should not fail");

        let muted_nodes = IntGauge::with_opts(
            Opts::new("graph_nodes_muted", "Vertices currently muted").namespace("rcaflow"),
        )
        .expect("metric creation should not fail");

        let ticks_total = IntCounter::with_opts(
            Opts::new("ticks_total", "Completed scheduler ticks").namespace("rcaflow"),
        )
        .expect("metric creation should not fail");

        let evaluation_failures = IntCounter::with_opts(
            Opts::new(
                "evaluation_failures_total",
                "Evaluator failures contained within ticks",
            )
            .namespace("rcaflow"),
        )
        .expect("metric creation should not fail");

        let tick_duration = Histogram::with_opts(
            HistogramOpts::new("tick_duration_seconds", "Wall time of one full tick")
                .namespace("rcaflow")
                .buckets(TICK_DURATION_BUCKETS.to_vec()),
        )
        .expect("metric creation should not fail");

        registry
            .register(Box::new(graph_nodes.clone()))
            .expect("metric registration should not fail");
        registry
            .register(Box::new(muted_nodes.clone()))
            .expect("metric registration should not fail");
        registry
            .register(Box::new(ticks_total.clone()))
            .expect("metric registration should not fail");
        registry
            .register(Box::new(evaluation_failures.clone()))
            .expect("metric registration should not fail");
        registry
            .register(Box::new(tick_duration.clone()))
            .expect("metric registration should not fail");

        Self {
            registry,
            graph_nodes,
            muted_nodes,
            ticks_total,
            evaluation_failures,
            tick_duration,
        }
    }

    /// The underlying registry, for scraping.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for SchedulerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_register_and_update() {
        let metrics = SchedulerMetrics::new();
        metrics.graph_nodes.set(7);
        metrics.muted_nodes.set(2);
        metrics.ticks_total.inc();
        metrics.tick_duration.observe(0.02);

        let families = metrics.registry().gather();
        let names: Vec<&str> = families.iter().map(|f| f.get_name()).collect();
        assert!(names.contains(&"rcaflow_graph_nodes"));
        assert!(names.contains(&"rcaflow_graph_nodes_muted"));
        assert!(names.contains(&"rcaflow_ticks_total"));
        assert!(names.contains(&"rcaflow_tick_duration_seconds"));
    }
}
