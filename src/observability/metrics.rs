//! # Metrics
//!
//! Prometheus metrics for monitoring the controller.
//!
//! ## Metrics Exposed
//!
//! - `build_controller_reconciliations_total` - Total number of Build reconciliations
//! - `build_controller_reconciliation_errors_total` - Total number of reconciliation errors
//! - `build_controller_reconciliation_duration_seconds` - Duration of reconciliation passes
//! - `build_controller_requeues_total` - Requeues by reason
//! - `build_controller_handler_actions_total` - Convergence actions by handler and action
//! - `build_controller_handler_failures_total` - Handler failures by handler and error class
//! - `build_controller_handler_duration_seconds` - Duration of one handler step by handler
//! - `build_controller_unrecognized_step_phases_total` - Workflow node phases outside the known vocabulary

use anyhow::Result;
use prometheus::{Histogram, HistogramVec, IntCounter, IntCounterVec, Registry};
use std::sync::LazyLock;

// Metrics
pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "build_controller_reconciliations_total",
        "Total number of Build reconciliations",
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "build_controller_reconciliation_errors_total",
        "Total number of reconciliation errors",
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "build_controller_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static REQUEUES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "build_controller_requeues_total",
            "Total number of requeues by reason",
        ),
        &["reason"],
    )
    .expect("Failed to create REQUEUES_TOTAL metric - this should never happen")
});

static HANDLER_ACTIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "build_controller_handler_actions_total",
            "Total number of convergence actions by handler and action",
        ),
        &["handler", "action"],
    )
    .expect("Failed to create HANDLER_ACTIONS_TOTAL metric - this should never happen")
});

static HANDLER_FAILURES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "build_controller_handler_failures_total",
            "Total number of handler failures by handler and error class",
        ),
        &["handler", "class"],
    )
    .expect("Failed to create HANDLER_FAILURES_TOTAL metric - this should never happen")
});

static HANDLER_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "build_controller_handler_duration_seconds",
            "Duration of one handler convergence step in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 30.0]),
        &["handler"],
    )
    .expect("Failed to create HANDLER_DURATION metric - this should never happen")
});

static UNRECOGNIZED_STEP_PHASES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "build_controller_unrecognized_step_phases_total",
            "Workflow node phases outside the known vocabulary, reported as Succeeded",
        ),
        &["phase"],
    )
    .expect("Failed to create UNRECOGNIZED_STEP_PHASES_TOTAL metric - this should never happen")
});

/// Register all metrics with the global registry
///
/// # Errors
///
/// Fails if a metric is registered twice.
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(REQUEUES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(HANDLER_ACTIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(HANDLER_FAILURES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(HANDLER_DURATION.clone()))?;
    REGISTRY.register(Box::new(UNRECOGNIZED_STEP_PHASES_TOTAL.clone()))?;

    Ok(())
}

/// Gather every registered metric family for the `/metrics` endpoint
#[must_use]
pub fn gather() -> Vec<prometheus::proto::MetricFamily> {
    REGISTRY.gather()
}

pub fn increment_reconciliations() {
    RECONCILIATIONS_TOTAL.inc();
}

pub fn increment_reconciliation_errors() {
    RECONCILIATION_ERRORS_TOTAL.inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

pub fn increment_requeues_total(reason: &str) {
    REQUEUES_TOTAL.with_label_values(&[reason]).inc();
}

pub fn record_handler_action(handler: &str, action: &str) {
    HANDLER_ACTIONS_TOTAL
        .with_label_values(&[handler, action])
        .inc();
}

pub fn record_handler_failure(handler: &str, class: &str) {
    HANDLER_FAILURES_TOTAL
        .with_label_values(&[handler, class])
        .inc();
}

pub fn observe_handler_duration(handler: &str, duration: f64) {
    HANDLER_DURATION
        .with_label_values(&[handler])
        .observe(duration);
}

pub fn increment_unrecognized_step_phase(phase: &str) {
    UNRECOGNIZED_STEP_PHASES_TOTAL
        .with_label_values(&[phase])
        .inc();
}
