//! # Metrics
//!
//! Prometheus metrics for monitoring the controller.
//!
//! ## Metrics Exposed
//!
//! - `mailcow_controller_reconciliations_total` - Reconciliation passes by kind
//! - `mailcow_controller_reconciliation_errors_total` - Failed passes by kind and reason
//! - `mailcow_controller_reconciliation_duration_seconds` - Pass duration by kind
//! - `mailcow_controller_api_calls_total` - mailcow API calls by operation
//! - `mailcow_controller_api_call_errors_total` - Failed mailcow API calls by operation
//! - `mailcow_controller_api_call_duration_seconds` - mailcow API call duration by operation
//! - `mailcow_controller_finalizer_removals_total` - Backend objects released by kind
//! - `mailcow_controller_managed_resources` - Objects seen at startup by kind

use anyhow::Result;
use prometheus::{HistogramVec, IntCounterVec, IntGaugeVec, Registry};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "mailcow_controller_reconciliations_total",
            "Total number of reconciliations by resource kind",
        ),
        &["kind"],
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "mailcow_controller_reconciliation_errors_total",
            "Total number of reconciliation errors by resource kind and reason",
        ),
        &["kind", "reason"],
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "mailcow_controller_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds by resource kind",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
        &["kind"],
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static API_CALLS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "mailcow_controller_api_calls_total",
            "Total number of mailcow API calls by operation",
        ),
        &["operation"],
    )
    .expect("Failed to create API_CALLS_TOTAL metric - this should never happen")
});

static API_CALL_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "mailcow_controller_api_call_errors_total",
            "Total number of failed mailcow API calls by operation",
        ),
        &["operation"],
    )
    .expect("Failed to create API_CALL_ERRORS_TOTAL metric - this should never happen")
});

static API_CALL_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "mailcow_controller_api_call_duration_seconds",
            "Duration of mailcow API calls in seconds by operation",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["operation"],
    )
    .expect("Failed to create API_CALL_DURATION metric - this should never happen")
});

static FINALIZER_REMOVALS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "mailcow_controller_finalizer_removals_total",
            "Total number of finalizers removed after the backend object was gone",
        ),
        &["kind"],
    )
    .expect("Failed to create FINALIZER_REMOVALS_TOTAL metric - this should never happen")
});

static MANAGED_RESOURCES: LazyLock<IntGaugeVec> = LazyLock::new(|| {
    IntGaugeVec::new(
        prometheus::Opts::new(
            "mailcow_controller_managed_resources",
            "Number of resources found at startup by kind",
        ),
        &["kind"],
    )
    .expect("Failed to create MANAGED_RESOURCES metric - this should never happen")
});

/// Register all metrics with the global registry
///
/// # Errors
/// Returns an error if a metric is registered twice
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(API_CALLS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(API_CALL_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(API_CALL_DURATION.clone()))?;
    REGISTRY.register(Box::new(FINALIZER_REMOVALS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(MANAGED_RESOURCES.clone()))?;

    Ok(())
}

pub fn increment_reconciliations(kind: &str) {
    RECONCILIATIONS_TOTAL.with_label_values(&[kind]).inc();
}

pub fn increment_reconciliation_errors(kind: &str, reason: &str) {
    RECONCILIATION_ERRORS_TOTAL
        .with_label_values(&[kind, reason])
        .inc();
}

pub fn observe_reconciliation_duration(kind: &str, duration: f64) {
    RECONCILIATION_DURATION
        .with_label_values(&[kind])
        .observe(duration);
}

/// Record a mailcow API call and its duration
pub fn record_mailcow_call(operation: &str, duration: f64) {
    API_CALLS_TOTAL.with_label_values(&[operation]).inc();
    API_CALL_DURATION
        .with_label_values(&[operation])
        .observe(duration);
}

pub fn increment_mailcow_call_errors(operation: &str) {
    API_CALL_ERRORS_TOTAL.with_label_values(&[operation]).inc();
}

pub fn increment_finalizer_removals(kind: &str) {
    FINALIZER_REMOVALS_TOTAL.with_label_values(&[kind]).inc();
}

pub fn set_managed_resources(kind: &str, count: i64) {
    MANAGED_RESOURCES.with_label_values(&[kind]).set(count);
}
