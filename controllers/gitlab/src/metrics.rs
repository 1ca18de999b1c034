//! # Metrics
//!
//! Prometheus metrics for the controller, all labelled by kind.
//!
//! - `gitlab_controller_reconciliations_total` - reconciles by kind and result
//! - `gitlab_controller_reconciliation_duration_seconds` - reconcile latency
//! - `gitlab_controller_external_operations_total` - GitLab observe/create/update/delete calls
//! - `gitlab_controller_managed_resources` - records currently known per kind

use anyhow::Result;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry};
use std::sync::LazyLock;
use std::time::Duration;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "gitlab_controller_reconciliations_total",
            "Total number of reconciliations",
        ),
        &["kind", "result"],
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "gitlab_controller_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
        &["kind"],
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static EXTERNAL_OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "gitlab_controller_external_operations_total",
            "Total number of operations against GitLab",
        ),
        &["kind", "operation", "result"],
    )
    .expect("Failed to create EXTERNAL_OPERATIONS_TOTAL metric - this should never happen")
});

static MANAGED_RESOURCES: LazyLock<IntGaugeVec> = LazyLock::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "gitlab_controller_managed_resources",
            "Current number of managed resources",
        ),
        &["kind"],
    )
    .expect("Failed to create MANAGED_RESOURCES metric - this should never happen")
});

pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(EXTERNAL_OPERATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(MANAGED_RESOURCES.clone()))?;
    Ok(())
}

fn result_label(ok: bool) -> &'static str {
    if ok { "success" } else { "error" }
}

pub fn observe_reconciliation(kind: &str, duration: Duration, ok: bool) {
    RECONCILIATIONS_TOTAL
        .with_label_values(&[kind, result_label(ok)])
        .inc();
    RECONCILIATION_DURATION
        .with_label_values(&[kind])
        .observe(duration.as_secs_f64());
}

pub fn record_external_operation(kind: &str, operation: &str, ok: bool) {
    EXTERNAL_OPERATIONS_TOTAL
        .with_label_values(&[kind, operation, result_label(ok)])
        .inc();
}

pub fn set_managed_resources(kind: &str, count: usize) {
    MANAGED_RESOURCES
        .with_label_values(&[kind])
        .set(i64::try_from(count).unwrap_or(i64::MAX));
}
