// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for zone reconciliation.
//!
//! All metrics carry the `bindsync` prefix and live in a crate-local
//! registry. The CLI can dump the text exposition after a run with
//! `--metrics-file`, which suits node-exporter's textfile collector.
//!
//! # Example
//!
//! ```rust,no_run
//! use bindsync::metrics::{gather_metrics, record_plan};
//!
//! record_plan("example.com.", 3);
//! println!("{}", gather_metrics().unwrap());
//! ```

use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all metrics
const METRICS_NAMESPACE: &str = "bindsync";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Plan / Apply Metrics
// ============================================================================

/// Total number of plans computed
///
/// Labels:
/// - `zone`: Zone origin
/// - `result`: `changes` or `unchanged`
pub static PLANS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_plans_total"),
        "Total number of plans computed by zone and result",
    );
    let counter = CounterVec::new(opts, &["zone", "result"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Total number of applies
///
/// Labels:
/// - `strategy`: `dynamic` or `zone`
/// - `outcome`: `applied`, `unchanged`, `aborted` or `error`
pub static APPLIES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_applies_total"),
        "Total number of applies by strategy and outcome",
    );
    let counter = CounterVec::new(opts, &["strategy", "outcome"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Record changes found by plans
///
/// Labels:
/// - `change`: `added`, `removed` or `ttl_changed`
pub static RECORD_CHANGES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_record_changes_total"),
        "Total number of record changes found by plans",
    );
    let counter = CounterVec::new(opts, &["change"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Dynamic update operations sent
///
/// Labels:
/// - `action`: `add` or `delete`
pub static UPDATE_OPERATIONS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_update_operations_total"),
        "Total number of dynamic update operations sent by action",
    );
    let counter = CounterVec::new(opts, &["action"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of applies in seconds
///
/// Labels:
/// - `strategy`: `dynamic` or `zone`
pub static APPLY_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_apply_duration_seconds"),
        "Duration of applies in seconds by strategy",
    )
    .buckets(vec![0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]);
    let histogram = HistogramVec::new(opts, &["strategy"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

/// Errors by reason code
///
/// Labels:
/// - `reason`: Stable reason code, e.g. `ZoneTransferFailed`
pub static ERRORS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_errors_total"),
        "Total number of errors by reason",
    );
    let counter = CounterVec::new(opts, &["reason"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Helper Functions
// ============================================================================

/// Record a computed plan with `changes` change entries.
pub fn record_plan(zone: &str, changes: usize) {
    let result = if changes == 0 { "unchanged" } else { "changes" };
    PLANS_TOTAL.with_label_values(&[zone, result]).inc();
}

/// Record the per-kind change counts of a plan.
pub fn record_changes(added: usize, removed: usize, ttl_changed: usize) {
    for (change, count) in [
        ("added", added),
        ("removed", removed),
        ("ttl_changed", ttl_changed),
    ] {
        #[allow(clippy::cast_precision_loss)]
        RECORD_CHANGES_TOTAL
            .with_label_values(&[change])
            .inc_by(count as f64);
    }
}

/// Record the outcome of an apply.
pub fn record_apply(strategy: &str, outcome: &str, duration: Duration) {
    APPLIES_TOTAL.with_label_values(&[strategy, outcome]).inc();
    APPLY_DURATION_SECONDS
        .with_label_values(&[strategy])
        .observe(duration.as_secs_f64());
}

/// Record one dynamic update operation sent.
pub fn record_update_operation(action: &str) {
    UPDATE_OPERATIONS_TOTAL.with_label_values(&[action]).inc();
}

/// Record an error by reason code.
pub fn record_error(reason: &str) {
    ERRORS_TOTAL.with_label_values(&[reason]).inc();
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}
