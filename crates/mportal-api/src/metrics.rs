//! Observability metrics exposed via Prometheus using the `metrics` crate.
//!
//! ## Metric Naming Conventions
//!
//! All metrics follow the pattern: `mportal_{subsystem}_{name}_{unit}`
//!
//! - Counters: `_total` suffix
//! - Histograms: `_seconds` suffix
//!
//! Without an installed recorder every call here is a no-op, so handlers
//! and tests can record unconditionally.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

// HTTP metrics
const HTTP_REQUESTS_TOTAL: &str = "mportal_http_requests_total";
const HTTP_REQUEST_LATENCY: &str = "mportal_http_request_duration_seconds";

// StoreHub sync metrics
const SYNC_ATTEMPTS_TOTAL: &str = "mportal_storehub_sync_attempts_total";
const SYNC_LATENCY: &str = "mportal_storehub_sync_duration_seconds";
const CALL_LOG_FAILURES_TOTAL: &str = "mportal_call_log_write_failures_total";

// Registration metrics
const REGISTRATIONS_TOTAL: &str = "mportal_registrations_total";

// Batch recovery metrics
const BATCH_RUNS_TOTAL: &str = "mportal_batch_recovery_runs_total";
const BATCH_SELECTED_TOTAL: &str = "mportal_batch_recovery_selected_total";

/// Histogram buckets for HTTP and sync latency, in seconds.
pub const LATENCY_BUCKETS: [f64; 11] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Install the global Prometheus recorder and return its render handle.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new()
        .set_buckets(&LATENCY_BUCKETS)?
        .install_recorder()
}

/// Records one HTTP request.
#[inline]
pub fn record_http_request(method: &str, path: &str, status: u16, latency_secs: f64) {
    counter!(HTTP_REQUESTS_TOTAL,
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(HTTP_REQUEST_LATENCY,
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(latency_secs);
}

/// Records one outbound StoreHub attempt.
#[inline]
pub fn record_sync_attempt(request_type: &'static str, success: bool, latency_secs: f64) {
    let outcome = if success { "success" } else { "failure" };
    counter!(SYNC_ATTEMPTS_TOTAL, "request_type" => request_type, "outcome" => outcome)
        .increment(1);
    histogram!(SYNC_LATENCY, "request_type" => request_type).record(latency_secs);
}

/// Records a call-log entry that could not be written.
#[inline]
pub fn record_call_log_failure() {
    counter!(CALL_LOG_FAILURES_TOTAL).increment(1);
}

/// Records a registration outcome: `created`, `duplicate`, or `invalid`.
#[inline]
pub fn record_registration(outcome: &'static str) {
    counter!(REGISTRATIONS_TOTAL, "outcome" => outcome).increment(1);
}

/// Records one batch recovery run and how many submissions it picked up.
#[inline]
pub fn record_batch_run(selected: usize) {
    counter!(BATCH_RUNS_TOTAL).increment(1);
    counter!(BATCH_SELECTED_TOTAL).increment(selected as u64);
}
