//! Structured observability hooks for gate run lifecycle events.
//!
//! Every event carries an `event` field (`suite.started`, `metric.evaluated`,
//! ...) so log pipelines can filter on it. Verbosity follows `RUST_LOG`; see
//! [`crate::telemetry::init_tracing`].

use std::path::Path;

use tracing::{info, warn};

/// Span tagging every event of one run with its `run_id`.
///
/// Attach it with `tracing::Instrument` rather than entering it, since the
/// run awaits child processes.
pub fn run_span(run_id: &str) -> tracing::Span {
    tracing::info_span!("suitegate.run", run_id = %run_id)
}

pub fn emit_run_started(run_id: &str, suite_count: usize, plan_digest: &str) {
    info!(
        event = "run.started",
        run_id = %run_id,
        suite_count = suite_count,
        plan_digest = %plan_digest,
    );
}

pub fn emit_suite_started(name: &str, blocking: bool, max_retries: u32) {
    info!(
        event = "suite.started",
        suite = %name,
        blocking = blocking,
        max_retries = max_retries,
    );
}

/// A non-final attempt failed; another will follow.
pub fn emit_attempt_failed(name: &str, attempt: u32, max_retries: u32, exit_code: i32) {
    warn!(
        event = "suite.attempt_failed",
        suite = %name,
        attempt = attempt,
        max_retries = max_retries,
        exit_code = exit_code,
    );
}

pub fn emit_suite_finished(name: &str, status: &str, attempts: u32, exit_code: i32, duration_ms: u64) {
    info!(
        event = "suite.finished",
        suite = %name,
        status = %status,
        attempts = attempts,
        exit_code = exit_code,
        duration_ms = duration_ms,
    );
}

pub fn emit_metric_evaluated(suite: &str, metric: &str, value: u64, limit: f64, passed: bool) {
    if passed {
        info!(event = "metric.evaluated", suite = %suite, metric = %metric, value = value, limit = limit, passed = passed);
    } else {
        warn!(event = "metric.evaluated", suite = %suite, metric = %metric, value = value, limit = limit, passed = passed);
    }
}

pub fn emit_baseline_missing(path: &Path) {
    warn!(event = "baseline.missing", path = %path.display());
}

pub fn emit_run_finished(
    run_id: &str,
    verdict: &str,
    blocking_failure: bool,
    non_blocking_failure: bool,
    duration_ms: u64,
) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        verdict = %verdict,
        blocking_failure = blocking_failure,
        non_blocking_failure = non_blocking_failure,
        duration_ms = duration_ms,
    );
}
