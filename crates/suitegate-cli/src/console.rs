//! Console rendering of suite outcomes and the final banner.

use std::fmt::Write as _;

use suitegate_core::{
    InvocationFailure, OutcomeSink, RunSummary, SuiteDescriptor, SuiteOutcome, SuiteStatus, Verdict,
};

/// Prints each suite as it finishes.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl OutcomeSink for ConsoleSink {
    fn suite_started(&mut self, descriptor: &SuiteDescriptor) {
        println!("{}", header(&format!("Running Suite: {}", descriptor.name)));
    }

    fn suite_finished(&mut self, outcome: &SuiteOutcome) {
        print!("{}", render_outcome(outcome));
    }
}

fn header(title: &str) -> String {
    format!("=== {} ===", title)
}

fn indented(out: &mut String, text: &str) {
    for line in text.lines() {
        let _ = writeln!(out, "  {}", line);
    }
}

/// Render one finished suite.
pub fn render_outcome(outcome: &SuiteOutcome) -> String {
    let mut out = String::new();
    let result = &outcome.invocation;

    indented(&mut out, &result.stdout);

    if outcome.max_retries > 1 {
        for attempt in &outcome.attempt_history {
            let mark = if attempt.exit_code == 0 { "✓" } else { "⚠" };
            let _ = writeln!(
                out,
                "{} Attempt {}/{}: exit code {} ({}ms)",
                mark, attempt.attempt, outcome.max_retries, attempt.exit_code, attempt.duration_ms
            );
        }
    }

    match outcome.status {
        SuiteStatus::Passed => {
            let _ = writeln!(
                out,
                "✓ Suite {} PASSED in {:.2}s",
                outcome.name,
                result.duration_ms as f64 / 1000.0
            );
        }
        SuiteStatus::NotFound => {
            if let Some(InvocationFailure::ExecutableNotFound { path }) = &result.failure {
                let _ = writeln!(out, "✗ Executable not found: {}", path.display());
            }
        }
        SuiteStatus::Failed => {
            if let Some(InvocationFailure::LaunchFailed { path, reason }) = &result.failure {
                let _ = writeln!(out, "✗ Could not launch {}: {}", path.display(), reason);
            }
            indented(&mut out, &result.stderr);
            if outcome.attempts > 1 {
                let _ = writeln!(
                    out,
                    "✗ Suite {} FAILED after {} attempts (Exit Code: {})",
                    outcome.name, outcome.attempts, result.exit_code
                );
            } else {
                let _ = writeln!(
                    out,
                    "✗ Suite {} FAILED (Exit Code: {})",
                    outcome.name, result.exit_code
                );
            }
        }
    }

    if !outcome.passed() && !outcome.blocking {
        let _ = writeln!(out, "⚠ Non-blocking failure ignored for merge gate.");
    }

    if !outcome.regressions.is_empty() {
        let _ = writeln!(out, "{}", header("Performance Analysis"));
        for verdict in &outcome.regressions {
            if verdict.passed {
                let _ = writeln!(
                    out,
                    "✓ {}: {}ms <= {}ms",
                    verdict.label(),
                    verdict.value,
                    verdict.limit
                );
            } else {
                let _ = writeln!(
                    out,
                    "✗ {}: {}ms > {}ms (Regression!)",
                    verdict.label(),
                    verdict.value,
                    verdict.limit
                );
            }
        }
    }

    out
}

/// Render the end-of-run banner.
pub fn render_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", "=".repeat(40));
    let _ = writeln!(
        out,
        "Suites: {}/{} passed, {} regression(s), {}ms",
        summary.passed_count(),
        summary.outcomes.len(),
        summary.regression_count(),
        summary.duration_ms
    );
    let _ = writeln!(out, "Run ID: {}", summary.run_id);

    match summary.verdict {
        Verdict::Failure => {
            let _ = writeln!(out, "✗ BUILD FAILED: Blocking tests failed.");
        }
        Verdict::Unstable => {
            let _ = writeln!(
                out,
                "⚠ BUILD UNSTABLE: Non-blocking tests failed or performance regression."
            );
        }
        Verdict::Success => {
            let _ = writeln!(out, "✓ BUILD SUCCESS: All tests passed.");
        }
    }
    out
}
