//! Bounded retry for flaky suites.
//!
//! A suite is attempted up to `max_retries` times. The first passing attempt
//! ends the loop; only exhausting every attempt counts as a failure.

use serde::{Deserialize, Serialize};

use crate::invoker::SuiteInvoker;
use crate::obs;
use crate::suite::{InvocationResult, SuiteDescriptor};

/// Retry state machine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", content = "attempt", rename_all = "snake_case")]
pub enum AttemptState {
    /// About to run (or running) the given 1-based attempt.
    Attempting(u32),
    Succeeded,
    ExhaustedFailing,
}

impl AttemptState {
    /// Advance after an attempt finished with `exit_code`.
    pub fn next(self, exit_code: i32, max_retries: u32) -> AttemptState {
        match self {
            AttemptState::Attempting(_) if exit_code == 0 => AttemptState::Succeeded,
            AttemptState::Attempting(i) if i < max_retries => AttemptState::Attempting(i + 1),
            AttemptState::Attempting(_) => AttemptState::ExhaustedFailing,
            terminal => terminal,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, AttemptState::Attempting(_))
    }
}

/// Summary of one attempt, kept for reporting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttemptRecord {
    pub attempt: u32,
    pub exit_code: i32,
    pub duration_ms: u64,
}

/// Outcome of [`run_with_retry`].
#[derive(Debug, Clone)]
pub struct RetryOutcome {
    /// The passing attempt, or the last failing one.
    pub result: InvocationResult,
    /// Number of attempts made.
    pub attempts: u32,
    /// Terminal state: `Succeeded` or `ExhaustedFailing`.
    pub state: AttemptState,
    pub history: Vec<AttemptRecord>,
}

impl RetryOutcome {
    pub fn succeeded(&self) -> bool {
        self.state == AttemptState::Succeeded
    }
}

/// Invoke `descriptor` until it passes or its attempts run out.
pub async fn run_with_retry(
    descriptor: &SuiteDescriptor,
    invoker: &dyn SuiteInvoker,
) -> RetryOutcome {
    let max_retries = descriptor.max_retries.max(1);
    let mut attempt = 1;
    let mut history = Vec::new();

    loop {
        let result = invoker.invoke(&descriptor.executable).await;
        history.push(AttemptRecord {
            attempt,
            exit_code: result.exit_code,
            duration_ms: result.duration_ms,
        });

        let exit_code = if result.passed() { 0 } else { non_zero(result.exit_code) };
        match AttemptState::Attempting(attempt).next(exit_code, max_retries) {
            AttemptState::Attempting(next) => {
                obs::emit_attempt_failed(&descriptor.name, attempt, max_retries, result.exit_code);
                attempt = next;
            }
            state => {
                return RetryOutcome {
                    result,
                    attempts: attempt,
                    state,
                    history,
                }
            }
        }
    }
}

// A not-found sentinel must never read as success.
fn non_zero(exit_code: i32) -> i32 {
    if exit_code == 0 {
        1
    } else {
        exit_code
    }
}
