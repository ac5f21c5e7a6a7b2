//! Run aggregation and final verdict.
//!
//! The [`Aggregator`] executes suites strictly in order and folds each
//! outcome into a [`RunState`] of two independent flags:
//!
//! - a failing **blocking** suite sets `blocking_failure_occurred`;
//! - a failing **non-blocking** suite, or any metric over its limit, sets
//!   `non_blocking_failure_occurred`.
//!
//! Flags only ever go from false to true. The final [`Verdict`] is FAILURE
//! if any blocking suite failed, else UNSTABLE if anything non-blocking
//! went wrong, else SUCCESS. UNSTABLE exits 0.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use crate::baseline::{BaselineConfig, BaselineLoad};
use crate::error::Result;
use crate::invoker::SuiteInvoker;
use crate::metrics::MetricExtractor;
use crate::obs;
use crate::regression::{self, RegressionVerdict};
use crate::retry::{run_with_retry, AttemptRecord, AttemptState, RetryOutcome};
use crate::suite::{plan_digest, InvocationResult, SuiteDescriptor};

/// Two-flag failure state of a run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunState {
    pub blocking_failure_occurred: bool,
    pub non_blocking_failure_occurred: bool,
}

impl RunState {
    /// Fold the final outcome of one suite.
    pub fn record_suite(&mut self, blocking: bool, passed: bool) {
        if passed {
            return;
        }
        if blocking {
            self.blocking_failure_occurred = true;
        } else {
            self.non_blocking_failure_occurred = true;
        }
    }

    /// Fold one regression verdict. Regressions never block.
    pub fn record_regression(&mut self, verdict: &RegressionVerdict) {
        if !verdict.passed {
            self.non_blocking_failure_occurred = true;
        }
    }

    pub fn verdict(&self) -> Verdict {
        if self.blocking_failure_occurred {
            Verdict::Failure
        } else if self.non_blocking_failure_occurred {
            Verdict::Unstable
        } else {
            Verdict::Success
        }
    }
}

/// Final classification of a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Success,
    Unstable,
    Failure,
}

impl Verdict {
    /// Process exit status for this verdict.
    pub fn exit_code(&self) -> i32 {
        match self {
            Verdict::Success | Verdict::Unstable => 0,
            Verdict::Failure => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Success => "SUCCESS",
            Verdict::Unstable => "UNSTABLE",
            Verdict::Failure => "FAILURE",
        }
    }
}

/// Final status of one suite.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SuiteStatus {
    Passed,
    Failed,
    /// The executable could not be located; counts as a failure.
    NotFound,
}

impl SuiteStatus {
    fn of(result: &InvocationResult) -> Self {
        if result.passed() {
            SuiteStatus::Passed
        } else if result.is_not_found() {
            SuiteStatus::NotFound
        } else {
            SuiteStatus::Failed
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SuiteStatus::Passed => "passed",
            SuiteStatus::Failed => "failed",
            SuiteStatus::NotFound => "not_found",
        }
    }
}

/// Structured record of one suite's run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuiteOutcome {
    pub name: String,
    pub blocking: bool,
    pub status: SuiteStatus,
    /// Attempts made.
    pub attempts: u32,
    /// Attempts allowed.
    pub max_retries: u32,
    /// Result of the passing attempt, or the last failing one.
    pub invocation: InvocationResult,
    pub attempt_history: Vec<AttemptRecord>,
    /// Empty unless the suite passed with performance checks enabled.
    pub regressions: Vec<RegressionVerdict>,
}

impl SuiteOutcome {
    pub fn passed(&self) -> bool {
        self.status == SuiteStatus::Passed
    }

    /// Whether any metric of this suite exceeded its limit.
    pub fn has_regression(&self) -> bool {
        self.regressions.iter().any(|v| !v.passed)
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    pub run_id: String,
    pub plan_digest: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub baseline_missing: bool,
    pub state: RunState,
    pub verdict: Verdict,
    /// In execution order.
    pub outcomes: Vec<SuiteOutcome>,
}

impl RunSummary {
    pub fn exit_code(&self) -> i32 {
        self.verdict.exit_code()
    }

    pub fn passed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.passed()).count()
    }

    pub fn regression_count(&self) -> usize {
        self.outcomes
            .iter()
            .flat_map(|o| &o.regressions)
            .filter(|v| !v.passed)
            .count()
    }
}

/// Receives suite outcomes as they happen, before the next suite starts.
pub trait OutcomeSink: Send {
    fn suite_started(&mut self, _descriptor: &SuiteDescriptor) {}
    fn suite_finished(&mut self, _outcome: &SuiteOutcome) {}
}

/// Sink that discards everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl OutcomeSink for NullSink {}

/// Sequential suite runner.
pub struct Aggregator {
    invoker: Arc<dyn SuiteInvoker>,
    baseline: BaselineConfig,
    baseline_missing: bool,
    extractor: MetricExtractor,
}

impl Aggregator {
    pub fn new(invoker: Arc<dyn SuiteInvoker>, baseline: BaselineConfig) -> Result<Self> {
        Ok(Self {
            invoker,
            baseline,
            baseline_missing: false,
            extractor: MetricExtractor::new()?,
        })
    }

    /// Build from a baseline load, remembering whether the file was absent.
    pub fn from_load(invoker: Arc<dyn SuiteInvoker>, load: BaselineLoad) -> Result<Self> {
        let missing = load.is_missing();
        let mut aggregator = Self::new(invoker, load.config)?;
        aggregator.baseline_missing = missing;
        Ok(aggregator)
    }

    pub fn baseline(&self) -> &BaselineConfig {
        &self.baseline
    }

    /// Run every descriptor in order and derive the verdict.
    ///
    /// Descriptors are validated up front; an invalid one aborts before any
    /// suite executes. After that, no suite outcome stops the run.
    pub async fn run(
        &self,
        descriptors: &[SuiteDescriptor],
        sink: &mut dyn OutcomeSink,
    ) -> Result<RunSummary> {
        for descriptor in descriptors {
            descriptor.validate()?;
        }

        let run_id = Uuid::new_v4().to_string();
        let digest = plan_digest(descriptors);
        let started_at = Utc::now();
        let start = Instant::now();

        let summary = async {
            obs::emit_run_started(&run_id, descriptors.len(), &digest);

            let mut state = RunState::default();
            let mut outcomes = Vec::with_capacity(descriptors.len());

            for descriptor in descriptors {
                sink.suite_started(descriptor);
                let outcome = self.run_suite(descriptor, &mut state).await;
                sink.suite_finished(&outcome);
                outcomes.push(outcome);
            }

            let verdict = state.verdict();
            let duration_ms = start.elapsed().as_millis() as u64;
            obs::emit_run_finished(
                &run_id,
                verdict.as_str(),
                state.blocking_failure_occurred,
                state.non_blocking_failure_occurred,
                duration_ms,
            );

            RunSummary {
                run_id: run_id.clone(),
                plan_digest: digest.clone(),
                started_at,
                duration_ms,
                baseline_missing: self.baseline_missing,
                state,
                verdict,
                outcomes,
            }
        }
        .instrument(obs::run_span(&run_id))
        .await;

        Ok(summary)
    }

    async fn run_suite(&self, descriptor: &SuiteDescriptor, state: &mut RunState) -> SuiteOutcome {
        obs::emit_suite_started(&descriptor.name, descriptor.blocking, descriptor.max_retries);

        let retry = if descriptor.is_retried() {
            run_with_retry(descriptor, self.invoker.as_ref()).await
        } else {
            let result = self.invoker.invoke(&descriptor.executable).await;
            single_attempt(result)
        };

        let status = if retry.succeeded() {
            SuiteStatus::Passed
        } else {
            SuiteStatus::of(&retry.result)
        };
        let passed = status == SuiteStatus::Passed;
        state.record_suite(descriptor.blocking, passed);

        obs::emit_suite_finished(
            &descriptor.name,
            status.as_str(),
            retry.attempts,
            retry.result.exit_code,
            retry.result.duration_ms,
        );

        // Only passing runs are analyzed.
        let regressions = if descriptor.check_performance && passed {
            self.analyze_performance(&descriptor.name, &retry.result.stdout, state)
        } else {
            Vec::new()
        };

        SuiteOutcome {
            name: descriptor.name.clone(),
            blocking: descriptor.blocking,
            status,
            attempts: retry.attempts,
            max_retries: descriptor.max_retries,
            invocation: retry.result,
            attempt_history: retry.history,
            regressions,
        }
    }

    fn analyze_performance(
        &self,
        suite: &str,
        stdout: &str,
        state: &mut RunState,
    ) -> Vec<RegressionVerdict> {
        self.extractor
            .extract(stdout)
            .iter()
            .map(|sample| {
                let verdict = regression::evaluate(sample, &self.baseline);
                obs::emit_metric_evaluated(
                    suite,
                    verdict.metric_key.as_str(),
                    verdict.value,
                    verdict.limit,
                    verdict.passed,
                );
                state.record_regression(&verdict);
                verdict
            })
            .collect()
    }
}

fn single_attempt(result: InvocationResult) -> RetryOutcome {
    let state = if result.passed() {
        AttemptState::Succeeded
    } else {
        AttemptState::ExhaustedFailing
    };
    RetryOutcome {
        history: vec![AttemptRecord {
            attempt: 1,
            exit_code: result.exit_code,
            duration_ms: result.duration_ms,
        }],
        result,
        attempts: 1,
        state,
    }
}
