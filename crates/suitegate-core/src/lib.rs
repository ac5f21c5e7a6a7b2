//! Suitegate Core - test suite orchestration and merge gate
//!
//! Runs an ordered plan of independently built test executables and turns
//! their outcomes into one verdict:
//! - Invokes each suite, retrying flaky ones a bounded number of times
//! - Scrapes timing metrics from captured stdout and checks them against
//!   stored baselines
//! - Folds suite failures and regressions into SUCCESS / UNSTABLE / FAILURE

pub mod aggregator;
pub mod baseline;
pub mod error;
pub mod fakes;
pub mod invoker;
pub mod metrics;
pub mod obs;
pub mod regression;
pub mod retry;
pub mod suite;
pub mod telemetry;

// Re-export key types
pub use aggregator::{
    Aggregator, NullSink, OutcomeSink, RunState, RunSummary, SuiteOutcome, SuiteStatus, Verdict,
};
pub use baseline::{BaselineConfig, BaselineLoad, BaselineWarning};
pub use error::{GateError, Result};
pub use invoker::{ProcessInvoker, SuiteInvoker};
pub use metrics::{MetricExtractor, MetricKey, MetricRule, MetricSample, METRIC_RULES};
pub use regression::{evaluate, RegressionVerdict};
pub use retry::{run_with_retry, AttemptRecord, AttemptState, RetryOutcome};
pub use suite::{plan_digest, InvocationFailure, InvocationResult, SuiteDescriptor};
pub use telemetry::init_tracing;
