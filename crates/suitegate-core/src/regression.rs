//! Regression evaluation of metric samples against baselines.
//!
//! Verdicts are informational: a failing verdict marks the run unstable but
//! never blocks it. Timing on shared CI hosts is too noisy to gate on.

use serde::{Deserialize, Serialize};

use crate::baseline::BaselineConfig;
use crate::metrics::{MetricKey, MetricSample};

/// Classification of one metric sample.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegressionVerdict {
    pub metric_key: MetricKey,
    /// Observed milliseconds.
    pub value: u64,
    /// Effective limit after relaxation.
    pub limit: f64,
    pub passed: bool,
}

impl RegressionVerdict {
    /// Display label of the underlying rule.
    pub fn label(&self) -> &'static str {
        self.metric_key.rule().label
    }
}

/// Resolve the limit for `sample` and classify it.
pub fn evaluate(sample: &MetricSample, config: &BaselineConfig) -> RegressionVerdict {
    let limit = effective_limit(sample.metric_key, config);
    RegressionVerdict {
        metric_key: sample.metric_key,
        value: sample.value,
        limit,
        passed: (sample.value as f64) <= limit,
    }
}

/// Baseline threshold (or the rule default) times the rule's relaxation.
pub fn effective_limit(key: MetricKey, config: &BaselineConfig) -> f64 {
    let rule = key.rule();
    config.threshold(rule.baseline_group, rule.baseline_key, rule.default_ms) * rule.relaxation
}
