//! Performance metric extraction from captured suite output.
//!
//! Each recognized output shape is a named rule in [`METRIC_RULES`]. There is
//! no free-form parsing: text that matches none of the rules yields nothing.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;

/// The closed set of metrics the gate knows about.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MetricKey {
    #[serde(rename = "migration.batch_20_users")]
    MigrationBatch20Users,
    #[serde(rename = "hash.sha3_256")]
    HashSha3_256,
    #[serde(rename = "hash.pbkdf2")]
    HashPbkdf2,
}

impl MetricKey {
    /// Dotted metric key.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKey::MigrationBatch20Users => "migration.batch_20_users",
            MetricKey::HashSha3_256 => "hash.sha3_256",
            MetricKey::HashPbkdf2 => "hash.pbkdf2",
        }
    }

    /// The rule that produces this metric.
    pub fn rule(&self) -> &'static MetricRule {
        match self {
            MetricKey::MigrationBatch20Users => &METRIC_RULES[0],
            MetricKey::HashSha3_256 => &METRIC_RULES[1],
            MetricKey::HashPbkdf2 => &METRIC_RULES[2],
        }
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recognized output shape and how its value is judged.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRule {
    pub key: MetricKey,

    /// Display label for reports.
    pub label: &'static str,

    /// Pattern with exactly one capture group holding the milliseconds.
    pub pattern: &'static str,

    /// Baseline group holding the threshold.
    pub baseline_group: &'static str,

    /// Baseline key holding the threshold.
    pub baseline_key: &'static str,

    /// Threshold used when the baseline has no entry.
    pub default_ms: f64,

    /// Multiplier applied to the resolved threshold.
    pub relaxation: f64,
}

/// Fixed rule table, evaluated in order.
pub static METRIC_RULES: [MetricRule; 3] = [
    MetricRule {
        key: MetricKey::MigrationBatch20Users,
        label: "Batch Migration (20 users)",
        pattern: r"Migration of 19 users took: (\d+)ms",
        baseline_group: "migration_performance",
        baseline_key: "batch_20_users_max_ms",
        default_ms: 30_000.0,
        relaxation: 1.0,
    },
    MetricRule {
        key: MetricKey::HashSha3_256,
        label: "SHA3-256 Speed",
        pattern: r"SHA3-256:\s+\d+\s+iterations in\s+(\d+)ms",
        baseline_group: "hash_computation",
        baseline_key: "sha3_256_max_ms",
        default_ms: 10.0,
        relaxation: 1.0,
    },
    // Limit is the stored threshold times 1.5.
    MetricRule {
        key: MetricKey::HashPbkdf2,
        label: "PBKDF2 Speed",
        pattern: r"PBKDF2:\s+\d+\s+iterations in\s+(\d+)ms",
        baseline_group: "hash_computation",
        baseline_key: "pbkdf2_max_ms",
        default_ms: 100.0,
        relaxation: 1.5,
    },
];

/// A single measurement scraped from output.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetricSample {
    pub metric_key: MetricKey,
    /// Milliseconds.
    pub value: u64,
}

/// Compiled form of [`METRIC_RULES`].
#[derive(Debug, Clone)]
pub struct MetricExtractor {
    compiled: Vec<(MetricKey, Regex)>,
}

impl MetricExtractor {
    pub fn new() -> Result<Self> {
        let compiled = METRIC_RULES
            .iter()
            .map(|rule| -> Result<(MetricKey, Regex)> {
                Ok((rule.key, Regex::new(rule.pattern)?))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { compiled })
    }

    /// Scan `stdout` and return one sample per rule that matched.
    pub fn extract(&self, stdout: &str) -> Vec<MetricSample> {
        self.compiled
            .iter()
            .filter_map(|(key, re)| {
                let caps = re.captures(stdout)?;
                let value = caps.get(1)?.as_str().parse::<u64>().ok()?;
                Some(MetricSample {
                    metric_key: *key,
                    value,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> Vec<MetricSample> {
        MetricExtractor::new().unwrap().extract(text)
    }

    #[test]
    fn rule_table_is_keyed_consistently() {
        for key in [
            MetricKey::MigrationBatch20Users,
            MetricKey::HashSha3_256,
            MetricKey::HashPbkdf2,
        ] {
            assert_eq!(key.rule().key, key);
        }
    }

    #[test]
    fn migration_requires_literal_19() {
        assert!(extract("Migration of 20 users took: 500ms").is_empty());
        assert!(extract("Migration of 119 users took: 500ms").is_empty());

        let samples = extract("Migration of 19 users took: 500ms");
        assert_eq!(
            samples,
            vec![MetricSample {
                metric_key: MetricKey::MigrationBatch20Users,
                value: 500
            }]
        );
    }

    #[test]
    fn hash_patterns_capture_duration_not_iterations() {
        let samples = extract("SHA3-256: 100 iterations in 12ms\nPBKDF2:   1000 iterations in  140ms\n");
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].metric_key, MetricKey::HashSha3_256);
        assert_eq!(samples[0].value, 12);
        assert_eq!(samples[1].metric_key, MetricKey::HashPbkdf2);
        assert_eq!(samples[1].value, 140);
    }

    #[test]
    fn first_match_wins() {
        let samples = extract("SHA3-256: 100 iterations in 4ms\nSHA3-256: 100 iterations in 99ms");
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value, 4);
    }

    #[test]
    fn unrelated_output_yields_nothing() {
        assert!(extract("[==========] 12 tests ran.\n[  PASSED  ] 12 tests.").is_empty());
        assert!(extract("").is_empty());
    }

    #[test]
    fn overflowing_capture_is_not_found() {
        let text = "SHA3-256: 1 iterations in 99999999999999999999999ms";
        assert!(extract(text).is_empty());
    }

    #[test]
    fn samples_embedded_in_noisy_output() {
        let text = "\
[ RUN      ] Perf.BatchMigration
Migration of 19 users took: 2150ms
[       OK ] Perf.BatchMigration (2150 ms)
[ RUN      ] Perf.Hashing
SHA3-256: 100 iterations in 3ms
[       OK ] Perf.Hashing (3 ms)";
        let keys: Vec<_> = extract(text).iter().map(|s| s.metric_key).collect();
        assert_eq!(
            keys,
            vec![MetricKey::MigrationBatch20Users, MetricKey::HashSha3_256]
        );
    }

    #[test]
    fn metric_key_serializes_dotted() {
        let json = serde_json::to_string(&MetricKey::HashPbkdf2).unwrap();
        assert_eq!(json, "\"hash.pbkdf2\"");
        assert_eq!(MetricKey::HashPbkdf2.to_string(), "hash.pbkdf2");
    }
}
