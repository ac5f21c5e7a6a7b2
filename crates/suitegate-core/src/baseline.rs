//! Performance baseline store.
//!
//! A baseline file is a JSON object of metric groups, each an object of
//! metric keys to non-negative millisecond thresholds:
//!
//! ```json
//! {
//!   "migration_performance": { "batch_20_users_max_ms": 30000 },
//!   "hash_computation": { "sha3_256_max_ms": 10, "pbkdf2_max_ms": 100 }
//! }
//! ```
//!
//! A missing file is tolerated (empty config plus a warning). A file that
//! exists but does not have this shape is fatal.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{GateError, Result};
use crate::obs;

/// Threshold configuration: group -> key -> milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BaselineConfig {
    groups: BTreeMap<String, BTreeMap<String, f64>>,
}

/// Non-fatal condition raised while loading a baseline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaselineWarning {
    /// No file at the given path; all lookups fall back to defaults.
    Missing { path: PathBuf },
}

/// Outcome of [`BaselineConfig::load`].
#[derive(Debug, Clone)]
pub struct BaselineLoad {
    pub config: BaselineConfig,
    pub warning: Option<BaselineWarning>,
}

impl BaselineLoad {
    /// Whether the baseline file was absent.
    pub fn is_missing(&self) -> bool {
        matches!(self.warning, Some(BaselineWarning::Missing { .. }))
    }
}

impl BaselineConfig {
    /// Empty configuration; every lookup returns its default.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load a baseline file from disk.
    pub fn load(path: &Path) -> Result<BaselineLoad> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                obs::emit_baseline_missing(path);
                return Ok(BaselineLoad {
                    config: Self::empty(),
                    warning: Some(BaselineWarning::Missing {
                        path: path.to_path_buf(),
                    }),
                });
            }
            Err(source) => {
                return Err(GateError::BaselineIo {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config = Self::from_json(&text).map_err(|reason| GateError::MalformedBaseline {
            path: path.to_path_buf(),
            reason,
        })?;

        Ok(BaselineLoad {
            config,
            warning: None,
        })
    }

    /// Parse and validate baseline JSON.
    pub fn from_json(text: &str) -> std::result::Result<Self, String> {
        let config: BaselineConfig = serde_json::from_str(text).map_err(|e| e.to_string())?;

        for (group, keys) in &config.groups {
            for (key, value) in keys {
                if !value.is_finite() || *value < 0.0 {
                    return Err(format!(
                        "threshold {}.{} must be a non-negative number, got {}",
                        group, key, value
                    ));
                }
            }
        }

        Ok(config)
    }

    /// Stored threshold at `(group, key)`, or `default` when absent.
    pub fn threshold(&self, group: &str, key: &str, default: f64) -> f64 {
        self.groups
            .get(group)
            .and_then(|keys| keys.get(key))
            .copied()
            .unwrap_or(default)
    }

    /// Insert or replace a threshold.
    pub fn with_threshold(mut self, group: &str, key: &str, value_ms: f64) -> Self {
        self.groups
            .entry(group.to_string())
            .or_default()
            .insert(key.to_string(), value_ms);
        self
    }

    /// Whether no thresholds are configured.
    pub fn is_empty(&self) -> bool {
        self.groups.values().all(|keys| keys.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn threshold_falls_back_to_default() {
        let config = BaselineConfig::empty();
        assert_eq!(config.threshold("hash_computation", "sha3_256_max_ms", 10.0), 10.0);
    }

    #[test]
    fn threshold_prefers_stored_value() {
        let config = BaselineConfig::empty().with_threshold("hash_computation", "pbkdf2_max_ms", 80.0);
        assert_eq!(config.threshold("hash_computation", "pbkdf2_max_ms", 100.0), 80.0);
        // Same key in a different group is not a hit
        assert_eq!(config.threshold("other", "pbkdf2_max_ms", 100.0), 100.0);
    }

    #[test]
    fn missing_file_yields_empty_config_with_warning() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("performance_baseline.json");

        let load = BaselineConfig::load(&path).expect("missing file is not fatal");
        assert!(load.is_missing());
        assert!(load.config.is_empty());
        assert_eq!(load.warning, Some(BaselineWarning::Missing { path }));
    }

    #[test]
    fn loads_nested_thresholds() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("baseline.json");
        let mut f = std::fs::File::create(&path).unwrap();
        write!(
            f,
            r#"{{"migration_performance": {{"batch_20_users_max_ms": 25000}},
                "hash_computation": {{"sha3_256_max_ms": 8, "pbkdf2_max_ms": 120.5}}}}"#
        )
        .unwrap();

        let load = BaselineConfig::load(&path).expect("load");
        assert!(load.warning.is_none());
        let config = load.config;
        assert_eq!(
            config.threshold("migration_performance", "batch_20_users_max_ms", 30000.0),
            25000.0
        );
        assert_eq!(config.threshold("hash_computation", "sha3_256_max_ms", 10.0), 8.0);
        assert_eq!(config.threshold("hash_computation", "pbkdf2_max_ms", 100.0), 120.5);
    }

    #[test]
    fn invalid_json_is_malformed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("baseline.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = BaselineConfig::load(&path).unwrap_err();
        assert!(matches!(err, GateError::MalformedBaseline { .. }));
    }

    #[test]
    fn unreadable_path_is_io_error_not_missing() {
        let dir = tempdir().unwrap();

        let err = BaselineConfig::load(dir.path()).unwrap_err();
        match err {
            GateError::BaselineIo { path, .. } => assert_eq!(path, dir.path()),
            other => panic!("expected BaselineIo, got {other:?}"),
        }
    }

    #[test]
    fn wrong_shape_is_malformed() {
        assert!(BaselineConfig::from_json(r#"[1, 2, 3]"#).is_err());
        assert!(BaselineConfig::from_json(r#"{"hash_computation": 10}"#).is_err());
        assert!(BaselineConfig::from_json(r#"{"hash_computation": {"sha3_256_max_ms": "fast"}}"#).is_err());
    }

    #[test]
    fn negative_threshold_is_malformed() {
        let err = BaselineConfig::from_json(r#"{"hash_computation": {"sha3_256_max_ms": -1}}"#)
            .unwrap_err();
        assert!(err.contains("hash_computation.sha3_256_max_ms"));
    }

    #[test]
    fn empty_object_is_valid() {
        let config = BaselineConfig::from_json("{}").expect("empty object");
        assert!(config.is_empty());
    }
}
