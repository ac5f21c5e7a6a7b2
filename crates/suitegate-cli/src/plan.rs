//! Suite plans: the built-in sequence and JSON plan files.
//!
//! Plan entries name executables relative to `<build-dir>/tests/`; they are
//! resolved into [`SuiteDescriptor`]s before the run starts.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use suitegate_core::{GateError, SuiteDescriptor};

/// One suite as written in a plan file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PlanEntry {
    pub name: String,

    /// Executable name relative to `<build-dir>/tests/`.
    pub executable: String,

    #[serde(default = "default_blocking")]
    pub blocking: bool,

    #[serde(default)]
    pub check_performance: bool,

    /// Total attempts allowed.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_blocking() -> bool {
    true
}

fn default_max_retries() -> u32 {
    1
}

impl PlanEntry {
    fn new(name: &str, executable: &str) -> Self {
        Self {
            name: name.to_string(),
            executable: executable.to_string(),
            blocking: true,
            check_performance: false,
            max_retries: 1,
        }
    }

    /// Resolve against the build directory and validate the result.
    ///
    /// The executable name is checked before joining; an empty name would
    /// otherwise resolve to the `tests/` directory itself.
    pub fn resolve(&self, build_dir: &Path) -> suitegate_core::Result<SuiteDescriptor> {
        if self.executable.trim().is_empty() {
            return Err(GateError::InvalidDescriptor(format!(
                "suite '{}' has an empty executable path",
                self.name
            )));
        }
        let descriptor = SuiteDescriptor {
            name: self.name.clone(),
            executable: build_dir.join("tests").join(&self.executable),
            blocking: self.blocking,
            check_performance: self.check_performance,
            max_retries: self.max_retries,
        };
        descriptor.validate()?;
        Ok(descriptor)
    }
}

/// The username-hash-migration merge gate.
pub fn builtin_plan() -> Vec<PlanEntry> {
    vec![
        // Priority 1: core logic
        PlanEntry::new("P1: Core Logic", "username_hash_migration_test"),
        // Priority 2: advanced scenarios
        PlanEntry::new(
            "P2: Advanced Scenarios",
            "username_hash_migration_priority2_test",
        ),
        // Priority 3: performance and edge cases, reported but not gating
        PlanEntry {
            blocking: false,
            check_performance: true,
            ..PlanEntry::new(
                "P3: Performance & Edge",
                "username_hash_migration_priority3_test",
            )
        },
        // Timing-sensitive; gates only after three straight failures
        PlanEntry {
            max_retries: 3,
            ..PlanEntry::new("P3: Concurrency", "username_hash_migration_concurrency_test")
        },
    ]
}

/// Read a JSON plan file.
pub fn load_plan(path: &Path) -> Result<Vec<PlanEntry>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read suite plan {}", path.display()))?;
    let entries: Vec<PlanEntry> = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse suite plan {}", path.display()))?;
    if entries.is_empty() {
        anyhow::bail!("Suite plan {} contains no suites", path.display());
    }
    Ok(entries)
}

/// Resolve and validate every entry.
pub fn resolve_plan(entries: &[PlanEntry], build_dir: &Path) -> Result<Vec<SuiteDescriptor>> {
    entries
        .iter()
        .map(|entry| -> Result<SuiteDescriptor> { Ok(entry.resolve(build_dir)?) })
        .collect()
}
