//! Suite descriptors and invocation results.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

use crate::error::{GateError, Result};

/// Exit code reported when the executable cannot be located.
pub const EXIT_NOT_FOUND: i32 = 127;

/// Exit code reported when the executable exists but cannot be launched.
pub const EXIT_LAUNCH_FAILED: i32 = 126;

/// Exit code reported when the child terminated without one (e.g. by a signal).
pub const EXIT_NO_CODE: i32 = -1;

/// One unit of work in a gate run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuiteDescriptor {
    /// Human-readable suite name.
    pub name: String,

    /// Resolved path of the test executable.
    pub executable: PathBuf,

    /// Whether a failure of this suite fails the whole run.
    pub blocking: bool,

    /// Whether captured stdout is scanned for performance metrics.
    pub check_performance: bool,

    /// Total number of attempts allowed (at least 1).
    pub max_retries: u32,
}

impl SuiteDescriptor {
    /// A blocking, single-attempt suite without performance checks.
    pub fn new(name: impl Into<String>, executable: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            executable: executable.into(),
            blocking: true,
            check_performance: false,
            max_retries: 1,
        }
    }

    /// Mark this suite as non-blocking.
    pub fn non_blocking(mut self) -> Self {
        self.blocking = false;
        self
    }

    /// Enable performance metric checks.
    pub fn with_performance_check(mut self) -> Self {
        self.check_performance = true;
        self
    }

    /// Allow up to `max_retries` attempts.
    pub fn with_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Whether this suite goes through the retry controller.
    pub fn is_retried(&self) -> bool {
        self.max_retries > 1
    }

    /// Reject descriptors the engine cannot execute.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(GateError::InvalidDescriptor(
                "suite name must not be empty".to_string(),
            ));
        }
        if self.executable.as_os_str().is_empty() {
            return Err(GateError::InvalidDescriptor(format!(
                "suite '{}' has an empty executable path",
                self.name
            )));
        }
        if self.max_retries == 0 {
            return Err(GateError::InvalidDescriptor(format!(
                "suite '{}': max_retries must be at least 1",
                self.name
            )));
        }
        Ok(())
    }
}

/// Why an executable produced no real exit status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InvocationFailure {
    /// The binary could not be located.
    ExecutableNotFound { path: PathBuf },

    /// The binary exists but spawning it failed.
    LaunchFailed { path: PathBuf, reason: String },
}

/// Result of running one executable to completion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvocationResult {
    /// Exit code (0 = success).
    pub exit_code: i32,

    /// Captured stdout.
    pub stdout: String,

    /// Captured stderr.
    pub stderr: String,

    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,

    /// Set when the process never ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<InvocationFailure>,
}

impl InvocationResult {
    /// A completed process run.
    pub fn completed(exit_code: i32, stdout: String, stderr: String, duration_ms: u64) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            duration_ms,
            failure: None,
        }
    }

    /// The ExecutableNotFound sentinel.
    pub fn not_found(path: impl Into<PathBuf>, duration_ms: u64) -> Self {
        Self {
            exit_code: EXIT_NOT_FOUND,
            stdout: String::new(),
            stderr: String::new(),
            duration_ms,
            failure: Some(InvocationFailure::ExecutableNotFound { path: path.into() }),
        }
    }

    /// A spawn failure other than not-found.
    pub fn launch_failed(path: impl Into<PathBuf>, reason: String, duration_ms: u64) -> Self {
        Self {
            exit_code: EXIT_LAUNCH_FAILED,
            stdout: String::new(),
            stderr: String::new(),
            duration_ms,
            failure: Some(InvocationFailure::LaunchFailed {
                path: path.into(),
                reason,
            }),
        }
    }

    /// Whether this invocation passed (exit code 0).
    pub fn passed(&self) -> bool {
        self.failure.is_none() && self.exit_code == 0
    }

    /// Whether the executable could not be located.
    pub fn is_not_found(&self) -> bool {
        matches!(self.failure, Some(InvocationFailure::ExecutableNotFound { .. }))
    }
}

/// Deterministic digest of the ordered suite names in a plan.
pub fn plan_digest(descriptors: &[SuiteDescriptor]) -> String {
    let mut hasher = Sha256::new();
    for descriptor in descriptors {
        hasher.update(descriptor.name.as_bytes());
        hasher.update(b"\0");
    }
    hex::encode(hasher.finalize())
}
