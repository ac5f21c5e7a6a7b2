//! Error taxonomy for the gate engine.
//!
//! Only conditions that must abort a run before any suite executes are
//! errors. Suite failures, missing executables and performance regressions
//! are folded into [`crate::RunState`] instead.

use std::path::PathBuf;

/// Fatal gate errors.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("malformed baseline file {path}: {reason}")]
    MalformedBaseline { path: PathBuf, reason: String },

    #[error("failed to read baseline file {path}: {source}")]
    BaselineIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid suite descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("invalid metric pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for gate operations.
pub type Result<T> = std::result::Result<T, GateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_baseline_names_the_file() {
        let err = GateError::MalformedBaseline {
            path: PathBuf::from("tests/data/performance_baseline.json"),
            reason: "expected an object".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("performance_baseline.json"));
        assert!(msg.contains("expected an object"));
    }

    #[test]
    fn invalid_descriptor_display() {
        let err = GateError::InvalidDescriptor("max_retries must be at least 1".into());
        assert_eq!(
            err.to_string(),
            "invalid suite descriptor: max_retries must be at least 1"
        );
    }
}
