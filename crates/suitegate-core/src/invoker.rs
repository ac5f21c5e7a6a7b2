//! Suite invocation.
//!
//! [`SuiteInvoker`] is the seam between the engine and real processes.
//! [`ProcessInvoker`] runs an executable to completion; tests substitute
//! [`crate::fakes::ScriptedInvoker`].

use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::suite::{InvocationResult, EXIT_NO_CODE};

/// Runs one suite executable and reports what happened.
///
/// Implementations never fail: a binary that cannot be launched is reported
/// through [`InvocationResult::failure`].
#[async_trait]
pub trait SuiteInvoker: Send + Sync {
    async fn invoke(&self, executable: &Path) -> InvocationResult;
}

/// Invoker backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessInvoker;

impl ProcessInvoker {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SuiteInvoker for ProcessInvoker {
    async fn invoke(&self, executable: &Path) -> InvocationResult {
        let start = Instant::now();

        let child = Command::new(executable)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(executable = %executable.display(), "executable not found");
                return InvocationResult::not_found(executable, elapsed_ms(start));
            }
            Err(e) => {
                debug!(executable = %executable.display(), error = %e, "spawn failed");
                return InvocationResult::launch_failed(executable, e.to_string(), elapsed_ms(start));
            }
        };

        // Waits for exit and for both pipes to drain.
        let output = match child.wait_with_output().await {
            Ok(output) => output,
            Err(e) => {
                return InvocationResult::launch_failed(executable, e.to_string(), elapsed_ms(start))
            }
        };

        let duration_ms = elapsed_ms(start);
        let exit_code = output.status.code().unwrap_or(EXIT_NO_CODE);
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        InvocationResult::completed(exit_code, stdout, stderr, duration_ms)
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
