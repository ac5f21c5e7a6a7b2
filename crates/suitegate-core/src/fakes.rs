//! In-memory fakes for the invoker and sink seams (testing only)
//!
//! `ScriptedInvoker` replays canned results per executable path, and
//! `RecordingSink` captures the order of sink callbacks.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::aggregator::{OutcomeSink, SuiteOutcome};
use crate::invoker::SuiteInvoker;
use crate::suite::{InvocationResult, SuiteDescriptor};

// ---------------------------------------------------------------------------
// ScriptedInvoker
// ---------------------------------------------------------------------------

/// Invoker that returns scripted results in order for each path.
///
/// The last scripted result repeats once the script runs out. Paths with no
/// script behave like a missing executable.
#[derive(Debug, Default)]
pub struct ScriptedInvoker {
    scripts: Mutex<HashMap<PathBuf, VecDeque<InvocationResult>>>,
    calls: Mutex<Vec<PathBuf>>,
}

impl ScriptedInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a sequence of exit codes with empty output.
    pub fn with_exit_codes(self, path: impl Into<PathBuf>, codes: &[i32]) -> Self {
        let results = codes
            .iter()
            .map(|code| InvocationResult::completed(*code, String::new(), String::new(), 1))
            .collect();
        self.with_results(path, results)
    }

    /// Script one run with the given exit code and stdout.
    pub fn with_output(self, path: impl Into<PathBuf>, exit_code: i32, stdout: &str) -> Self {
        let result = InvocationResult::completed(exit_code, stdout.to_string(), String::new(), 1);
        self.with_results(path, vec![result])
    }

    pub fn with_results(self, path: impl Into<PathBuf>, results: Vec<InvocationResult>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(path.into(), results.into_iter().collect());
        self
    }

    /// Paths invoked so far, in call order.
    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of times `path` was invoked.
    pub fn call_count(&self, path: &Path) -> usize {
        self.calls.lock().unwrap().iter().filter(|p| *p == path).count()
    }
}

#[async_trait]
impl SuiteInvoker for ScriptedInvoker {
    async fn invoke(&self, executable: &Path) -> InvocationResult {
        self.calls.lock().unwrap().push(executable.to_path_buf());

        let mut scripts = self.scripts.lock().unwrap();
        let Some(queue) = scripts.get_mut(executable) else {
            return InvocationResult::not_found(executable, 0);
        };
        if queue.len() > 1 {
            if let Some(result) = queue.pop_front() {
                return result;
            }
        }
        queue
            .front()
            .cloned()
            .unwrap_or_else(|| InvocationResult::not_found(executable, 0))
    }
}

// ---------------------------------------------------------------------------
// RecordingSink
// ---------------------------------------------------------------------------

/// Sink event captured by [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Started(String),
    Finished(SuiteOutcome),
}

/// Sink that records every callback.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<SinkEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finished outcomes in order.
    pub fn finished(&self) -> Vec<&SuiteOutcome> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Finished(o) => Some(o),
                SinkEvent::Started(_) => None,
            })
            .collect()
    }
}

impl OutcomeSink for RecordingSink {
    fn suite_started(&mut self, descriptor: &SuiteDescriptor) {
        self.events.push(SinkEvent::Started(descriptor.name.clone()));
    }

    fn suite_finished(&mut self, outcome: &SuiteOutcome) {
        self.events.push(SinkEvent::Finished(outcome.clone()));
    }
}
