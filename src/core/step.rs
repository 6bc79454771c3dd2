//! Value types describing one external command invocation.

use std::collections::BTreeMap;
use std::path::PathBuf;

/// What a step's failure does to the rest of the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Failure halts the invocation; later steps are skipped.
    Fatal,
    /// Failure is recorded and later steps still run. The invocation is
    /// still reported failed overall.
    Accumulate,
}

/// Redirect a step's stdout into a file instead of the inherited terminal.
///
/// `transform` rewrites the captured text before it is written (e.g. pinning
/// a dependency listing into requirements form). Stderr stays inherited.
#[derive(Debug, Clone)]
pub struct Capture {
    pub path: PathBuf,
    pub transform: Option<fn(&str) -> String>,
}

/// One external command to execute.
///
/// Constructed by a task builder when the task is invoked with concrete
/// arguments; discarded after execution. Environment overrides are merged on
/// top of the invocation's environment snapshot at spawn time.
#[derive(Debug, Clone)]
pub struct Step {
    /// Stable identifier, unique within the invocation. Fan-out steps embed
    /// their parameter value (e.g. `test-docs:linkcheck`).
    pub id: String,
    pub program: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub cwd: Option<PathBuf>,
    pub policy: FailurePolicy,
    pub capture: Option<Capture>,
}

impl Step {
    /// A fatal step running `command[0]` with `command[1..]` prepended to
    /// `args`. Config validation rejects empty command arrays before any
    /// builder runs; an empty slice here surfaces as a launch error.
    pub fn new(id: impl Into<String>, command: &[String], args: &[String]) -> Self {
        let mut parts = command.iter().cloned();
        let program = parts.next().unwrap_or_default();
        let mut all_args: Vec<String> = parts.collect();
        all_args.extend(args.iter().cloned());
        Self {
            id: id.into(),
            program,
            args: all_args,
            env: BTreeMap::new(),
            cwd: None,
            policy: FailurePolicy::Fatal,
            capture: None,
        }
    }

    pub fn accumulate(mut self) -> Self {
        self.policy = FailurePolicy::Accumulate;
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn capture(mut self, capture: Capture) -> Self {
        self.capture = Some(capture);
        self
    }
}
