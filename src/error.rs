//! Error taxonomy for the orchestrator itself.
//!
//! External tools failing is not an error here: a non-zero exit from a
//! spawned command is recorded in its `OutcomeRecord` and aggregated. The
//! variants below cover programming and configuration faults only.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Requested task name has no registration. No step runs.
    #[error("unknown task `{0}` (run with --list to see registered tasks)")]
    UnknownTask(String),

    /// A task name was registered twice.
    #[error("task `{0}` is already registered")]
    DuplicateTask(String),

    /// The executable could not be found or started at all. Distinct from
    /// "ran and exited non-zero"; aborts the invocation regardless of the
    /// step's failure policy.
    #[error("failed to launch `{program}`")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    /// A required configuration value is absent or invalid. Raised before
    /// any step executes.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// I/O fault while supervising a step that already started (waiting on
    /// it, or persisting its captured output).
    #[error("step `{step}`: {context}")]
    StepIo {
        step: String,
        context: String,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
