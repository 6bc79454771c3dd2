//! Per-step outcomes and their aggregation into one invocation result.

use std::path::PathBuf;

/// Result of one executed step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeRecord {
    /// Identifier of the step this outcome belongs to.
    pub step_id: String,
    /// Exit code of the spawned process; `None` when killed by a signal.
    pub exit_code: Option<i32>,
    /// Where captured stdout was written, if the step captured it.
    pub output_path: Option<PathBuf>,
}

impl OutcomeRecord {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Aggregated result of one invocation.
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub records: Vec<OutcomeRecord>,
    /// Step ids skipped because an earlier fatal step failed.
    pub skipped: Vec<String>,
}

impl Report {
    /// Overall success iff every executed step succeeded.
    pub fn success(&self) -> bool {
        self.records.iter().all(OutcomeRecord::success)
    }

    /// Step ids of every failed record, in execution order.
    pub fn failed_steps(&self) -> Vec<&str> {
        self.records
            .iter()
            .filter(|record| !record.success())
            .map(|record| record.step_id.as_str())
            .collect()
    }

    /// Process exit status for the CLI.
    ///
    /// A single failing step propagates its own exit code unchanged; several
    /// failures (or a signal death) collapse to the generic failure code.
    pub fn exit_status(&self) -> i32 {
        let failed: Vec<&OutcomeRecord> = self
            .records
            .iter()
            .filter(|record| !record.success())
            .collect();
        match failed.as_slice() {
            [] => crate::exit_codes::OK,
            [only] => only.exit_code.unwrap_or(crate::exit_codes::FAILED),
            _ => crate::exit_codes::FAILED,
        }
    }
}
