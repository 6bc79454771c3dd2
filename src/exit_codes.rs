//! Stable exit codes for the devtask CLI.

/// Every step of the invoked task succeeded.
pub const OK: i32 = 0;

/// At least one step ran and failed. When a single fatal step failed, its
/// own exit code is propagated instead of this generic value.
pub const FAILED: i32 = 1;

/// Orchestrator error: unknown task, bad configuration, or an executable
/// that could not be launched.
pub const INVALID: i32 = 2;
