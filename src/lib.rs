//! Dev-automation task orchestrator.
//!
//! Resolves a requested task name to an ordered list of external command
//! invocations, applies per-step environment and argument configuration,
//! executes them sequentially as child processes, and aggregates their exit
//! statuses into one pass/fail outcome. The architecture enforces a strict
//! separation:
//!
//! - **[`core`]**: Pure, deterministic logic (argument partitioning, the
//!   task registry, outcome aggregation). No I/O, fully testable in
//!   isolation.
//! - **[`io`]**: Side-effecting operations (config loading, process
//!   spawning). Behind the [`io::process::StepRunner`] seam so tests can
//!   script outcomes without spawning.
//!
//! [`invoke`] coordinates core logic with I/O; [`tasks`] holds the built-in
//! task wiring configured through `devtask.toml`.

pub mod core;
pub mod error;
pub mod exit_codes;
pub mod invoke;
pub mod io;
pub mod logging;
pub mod tasks;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
