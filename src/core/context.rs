//! Run-time state for one orchestrator invocation.

use std::collections::BTreeMap;

use crate::core::args::ParsedArgs;
use crate::io::config::OrchestratorConfig;

/// Environment variable routing execution through the indirection layer.
pub const VIA_VAR: &str = "DEVTASK_VIA";
/// Minimum total-coverage gate override.
pub const MIN_COVERAGE_VAR: &str = "DEVTASK_MIN_COVERAGE";
/// Minimum diff-coverage gate override.
pub const MIN_DIFF_COVERAGE_VAR: &str = "DEVTASK_MIN_DIFF_COVERAGE";
/// Baseline ref for diff-style coverage reports.
pub const DIFF_AGAINST_VAR: &str = "DEVTASK_DIFF_AGAINST";
/// Color-output toggle for the installer.
pub const COLOR_VAR: &str = "DEVTASK_COLOR";

/// Everything a task builder needs to construct its step sequence.
///
/// An explicit value, created per invocation and destroyed at its end. The
/// environment snapshot is copied once here; steps layer their own overrides
/// on top at spawn time without mutating it.
#[derive(Debug, Clone)]
pub struct InvocationContext<'a> {
    pub task: String,
    pub args: ParsedArgs,
    pub env: BTreeMap<String, String>,
    pub config: &'a OrchestratorConfig,
}

impl<'a> InvocationContext<'a> {
    pub fn new(
        task: impl Into<String>,
        args: ParsedArgs,
        env: BTreeMap<String, String>,
        config: &'a OrchestratorConfig,
    ) -> Self {
        Self {
            task: task.into(),
            args,
            env,
            config,
        }
    }

    fn env_is_true(&self, key: &str) -> bool {
        self.env.get(key).is_some_and(|v| v == "true" || v == "1")
    }

    /// Route through the indirection layer: `via` token or `DEVTASK_VIA`.
    pub fn via_indirection(&self) -> bool {
        self.args.via || self.env_is_true(VIA_VAR)
    }

    /// Whether the installer should emit colored output.
    pub fn color(&self) -> bool {
        self.env_is_true(COLOR_VAR)
    }

    /// Total-coverage gate: env override wins over the configured default.
    pub fn min_coverage(&self) -> u32 {
        self.env_u32(MIN_COVERAGE_VAR, self.config.test.min_coverage)
    }

    /// Diff-coverage gate: env override wins over the configured default.
    pub fn min_diff_coverage(&self) -> u32 {
        self.env_u32(MIN_DIFF_COVERAGE_VAR, self.config.coverage.min_diff_coverage)
    }

    /// Comparison baseline for diff coverage.
    pub fn diff_against(&self) -> String {
        self.env
            .get(DIFF_AGAINST_VAR)
            .cloned()
            .unwrap_or_else(|| self.config.coverage.diff_against.clone())
    }

    fn env_u32(&self, key: &str, default: u32) -> u32 {
        self.env
            .get(key)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(default)
    }
}
