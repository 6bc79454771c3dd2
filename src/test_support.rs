//! Scripted step runner and scratch-project helpers for tests.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;

use crate::core::outcome::OutcomeRecord;
use crate::core::step::Step;
use crate::error::{OrchestratorError, Result};
use crate::io::process::StepRunner;

/// A [`StepRunner`] that never spawns a process.
///
/// Records every step it is asked to run and returns scripted exit codes:
/// success unless `fail_step` was called for the id, and a launch fault for
/// ids given to `refuse_step`.
#[derive(Default)]
pub struct ScriptedRunner {
    failures: BTreeMap<String, i32>,
    refusals: Vec<String>,
    executed: RefCell<Vec<Step>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the step with `id` exit with `code`.
    pub fn fail_step(mut self, id: &str, code: i32) -> Self {
        self.failures.insert(id.to_string(), code);
        self
    }

    /// Make the step with `id` fail to launch entirely.
    pub fn refuse_step(mut self, id: &str) -> Self {
        self.refusals.push(id.to_string());
        self
    }

    /// Number of steps that were actually "spawned".
    pub fn spawn_count(&self) -> usize {
        self.executed.borrow().len()
    }

    /// Clones of the steps run so far, in execution order.
    pub fn executed(&self) -> Vec<Step> {
        self.executed.borrow().clone()
    }
}

impl StepRunner for ScriptedRunner {
    fn run(&self, step: &Step, _base_env: &BTreeMap<String, String>) -> Result<OutcomeRecord> {
        if self.refusals.iter().any(|id| id == &step.id) {
            return Err(OrchestratorError::Launch {
                program: step.program.clone(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }
        self.executed.borrow_mut().push(step.clone());
        let code = self.failures.get(&step.id).copied().unwrap_or(0);
        Ok(OutcomeRecord {
            step_id: step.id.clone(),
            exit_code: Some(code),
            output_path: step.capture.as_ref().map(|capture| capture.path.clone()),
        })
    }
}

/// Temp directory holding a `devtask.toml`, for end-to-end CLI tests.
pub fn scratch_project(config_toml: &str) -> tempfile::TempDir {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("devtask.toml"), config_toml).expect("write devtask.toml");
    temp
}
