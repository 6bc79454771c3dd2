//! Spawning steps as child processes.
//!
//! The [`StepRunner`] trait decouples the invocation loop from real process
//! execution. Tests use scripted runners that return predetermined exit
//! codes without spawning anything.

use std::collections::BTreeMap;
use std::fs;
use std::process::{Command, Stdio};

use tracing::{debug, error, info};

use crate::core::outcome::OutcomeRecord;
use crate::core::step::Step;
use crate::error::{OrchestratorError, Result};

/// Executes one step against a resolved environment snapshot.
pub trait StepRunner {
    /// Block until the step's process exits and report its outcome.
    ///
    /// A non-zero exit is an `OutcomeRecord`, never an `Err`. Failing to
    /// start the executable at all is [`OrchestratorError::Launch`].
    fn run(&self, step: &Step, base_env: &BTreeMap<String, String>) -> Result<OutcomeRecord>;
}

/// The real runner: spawns the command with the snapshot plus the step's
/// overrides, inheriting stdio so the tool renders its own output.
#[derive(Debug, Default)]
pub struct ProcessRunner;

impl StepRunner for ProcessRunner {
    fn run(&self, step: &Step, base_env: &BTreeMap<String, String>) -> Result<OutcomeRecord> {
        let mut cmd = Command::new(&step.program);
        cmd.args(&step.args);
        cmd.env_clear().envs(base_env).envs(&step.env);
        if let Some(dir) = &step.cwd {
            cmd.current_dir(dir);
        }
        if step.capture.is_some() {
            cmd.stdout(Stdio::piped());
        }

        info!(step = %step.id, program = %step.program, "running step");
        debug!(args = ?step.args, env_overrides = ?step.env, "step detail");

        let child = cmd.spawn().map_err(|err| {
            error!(step = %step.id, program = %step.program, err = %err, "failed to launch");
            OrchestratorError::Launch {
                program: step.program.clone(),
                source: err,
            }
        })?;

        let (status, output_path) = match &step.capture {
            None => {
                let status = wait(step, child)?;
                (status, None)
            }
            Some(capture) => {
                let output = child.wait_with_output().map_err(|err| step_io(step, "collect output", err))?;
                let text = String::from_utf8_lossy(&output.stdout);
                let written = match capture.transform {
                    Some(transform) => transform(&text),
                    None => text.into_owned(),
                };
                if let Some(parent) = capture.path.parent() {
                    fs::create_dir_all(parent)
                        .map_err(|err| step_io(step, "create capture dir", err))?;
                }
                fs::write(&capture.path, written)
                    .map_err(|err| step_io(step, "write captured output", err))?;
                (output.status, Some(capture.path.clone()))
            }
        };

        debug!(step = %step.id, exit_code = ?status.code(), "step finished");
        Ok(OutcomeRecord {
            step_id: step.id.clone(),
            exit_code: status.code(),
            output_path,
        })
    }
}

fn wait(step: &Step, mut child: std::process::Child) -> Result<std::process::ExitStatus> {
    child
        .wait()
        .map_err(|err| step_io(step, "wait for step", err))
}

fn step_io(step: &Step, context: &str, source: std::io::Error) -> OrchestratorError {
    OrchestratorError::StepIo {
        step: step.id.clone(),
        context: context.to_string(),
        source,
    }
}
