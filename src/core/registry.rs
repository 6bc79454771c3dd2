//! Task registry: name → step-sequence builder.

use std::collections::BTreeMap;

use crate::core::context::InvocationContext;
use crate::core::step::Step;
use crate::error::{OrchestratorError, Result};

/// Builds the ordered step sequence for one invocation of a task.
pub type StepBuilder = Box<dyn Fn(&InvocationContext<'_>) -> Result<Vec<Step>>>;

/// Renders a task's success message for the CLI.
pub type EpilogueFn = Box<dyn Fn(&InvocationContext<'_>) -> String>;

/// A named, invocable unit of work.
pub struct TaskDefinition {
    pub name: String,
    builder: StepBuilder,
    epilogue: Option<EpilogueFn>,
}

impl std::fmt::Debug for TaskDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskDefinition")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl TaskDefinition {
    pub fn build_steps(&self, ctx: &InvocationContext<'_>) -> Result<Vec<Step>> {
        (self.builder)(ctx)
    }

    /// Message to print after the task succeeds, if the task declares one.
    pub fn epilogue(&self, ctx: &InvocationContext<'_>) -> Option<String> {
        self.epilogue.as_ref().map(|render| render(ctx))
    }
}

/// All registered tasks. Populated at process start, immutable afterwards.
#[derive(Default)]
pub struct Registry {
    tasks: BTreeMap<String, TaskDefinition>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate a task name with a step builder.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        builder: impl Fn(&InvocationContext<'_>) -> Result<Vec<Step>> + 'static,
    ) -> Result<()> {
        self.insert(name.into(), Box::new(builder), None)
    }

    /// Like [`register`](Self::register), for tasks that print a success
    /// message after every step passed.
    pub fn register_with_epilogue(
        &mut self,
        name: impl Into<String>,
        builder: impl Fn(&InvocationContext<'_>) -> Result<Vec<Step>> + 'static,
        epilogue: impl Fn(&InvocationContext<'_>) -> String + 'static,
    ) -> Result<()> {
        self.insert(name.into(), Box::new(builder), Some(Box::new(epilogue)))
    }

    fn insert(
        &mut self,
        name: String,
        builder: StepBuilder,
        epilogue: Option<EpilogueFn>,
    ) -> Result<()> {
        if self.tasks.contains_key(&name) {
            return Err(OrchestratorError::DuplicateTask(name));
        }
        self.tasks.insert(
            name.clone(),
            TaskDefinition {
                name,
                builder,
                epilogue,
            },
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&TaskDefinition> {
        self.tasks
            .get(name)
            .ok_or_else(|| OrchestratorError::UnknownTask(name.to_string()))
    }

    /// Registered task names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.tasks.keys().map(String::as_str).collect()
    }
}
