//! Orchestration: resolve a task, build its steps, execute, aggregate.

use tracing::{debug, info, warn};

use crate::core::context::InvocationContext;
use crate::core::outcome::Report;
use crate::core::registry::Registry;
use crate::core::step::FailurePolicy;
use crate::error::Result;
use crate::io::process::StepRunner;

/// Invoke the task named in `ctx` and aggregate its step outcomes.
///
/// Steps execute strictly in declaration order. A failing fatal step halts
/// the sequence and the remaining step ids are reported as skipped; failing
/// accumulating steps are recorded while later steps still run. The report
/// is a failure iff any executed step failed. Launch faults abort
/// immediately regardless of policy.
pub fn invoke(registry: &Registry, ctx: &InvocationContext<'_>, runner: &dyn StepRunner) -> Result<Report> {
    let task = registry.get(&ctx.task)?;
    let mut steps = task.build_steps(ctx)?;

    // KEY=value argument tokens become environment overrides on every step,
    // winning over what the builder set.
    for step in &mut steps {
        for (key, value) in &ctx.args.env_overrides {
            step.env.insert(key.clone(), value.clone());
        }
    }

    info!(task = %ctx.task, steps = steps.len(), "invoking task");

    let mut report = Report::default();
    let mut halted = false;
    for step in &steps {
        if halted {
            debug!(step = %step.id, "skipped after fatal failure");
            report.skipped.push(step.id.clone());
            continue;
        }
        let record = runner.run(step, &ctx.env)?;
        let failed = !record.success();
        report.records.push(record);
        if failed && step.policy == FailurePolicy::Fatal {
            halted = true;
        }
    }

    if report.success() {
        info!(task = %ctx.task, "task succeeded");
    } else {
        warn!(task = %ctx.task, failed = ?report.failed_steps(), "task failed");
    }
    Ok(report)
}
