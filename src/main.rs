//! CLI entry point: `devtask <task> [args...]`.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use devtask::core::args::partition;
use devtask::core::context::InvocationContext;
use devtask::core::registry::Registry;
use devtask::error::OrchestratorError;
use devtask::exit_codes;
use devtask::invoke::invoke;
use devtask::io::config::load_config;
use devtask::io::process::ProcessRunner;
use devtask::tasks::register_builtins;

#[derive(Parser)]
#[command(
    name = "devtask",
    version,
    about = "Run a named dev-automation task as a sequence of external tools"
)]
struct Cli {
    /// Path to the project configuration.
    #[arg(long, default_value = "devtask.toml")]
    config: PathBuf,

    /// List registered tasks and exit.
    #[arg(long)]
    list: bool,

    /// Task to invoke.
    #[arg(required_unless_present = "list")]
    task: Option<String>,

    /// Raw tokens: `skip-install`, `via`, `only=a,b` and `KEY=value` are
    /// consumed by the orchestrator; everything else is forwarded verbatim.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() -> ExitCode {
    devtask::logging::init();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => ExitCode::from(exit_code_byte(code)),
        Err(err) => {
            eprintln!("devtask: {:#}", anyhow::Error::new(err));
            ExitCode::from(exit_code_byte(exit_codes::INVALID))
        }
    }
}

fn run(cli: &Cli) -> Result<i32, OrchestratorError> {
    let mut registry = Registry::new();
    register_builtins(&mut registry)?;

    if cli.list {
        for name in registry.names() {
            println!("{name}");
        }
        return Ok(exit_codes::OK);
    }

    // clap enforces the task argument unless --list was given.
    let task = cli.task.as_deref().unwrap_or_default();
    let config = load_config(&cli.config)?;
    let env: BTreeMap<String, String> = std::env::vars().collect();
    let ctx = InvocationContext::new(task, partition(&cli.args), env, &config);

    let report = invoke(&registry, &ctx, &ProcessRunner)?;
    if report.success()
        && let Some(message) = registry.get(task)?.epilogue(&ctx)
    {
        println!("{message}");
    }
    if !report.success() {
        eprintln!("devtask: task `{task}` failed: {}", report.failed_steps().join(", "));
    }
    Ok(report.exit_status())
}

/// `ExitCode::from` takes a u8; tool exit codes outside that range collapse
/// to the generic failure code.
fn exit_code_byte(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(exit_codes::FAILED as u8)
}
