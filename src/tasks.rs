//! Built-in task registrations.
//!
//! Each task is a plain builder function from [`InvocationContext`] to an
//! ordered step sequence; `register_builtins` wires them into a registry.
//! Tasks that can run under the indirection layer are wrapped by [`routed`]
//! at registration time, so the builders themselves stay direct.

use std::path::PathBuf;

use crate::core::context::InvocationContext;
use crate::core::registry::Registry;
use crate::core::requirements::pin_versions;
use crate::core::step::{Capture, Step};
use crate::error::Result;

/// Register every built-in task.
pub fn register_builtins(registry: &mut Registry) -> Result<()> {
    registry.register("install", install)?;
    registry.register("package", routed(package))?;
    registry.register("test", routed(test))?;
    registry.register("coverage", routed(coverage))?;
    registry.register("coverage-merge", routed(coverage_merge))?;
    registry.register("coverage-report", routed(coverage_report))?;
    registry.register("audit", routed(audit))?;
    registry.register("lint", routed(lint))?;
    registry.register_with_epilogue("docs", routed(docs), docs_epilogue)?;
    registry.register("test-docs", routed(test_docs))?;
    Ok(())
}

fn docs_epilogue(ctx: &InvocationContext<'_>) -> String {
    format!(
        "documentation available under {}/html/index.html",
        ctx.config.docs.build_dir
    )
}

/// Registration-time adapter: when the invocation selects the indirection
/// layer, replace the whole sequence with one step that hands the task's
/// target string to the secondary orchestrator via its environment variable.
fn routed(
    build: fn(&InvocationContext<'_>) -> Result<Vec<Step>>,
) -> impl Fn(&InvocationContext<'_>) -> Result<Vec<Step>> {
    move |ctx: &InvocationContext<'_>| {
        if ctx.via_indirection() {
            Ok(vec![indirect_step(ctx)])
        } else {
            build(ctx)
        }
    }
}

fn indirect_step(ctx: &InvocationContext<'_>) -> Step {
    let indirection = &ctx.config.indirection;
    Step::new(
        format!("indirect:{}", ctx.task),
        &indirection.command,
        &ctx.args.passthrough,
    )
    .env(
        indirection.env_var.clone(),
        ctx.config.indirection_targets(&ctx.task),
    )
}

/// The dependency-installation step most tasks prepend, unless the
/// `skip-install` token suppressed it.
fn install_step(ctx: &InvocationContext<'_>) -> Option<Step> {
    if ctx.args.skip_install {
        return None;
    }
    let mut step = Step::new("install", &ctx.config.install.command, &[]);
    if ctx.color() {
        step.args.push(ctx.config.install.color_flag.clone());
    }
    Some(step)
}

fn with_install(ctx: &InvocationContext<'_>, steps: Vec<Step>) -> Vec<Step> {
    let mut all = Vec::with_capacity(steps.len() + 1);
    all.extend(install_step(ctx));
    all.extend(steps);
    all
}

/// Set up the development environment: just the installer.
fn install(ctx: &InvocationContext<'_>) -> Result<Vec<Step>> {
    let mut step = Step::new("install", &ctx.config.install.command, &ctx.args.passthrough);
    if ctx.color() {
        step.args.push(ctx.config.install.color_flag.clone());
    }
    Ok(vec![step])
}

/// Build sdist/wheel and check the artifacts.
fn package(ctx: &InvocationContext<'_>) -> Result<Vec<Step>> {
    let cfg = &ctx.config.package;
    let check_target = vec![cfg.check_target.clone()];
    Ok(with_install(
        ctx,
        vec![
            Step::new("package:build", &cfg.build_command, &[]),
            Step::new("package:check", &cfg.check_command, &check_target),
        ],
    ))
}

/// Run the test suite with the coverage gate.
fn test(ctx: &InvocationContext<'_>) -> Result<Vec<Step>> {
    let cfg = &ctx.config.test;
    let coverage = &ctx.config.coverage;
    let mut args = vec![
        format!("--junitxml={}", cache_path(&coverage.junit_dir, "junit.xml")),
        format!("--cov={}", ctx.config.project.name),
        format!("--cov-fail-under={}", ctx.min_coverage()),
    ];
    if ctx.args.passthrough.is_empty() {
        args.push(cfg.default_target.clone());
    } else {
        args.extend(ctx.args.passthrough.iter().cloned());
    }
    // Suffixed data file: `coverage combine` merges parallel `.coverage.*`
    // files into the bare `.coverage`, so the test run must not write the
    // bare name itself.
    let data_file = cache_path(
        &coverage.cache_dir,
        &format!(".coverage.{}", ctx.config.project.name),
    );
    let step = Step::new("test", &cfg.runner, &args).env("COVERAGE_FILE", data_file);
    Ok(with_install(ctx, vec![step]))
}

fn merge_steps(ctx: &InvocationContext<'_>) -> Vec<Step> {
    let coverage = &ctx.config.coverage;
    let data_file = cache_path(&coverage.cache_dir, ".coverage");
    let xml = cache_path(&coverage.cache_dir, "coverage.xml");
    let html_dir = cache_path(&coverage.cache_dir, "htmlcov");
    vec![
        Step::new("coverage:combine", &coverage.command, &strings(&["combine"]))
            .env("COVERAGE_FILE", &data_file),
        Step::new(
            "coverage:xml",
            &coverage.command,
            &["xml".to_string(), "-o".to_string(), xml],
        )
        .env("COVERAGE_FILE", &data_file),
        Step::new(
            "coverage:html",
            &coverage.command,
            &["html".to_string(), "-d".to_string(), html_dir],
        )
        .env("COVERAGE_FILE", &data_file),
    ]
}

fn report_steps(ctx: &InvocationContext<'_>) -> Vec<Step> {
    let coverage = &ctx.config.coverage;
    let data_file = cache_path(&coverage.cache_dir, ".coverage");
    let xml = cache_path(&coverage.cache_dir, "coverage.xml");
    // The diff report must run even when the total gate fails, and the
    // invocation still fails overall.
    vec![
        Step::new(
            "coverage:report",
            &coverage.command,
            &[
                "report".to_string(),
                "-m".to_string(),
                format!("--fail-under={}", ctx.min_coverage()),
            ],
        )
        .env("COVERAGE_FILE", &data_file)
        .accumulate(),
        Step::new(
            "coverage:diff",
            &coverage.diff_command,
            &[
                format!("--compare-branch={}", ctx.diff_against()),
                "--ignore-staged".to_string(),
                "--ignore-unstaged".to_string(),
                format!("--fail-under={}", ctx.min_diff_coverage()),
                format!("--diff-range-notation={}", coverage.diff_range_notation),
                xml,
            ],
        )
        .accumulate(),
    ]
}

/// Combine coverage data and create xml/html reports.
fn coverage_merge(ctx: &InvocationContext<'_>) -> Result<Vec<Step>> {
    Ok(with_install(ctx, merge_steps(ctx)))
}

/// Report total and diff coverage against the configured baseline.
fn coverage_report(ctx: &InvocationContext<'_>) -> Result<Vec<Step>> {
    Ok(with_install(ctx, report_steps(ctx)))
}

/// coverage-merge followed by coverage-report.
fn coverage(ctx: &InvocationContext<'_>) -> Result<Vec<Step>> {
    let mut steps = merge_steps(ctx);
    steps.extend(report_steps(ctx));
    Ok(with_install(ctx, steps))
}

/// Check all dependencies for known vulnerabilities.
fn audit(ctx: &InvocationContext<'_>) -> Result<Vec<Step>> {
    let cfg = &ctx.config.audit;
    let requirements = PathBuf::from(&cfg.requirements_file);
    let show = Step::new("audit:show", &cfg.show_command, &[]).capture(Capture {
        path: requirements.clone(),
        transform: Some(pin_versions),
    });
    let check = Step::new(
        "audit:check",
        &cfg.command,
        &[
            "check".to_string(),
            "-r".to_string(),
            cfg.requirements_file.clone(),
            "--full-report".to_string(),
        ],
    );
    Ok(with_install(ctx, vec![show, check]))
}

/// Format and check the code, one run per selected hook.
fn lint(ctx: &InvocationContext<'_>) -> Result<Vec<Step>> {
    let cfg = &ctx.config.lint;
    let hooks = ctx.args.select_targets(&cfg.hooks);
    let steps = if hooks.is_empty() {
        vec![lint_run(ctx, "lint", None)]
    } else {
        hooks
            .iter()
            .map(|hook| lint_run(ctx, &format!("lint:{hook}"), Some(hook)))
            .collect()
    };
    Ok(with_install(ctx, steps))
}

fn lint_run(ctx: &InvocationContext<'_>, id: &str, hook: Option<&str>) -> Step {
    let mut args = strings(&["run", "--all-files"]);
    args.extend(ctx.args.passthrough.iter().cloned());
    args.extend(hook.map(str::to_string));
    Step::new(id, &ctx.config.lint.command, &args).accumulate()
}

/// Build the HTML docs, live-rebuilding when `autobuild` was given.
fn docs(ctx: &InvocationContext<'_>) -> Result<Vec<Step>> {
    let cfg = &ctx.config.docs;
    let command = if ctx.args.autobuild {
        &cfg.autobuild_command
    } else {
        &cfg.build_command
    };
    let mut args = vec![
        "-b".to_string(),
        "html".to_string(),
        "-aE".to_string(),
        cfg.source_dir.clone(),
        format!("{}/html", cfg.build_dir),
    ];
    if ctx.args.autobuild {
        args.push("--open-browser".to_string());
    }
    args.extend(ctx.args.passthrough.iter().cloned());
    Ok(with_install(ctx, vec![Step::new("docs", command, &args)]))
}

/// Build and check the docs once per configured builder.
fn test_docs(ctx: &InvocationContext<'_>) -> Result<Vec<Step>> {
    let cfg = &ctx.config.docs;
    let builders = ctx.args.select_targets(&cfg.builders);
    let steps = builders
        .iter()
        .map(|builder| {
            let mut args = vec!["-b".to_string(), builder.clone()];
            args.extend(strings(&["-aE", "-v", "-nW", "--keep-going"]));
            if let Some(extra) = cfg.extra_args.get(builder) {
                args.extend(extra.iter().cloned());
            }
            args.push(cfg.source_dir.clone());
            args.push(format!("{}/test/{builder}", cfg.build_dir));
            args.extend(ctx.args.passthrough.iter().cloned());
            Step::new(format!("test-docs:{builder}"), &cfg.build_command, &args).accumulate()
        })
        .collect();
    Ok(with_install(ctx, steps))
}

fn cache_path(dir: &str, file: &str) -> String {
    format!("{dir}/{file}")
}

fn strings(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::args::partition;
    use crate::core::context::{InvocationContext, VIA_VAR};
    use crate::core::step::FailurePolicy;
    use crate::io::config::OrchestratorConfig;
    use std::collections::BTreeMap;

    fn ctx<'a>(config: &'a OrchestratorConfig, raw: &[&str]) -> InvocationContext<'a> {
        ctx_named(config, "test", raw)
    }

    fn ctx_named<'a>(
        config: &'a OrchestratorConfig,
        task: &str,
        raw: &[&str],
    ) -> InvocationContext<'a> {
        let raw: Vec<String> = raw.iter().map(|s| s.to_string()).collect();
        InvocationContext::new(task, partition(&raw), BTreeMap::new(), config)
    }

    #[test]
    fn test_task_prepends_install_and_sets_coverage_env() {
        let config = OrchestratorConfig::for_project("demo");
        let steps = test(&ctx(&config, &[])).expect("build");
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].id, "install");
        assert_eq!(steps[1].id, "test");
        assert_eq!(
            steps[1].env.get("COVERAGE_FILE").map(String::as_str),
            Some(".coverage_cache/.coverage.demo")
        );
        assert!(steps[1].args.iter().any(|a| a == "--cov-fail-under=100"));
        assert_eq!(steps[1].args.last().map(String::as_str), Some("tests"));
    }

    #[test]
    fn test_data_file_is_a_suffixed_sibling_of_the_combine_target() {
        let config = OrchestratorConfig::for_project("demo");
        let test_steps = test(&ctx(&config, &["skip-install"])).expect("build");
        let combine = &merge_steps(&ctx_named(&config, "coverage", &[]))[0];
        let test_data = test_steps[0].env.get("COVERAGE_FILE").expect("test data file");
        let combine_data = combine.env.get("COVERAGE_FILE").expect("combine data file");
        assert_ne!(test_data, combine_data);
        assert!(test_data.starts_with(&format!("{combine_data}.")));
    }

    #[test]
    fn skip_install_removes_exactly_the_install_step() {
        let config = OrchestratorConfig::for_project("demo");
        let full = test(&ctx(&config, &[])).expect("build");
        let skipped = test(&ctx(&config, &["skip-install"])).expect("build");
        assert_eq!(skipped.len(), full.len() - 1);
        let rest: Vec<&str> = full[1..].iter().map(|s| s.id.as_str()).collect();
        let kept: Vec<&str> = skipped.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(rest, kept);
    }

    #[test]
    fn passthrough_replaces_default_test_target() {
        let config = OrchestratorConfig::for_project("demo");
        let steps = test(&ctx(&config, &["tests/unit", "-x"])).expect("build");
        let test_args = &steps[1].args;
        assert!(test_args.iter().any(|a| a == "tests/unit"));
        assert!(test_args.iter().any(|a| a == "-x"));
        assert!(!test_args.iter().any(|a| a == "tests"));
    }

    #[test]
    fn via_routes_through_one_indirection_step() {
        let mut config = OrchestratorConfig::for_project("demo");
        config
            .indirection
            .targets
            .insert("test".to_string(), "py311,py312".to_string());
        let build = routed(test);
        let steps = build(&ctx(&config, &["via", "-x"])).expect("build");
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].id, "indirect:test");
        assert_eq!(steps[0].program, "tox");
        assert_eq!(
            steps[0].env.get("TOXENV").map(String::as_str),
            Some("py311,py312")
        );
        assert_eq!(steps[0].args, vec!["-x"]);
    }

    #[test]
    fn via_env_selector_also_routes() {
        let config = OrchestratorConfig::for_project("demo");
        let mut ctx = ctx(&config, &[]);
        ctx.env.insert(VIA_VAR.to_string(), "true".to_string());
        let build = routed(test);
        let steps = build(&ctx).expect("build");
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].id, "indirect:test");
    }

    #[test]
    fn test_docs_fans_out_per_builder_accumulating() {
        let mut config = OrchestratorConfig::for_project("demo");
        config.docs.builders = vec![
            "html".to_string(),
            "linkcheck".to_string(),
            "confluence".to_string(),
        ];
        config.docs.extra_args.insert(
            "confluence".to_string(),
            vec!["-t".to_string(), "confluence".to_string()],
        );
        let steps = test_docs(&ctx_named(&config, "test-docs", &["skip-install"])).expect("build");
        let ids: Vec<&str> = steps.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "test-docs:html",
                "test-docs:linkcheck",
                "test-docs:confluence"
            ]
        );
        assert!(steps.iter().all(|s| s.policy == FailurePolicy::Accumulate));
        assert!(steps[2].args.iter().any(|a| a == "confluence"));
        assert!(
            steps[2]
                .args
                .iter()
                .any(|a| a == "docs/build/test/confluence")
        );
    }

    #[test]
    fn autobuild_swaps_the_docs_command() {
        let config = OrchestratorConfig::for_project("demo");
        let steps = docs(&ctx_named(&config, "docs", &["skip-install", "autobuild"])).expect("build");
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].program, "sphinx-autobuild");
        assert!(steps[0].args.iter().any(|a| a == "--open-browser"));

        let plain = docs(&ctx_named(&config, "docs", &["skip-install"])).expect("build");
        assert_eq!(plain[0].program, "sphinx-build");
        assert!(!plain[0].args.iter().any(|a| a == "--open-browser"));
    }

    #[test]
    fn docs_declares_an_index_epilogue() {
        let config = OrchestratorConfig::for_project("demo");
        let mut registry = Registry::new();
        register_builtins(&mut registry).expect("register");
        let ctx = ctx_named(&config, "docs", &[]);
        let message = registry
            .get("docs")
            .expect("get")
            .epilogue(&ctx)
            .expect("epilogue");
        assert!(message.contains("docs/build/html/index.html"));
        assert_eq!(registry.get("test").expect("get").epilogue(&ctx), None);
    }

    #[test]
    fn empty_only_selector_still_fans_out() {
        let mut config = OrchestratorConfig::for_project("demo");
        config.docs.builders = vec!["html".to_string(), "linkcheck".to_string()];
        let steps = test_docs(&ctx_named(&config, "test-docs", &["skip-install", "only="]))
            .expect("build");
        let ids: Vec<&str> = steps.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["test-docs:html", "test-docs:linkcheck"]);
    }

    #[test]
    fn only_selector_restricts_fan_out() {
        let mut config = OrchestratorConfig::for_project("demo");
        config.docs.builders = vec!["html".to_string(), "linkcheck".to_string()];
        let steps = test_docs(&ctx_named(
            &config,
            "test-docs",
            &["skip-install", "only=linkcheck"],
        ))
        .expect("build");
        let ids: Vec<&str> = steps.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["test-docs:linkcheck"]);
    }

    #[test]
    fn lint_without_hooks_is_one_unfiltered_run() {
        let config = OrchestratorConfig::for_project("demo");
        let steps = lint(&ctx_named(&config, "lint", &["skip-install"])).expect("build");
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].id, "lint");
        assert_eq!(steps[0].policy, FailurePolicy::Accumulate);
    }

    #[test]
    fn lint_fans_out_over_configured_hooks() {
        let mut config = OrchestratorConfig::for_project("demo");
        config.lint.hooks = vec!["black".to_string(), "flake8".to_string()];
        let steps = lint(&ctx_named(&config, "lint", &["skip-install"])).expect("build");
        let ids: Vec<&str> = steps.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["lint:black", "lint:flake8"]);
        assert_eq!(steps[0].args.last().map(String::as_str), Some("black"));
    }

    #[test]
    fn audit_captures_pinned_requirements_then_checks() {
        let config = OrchestratorConfig::for_project("demo");
        let steps = audit(&ctx_named(&config, "audit", &["skip-install"])).expect("build");
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].id, "audit:show");
        let capture = steps[0].capture.as_ref().expect("capture");
        assert!(capture.transform.is_some());
        assert_eq!(steps[1].id, "audit:check");
        assert!(steps[1].args.iter().any(|a| a == "-r"));
    }

    #[test]
    fn coverage_runs_merge_then_report() {
        let config = OrchestratorConfig::for_project("demo");
        let steps =
            coverage(&ctx_named(&config, "coverage", &["skip-install"])).expect("build");
        let ids: Vec<&str> = steps.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "coverage:combine",
                "coverage:xml",
                "coverage:html",
                "coverage:report",
                "coverage:diff"
            ]
        );
        assert_eq!(steps[3].policy, FailurePolicy::Accumulate);
        assert_eq!(steps[4].policy, FailurePolicy::Accumulate);
        assert_eq!(steps[0].policy, FailurePolicy::Fatal);
    }

    #[test]
    fn register_builtins_registers_each_name_once() {
        let mut registry = Registry::new();
        register_builtins(&mut registry).expect("register");
        let names = registry.names();
        assert!(names.contains(&"test"));
        assert!(names.contains(&"test-docs"));
        assert!(names.contains(&"coverage-report"));
        assert_eq!(names.len(), 10);
    }
}
