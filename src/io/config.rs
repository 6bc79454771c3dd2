//! Orchestrator configuration stored in `devtask.toml`.
//!
//! The file is edited by humans and must stay stable and automatable.
//! Every section defaults to the conventional tool wiring; only the project
//! name is required. Constructed once at process start and passed by
//! reference into registration, so tests can build alternate configs.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{OrchestratorError, Result};

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub project: ProjectConfig,
    pub install: InstallConfig,
    pub package: PackageConfig,
    pub test: TestConfig,
    pub coverage: CoverageConfig,
    pub docs: DocsConfig,
    pub lint: LintConfig,
    pub audit: AuditConfig,
    pub indirection: IndirectionConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ProjectConfig {
    /// Package name under test. Required; there is no sensible default.
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct InstallConfig {
    /// Dependency-installation command prepended to most tasks.
    pub command: Vec<String>,
    /// Flag appended when color output is requested.
    pub color_flag: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PackageConfig {
    pub build_command: Vec<String>,
    pub check_command: Vec<String>,
    /// Glob handed to the check command.
    pub check_target: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TestConfig {
    pub runner: Vec<String>,
    /// Default total-coverage gate (percent); `DEVTASK_MIN_COVERAGE` wins.
    pub min_coverage: u32,
    /// Test path used when no passthrough arguments are given.
    pub default_target: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CoverageConfig {
    pub command: Vec<String>,
    pub diff_command: Vec<String>,
    /// Cache directory for raw coverage data and rendered reports.
    pub cache_dir: String,
    /// Cache directory for structured test-result files.
    pub junit_dir: String,
    pub min_diff_coverage: u32,
    /// Baseline ref for diff reports; `DEVTASK_DIFF_AGAINST` wins.
    pub diff_against: String,
    pub diff_range_notation: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DocsConfig {
    pub build_command: Vec<String>,
    /// Live-rebuild command the `autobuild` token swaps in.
    pub autobuild_command: Vec<String>,
    pub source_dir: String,
    pub build_dir: String,
    /// Builders the `test-docs` task fans out over.
    pub builders: Vec<String>,
    /// Extra arguments for specific builders, keyed by builder name.
    pub extra_args: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LintConfig {
    pub command: Vec<String>,
    /// Hooks the `lint` task fans out over. Empty means one un-filtered run.
    pub hooks: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AuditConfig {
    pub command: Vec<String>,
    /// Command whose stdout lists installed dependencies.
    pub show_command: Vec<String>,
    /// Where the pinned requirements file is written.
    pub requirements_file: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IndirectionConfig {
    /// Secondary orchestration command invoked when routing via `via` /
    /// `DEVTASK_VIA`.
    pub command: Vec<String>,
    /// Environment variable naming the target sub-tasks.
    pub env_var: String,
    /// Per-task target strings; tasks not listed use their own name.
    pub targets: BTreeMap<String, String>,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            command: strings(&["poetry", "install"]),
            color_flag: "--ansi".to_string(),
        }
    }
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            build_command: strings(&["poetry", "build", "-vvv"]),
            check_command: strings(&["twine", "check"]),
            check_target: "dist/*".to_string(),
        }
    }
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            runner: strings(&["pytest"]),
            min_coverage: 100,
            default_target: "tests".to_string(),
        }
    }
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            command: strings(&["coverage"]),
            diff_command: strings(&["diff-cover"]),
            cache_dir: ".coverage_cache".to_string(),
            junit_dir: ".junit_cache".to_string(),
            min_diff_coverage: 100,
            diff_against: "origin/main".to_string(),
            diff_range_notation: "..".to_string(),
        }
    }
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            build_command: strings(&["sphinx-build"]),
            autobuild_command: strings(&["sphinx-autobuild"]),
            source_dir: "docs/source".to_string(),
            build_dir: "docs/build".to_string(),
            builders: strings(&["html"]),
            extra_args: BTreeMap::new(),
        }
    }
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            command: strings(&["pre-commit"]),
            hooks: vec![],
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            command: strings(&["safety"]),
            show_command: strings(&["poetry", "show"]),
            requirements_file: ".devtask/requirements.txt".to_string(),
        }
    }
}

impl Default for IndirectionConfig {
    fn default() -> Self {
        Self {
            command: strings(&["tox"]),
            env_var: "TOXENV".to_string(),
            targets: BTreeMap::new(),
        }
    }
}

fn strings(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

impl OrchestratorConfig {
    /// Default wiring with the project name filled in.
    pub fn for_project(name: impl Into<String>) -> Self {
        Self {
            project: ProjectConfig { name: name.into() },
            ..Self::default()
        }
    }

    /// Target string the indirection layer receives for `task`.
    pub fn indirection_targets(&self, task: &str) -> String {
        self.indirection
            .targets
            .get(task)
            .cloned()
            .unwrap_or_else(|| task.to_string())
    }

    pub fn validate(&self) -> Result<()> {
        if self.project.name.trim().is_empty() {
            return Err(config_err("project.name is required"));
        }
        let commands: [(&str, &Vec<String>); 10] = [
            ("install.command", &self.install.command),
            ("package.build_command", &self.package.build_command),
            ("package.check_command", &self.package.check_command),
            ("test.runner", &self.test.runner),
            ("coverage.command", &self.coverage.command),
            ("coverage.diff_command", &self.coverage.diff_command),
            ("docs.build_command", &self.docs.build_command),
            ("docs.autobuild_command", &self.docs.autobuild_command),
            ("lint.command", &self.lint.command),
            ("audit.command", &self.audit.command),
        ];
        for (key, command) in commands {
            if command.is_empty() || command[0].trim().is_empty() {
                return Err(config_err(format!("{key} must be a non-empty array")));
            }
        }
        if self.audit.show_command.is_empty() {
            return Err(config_err("audit.show_command must be a non-empty array"));
        }
        if self.indirection.command.is_empty() {
            return Err(config_err("indirection.command must be a non-empty array"));
        }
        if self.docs.builders.is_empty() {
            return Err(config_err("docs.builders must name at least one builder"));
        }
        if self.test.min_coverage > 100 || self.coverage.min_diff_coverage > 100 {
            return Err(config_err("coverage gates are percentages (0-100)"));
        }
        Ok(())
    }
}

fn config_err(msg: impl Into<String>) -> OrchestratorError {
    OrchestratorError::Configuration(msg.into())
}

/// Load and validate config from a TOML file.
///
/// A missing file is a configuration error: the project name has no default,
/// so no task can be correctly constructed without the file.
pub fn load_config(path: &Path) -> Result<OrchestratorConfig> {
    let contents = fs::read_to_string(path)
        .map_err(|err| config_err(format!("read {}: {err}", path.display())))?;
    let config: OrchestratorConfig = toml::from_str(&contents)
        .map_err(|err| config_err(format!("parse {}: {err}", path.display())))?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_file_is_a_configuration_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = load_config(&temp.path().join("missing.toml")).expect_err("load");
        assert!(matches!(err, OrchestratorError::Configuration(_)));
    }

    #[test]
    fn minimal_file_gets_default_wiring() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("devtask.toml");
        fs::write(&path, "[project]\nname = \"demo\"\n").expect("write");
        let config = load_config(&path).expect("load");
        assert_eq!(config, OrchestratorConfig::for_project("demo"));
        assert_eq!(config.install.command, vec!["poetry", "install"]);
    }

    #[test]
    fn missing_project_name_is_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("devtask.toml");
        fs::write(&path, "[test]\nmin_coverage = 90\n").expect("write");
        let err = load_config(&path).expect_err("load");
        assert!(matches!(err, OrchestratorError::Configuration(msg) if msg.contains("project.name")));
    }

    #[test]
    fn empty_command_array_is_rejected() {
        let config = OrchestratorConfig {
            lint: LintConfig {
                command: vec![],
                hooks: vec![],
            },
            ..OrchestratorConfig::for_project("demo")
        };
        let err = config.validate().expect_err("validate");
        assert!(matches!(err, OrchestratorError::Configuration(msg) if msg.contains("lint.command")));
    }

    #[test]
    fn indirection_targets_default_to_task_name() {
        let mut config = OrchestratorConfig::for_project("demo");
        config
            .indirection
            .targets
            .insert("test".to_string(), "py311,py312".to_string());
        assert_eq!(config.indirection_targets("test"), "py311,py312");
        assert_eq!(config.indirection_targets("docs"), "docs");
    }
}
