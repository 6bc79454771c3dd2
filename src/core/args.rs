//! Pure partitioning of raw argument tokens.
//!
//! The CLI forwards everything after the task name untouched. This module
//! splits those tokens into the ones the orchestrator consumes and the ones
//! that pass through verbatim to the final external command.
//!
//! Consumed tokens:
//! - `skip-install` — suppress the automatic installer step.
//! - `via` — route the task through the indirection layer.
//! - `autobuild` (or `ab`) — live-rebuild variant of the docs task.
//! - `only=a,b` — restrict a fan-out task to the named targets.
//! - `KEY=value` (`KEY` all-caps) — environment override for every step.
//!
//! Everything else stays in `passthrough`, order preserved.

/// Result of partitioning the raw tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArgs {
    pub skip_install: bool,
    pub via: bool,
    pub autobuild: bool,
    /// Targets named by an `only=` token, if any.
    pub only: Option<Vec<String>>,
    /// `KEY=value` overrides, in the order supplied.
    pub env_overrides: Vec<(String, String)>,
    /// Tokens forwarded verbatim to the final external command.
    pub passthrough: Vec<String>,
}

impl ParsedArgs {
    /// Restrict `all` to the `only=` selection, keeping the declared order.
    /// Without a selector the full set is returned.
    pub fn select_targets(&self, all: &[String]) -> Vec<String> {
        match &self.only {
            None => all.to_vec(),
            Some(named) => all
                .iter()
                .filter(|target| named.iter().any(|n| n == *target))
                .cloned()
                .collect(),
        }
    }
}

/// Partition raw tokens into orchestrator-consumed pieces and passthrough.
pub fn partition(raw: &[String]) -> ParsedArgs {
    let mut parsed = ParsedArgs::default();
    for token in raw {
        match token.as_str() {
            "skip-install" => parsed.skip_install = true,
            "via" => parsed.via = true,
            "autobuild" | "ab" => parsed.autobuild = true,
            _ => {
                if let Some(list) = token.strip_prefix("only=") {
                    let named: Vec<String> = list
                        .split(',')
                        .filter(|part| !part.is_empty())
                        .map(str::to_string)
                        .collect();
                    // `only=` naming nothing would build zero steps and
                    // vacuously succeed; keep the full set instead.
                    if !named.is_empty() {
                        parsed.only = Some(named);
                    }
                } else if let Some((key, value)) = split_env_override(token) {
                    parsed.env_overrides.push((key, value));
                } else {
                    parsed.passthrough.push(token.clone());
                }
            }
        }
    }
    parsed
}

/// `KEY=value` with `KEY` matching `[A-Z][A-Z0-9_]*`.
fn split_env_override(token: &str) -> Option<(String, String)> {
    let (key, value) = token.split_once('=')?;
    let mut chars = key.chars();
    let first = chars.next()?;
    if !first.is_ascii_uppercase() {
        return None;
    }
    if !chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_') {
        return None;
    }
    Some((key.to_string(), value.to_string()))
}
