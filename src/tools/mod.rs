//! Tool specs and the installer step.
//!
//! An installer never reinstalls a present tool: the probe runs first and a
//! hit short-circuits everything else. When the tool is absent, installation
//! strategies run in their configured order until one both exits 0 and makes
//! the tool resolvable. Every attempt is bounded by its own hard timeout; a
//! timeout and a non-zero exit are treated the same: move on.

use crate::error::GroundworkError;
use crate::probe::{Capability, VersionProbe};
use crate::shell::{execute, CommandOptions};
use crate::steps::{RunContext, StepReport};
use std::time::{Duration, Instant};

/// One way to install a tool.
#[derive(Debug, Clone)]
pub struct InstallStrategy {
    /// Short label for logs ("npm", "pipx", "pip --user").
    pub label: String,
    /// Shell command to run.
    pub command: String,
    /// Hard timeout for the attempt.
    pub timeout: Duration,
}

impl InstallStrategy {
    pub fn new(label: impl Into<String>, command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            label: label.into(),
            command: command.into(),
            timeout,
        }
    }
}

/// A tool the bootstrap must make available.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    /// Name used in step reports and the run context.
    pub name: String,
    /// How to detect the tool.
    pub probe: VersionProbe,
    /// Installation strategies, tried in order. May be empty for tools the
    /// bootstrap can only report on (e.g. git on an image we don't manage).
    pub strategies: Vec<InstallStrategy>,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, probe: VersionProbe) -> Self {
        Self {
            name: name.into(),
            probe,
            strategies: Vec::new(),
        }
    }

    pub fn with_strategy(mut self, strategy: InstallStrategy) -> Self {
        self.strategies.push(strategy);
        self
    }
}

/// Mockable dependencies for the installer.
pub struct InstallerContext<'a> {
    /// Run a shell command under a timeout, returning true on success.
    pub run_command: &'a dyn Fn(&str, Duration) -> bool,
    /// Probe for a tool.
    pub detect: &'a dyn Fn(&VersionProbe) -> Capability,
}

/// Build the default `InstallerContext` for production use.
pub fn default_context() -> InstallerContext<'static> {
    InstallerContext {
        run_command: &|cmd, timeout| {
            execute(cmd, &CommandOptions::timed(timeout))
                .map(|r| r.success)
                .unwrap_or(false)
        },
        detect: &|probe| probe.detect(),
    }
}

/// Ensure a tool is present, installing it if necessary.
pub fn ensure(spec: &ToolSpec, ctx: &mut RunContext) -> StepReport {
    ensure_with(spec, ctx, &default_context())
}

/// Ensure a tool is present, with injectable probing and command execution.
pub fn ensure_with(
    spec: &ToolSpec,
    ctx: &mut RunContext,
    ictx: &InstallerContext<'_>,
) -> StepReport {
    let start = Instant::now();

    if let Capability::Present { path, version } = (ictx.detect)(&spec.probe) {
        ctx.set_tool_path(&spec.name, &path);
        let detail = match version {
            Some(v) => format!("already present: {} ({})", path.display(), v),
            None => format!("already present: {} (unknown version)", path.display()),
        };
        return StepReport::skipped(&spec.name, detail);
    }

    tracing::info!(tool = %spec.name, "not found, trying install strategies");

    for strategy in &spec.strategies {
        tracing::debug!(tool = %spec.name, strategy = %strategy.label, "attempting install");

        if !(ictx.run_command)(&strategy.command, strategy.timeout) {
            tracing::debug!(tool = %spec.name, strategy = %strategy.label, "attempt failed");
            continue;
        }

        // Exit 0 is not enough: the install must actually put the tool on
        // PATH. An installer that "succeeds" into a directory the current
        // shell can't see counts as a failed strategy.
        if let Capability::Present { path, .. } = (ictx.detect)(&spec.probe) {
            ctx.set_tool_path(&spec.name, &path);
            return StepReport::succeeded(
                &spec.name,
                start.elapsed(),
                format!("installed via {} ({})", strategy.label, path.display()),
            );
        }

        tracing::warn!(
            tool = %spec.name,
            strategy = %strategy.label,
            "install exited 0 but tool still not resolvable"
        );
    }

    let remediation = spec
        .strategies
        .first()
        .map(|s| s.command.clone())
        .unwrap_or_else(|| format!("install '{}' manually and re-run groundwork", spec.name));

    let error = if spec.strategies.is_empty() {
        GroundworkError::ToolAbsent {
            tool: spec.name.clone(),
            message: "not on PATH and no install strategy configured".to_string(),
        }
    } else {
        GroundworkError::InstallFailed {
            tool: spec.name.clone(),
            message: format!(
                "all {} install strateg{} failed",
                spec.strategies.len(),
                if spec.strategies.len() == 1 { "y" } else { "ies" }
            ),
        }
    };

    StepReport::failed(&spec.name, start.elapsed(), error.to_string(), remediation)
}
