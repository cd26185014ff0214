//! Source checkout fetching and building.
//!
//! The fetcher treats a `.git` marker as "clone satisfied" and never pulls:
//! a previously fetched checkout is left exactly as the user last saw it.
//! The build artifact is the idempotency marker for the build sub-steps,
//! checked even when the clone was skipped — a hand-restored checkout with
//! an intact `dist/` costs nothing on re-run.

use crate::error::GroundworkError;
use crate::shell::{execute, CommandOptions};
use crate::steps::{RunContext, StepReport};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// An external server project built from a git checkout.
#[derive(Debug, Clone)]
pub struct RepoSpec {
    /// Name used in step reports ("opendata-mcp").
    pub name: String,
    /// Remote clone URL.
    pub remote: String,
    /// Local checkout directory.
    pub target: PathBuf,
    /// Dependency install command, run inside the checkout.
    pub deps_command: String,
    /// Build command, run inside the checkout.
    pub build_command: String,
    /// Expected build output, relative to `target`. Its presence means
    /// "already built".
    pub artifact: PathBuf,
    /// Timeout for the shallow clone.
    pub clone_timeout: Duration,
    /// Timeout for the dependency install.
    pub deps_timeout: Duration,
    /// Timeout for the build.
    pub build_timeout: Duration,
}

impl RepoSpec {
    /// Whether a checkout already exists at the target path.
    pub fn is_cloned(&self) -> bool {
        self.target.join(".git").exists()
    }

    /// Absolute path of the expected build artifact.
    pub fn artifact_path(&self) -> PathBuf {
        self.target.join(&self.artifact)
    }

    /// Whether the build artifact already exists.
    pub fn is_built(&self) -> bool {
        self.artifact_path().exists()
    }

    /// Step name for the clone sub-step.
    pub fn clone_step(&self) -> String {
        format!("clone {}", self.name)
    }

    /// Step name for the dependency-install sub-step.
    pub fn deps_step(&self) -> String {
        format!("{} dependencies", self.name)
    }

    /// Step name for the build sub-step.
    pub fn build_step(&self) -> String {
        format!("build {}", self.name)
    }

    fn clone_command(&self) -> String {
        format!(
            "git clone --depth 1 {} {}",
            self.remote,
            self.target.display()
        )
    }

    fn in_checkout(&self, command: &str) -> String {
        format!("cd {} && {}", self.target.display(), command)
    }
}

/// Ensure the checkout exists. Never updates an existing one.
pub fn ensure_clone(spec: &RepoSpec) -> StepReport {
    let name = spec.clone_step();

    if spec.is_cloned() {
        return StepReport::skipped(&name, "checkout exists (left as-is)");
    }

    let start = Instant::now();

    if let Some(parent) = spec.target.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            return StepReport::failed(
                &name,
                start.elapsed(),
                format!("could not create {}: {}", parent.display(), e),
                spec.clone_command(),
            );
        }
    }

    let options = CommandOptions::timed(spec.clone_timeout);
    match execute(&spec.clone_command(), &options) {
        Ok(result) if result.success => StepReport::succeeded(
            &name,
            result.duration,
            format!("cloned {} (depth 1)", spec.remote),
        ),
        Ok(result) => {
            let detail = if result.timed_out {
                "clone timed out".to_string()
            } else {
                result
                    .stderr_summary()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("git exited {:?}", result.exit_code))
            };
            let error = GroundworkError::CloneFailed {
                remote: spec.remote.clone(),
                message: detail,
            };
            StepReport::failed(&name, result.duration, error.to_string(), spec.clone_command())
        }
        Err(e) => StepReport::failed(&name, start.elapsed(), e.to_string(), spec.clone_command()),
    }
}

/// Ensure dependencies are installed for the checkout.
///
/// Skipped when the artifact already exists (nothing left to build) or when
/// there is no checkout to run in (the clone failed or never happened).
pub fn ensure_deps(spec: &RepoSpec) -> StepReport {
    let name = spec.deps_step();

    if spec.is_built() {
        return StepReport::skipped(
            &name,
            format!("artifact {} already present", spec.artifact.display()),
        );
    }

    if !spec.is_cloned() {
        return StepReport::skipped(
            &name,
            format!("no checkout at {} (clone did not succeed)", spec.target.display()),
        );
    }

    run_in_checkout(spec, &name, &spec.deps_command, spec.deps_timeout)
}

/// Ensure the build has produced its artifact.
///
/// A failed dependency install this run skips the build: the failure the
/// operator needs to fix is the deps command, and reporting a cascading
/// build failure on top of it would point them at the wrong remediation.
pub fn ensure_build(spec: &RepoSpec, ctx: &RunContext) -> StepReport {
    let name = spec.build_step();

    if spec.is_built() {
        return StepReport::skipped(
            &name,
            format!("artifact {} already present", spec.artifact.display()),
        );
    }

    if !spec.is_cloned() {
        return StepReport::skipped(
            &name,
            format!("no checkout at {} (clone did not succeed)", spec.target.display()),
        );
    }

    if ctx.step_failed(&spec.deps_step()) {
        return StepReport::skipped(
            &name,
            "dependency install failed; re-run it before building",
        );
    }

    let report = run_in_checkout(spec, &name, &spec.build_command, spec.build_timeout);

    // Exit 0 without the artifact is its own kind of broken: the command
    // "worked" but the idempotency marker is missing, so the next run will
    // rebuild. Surface that instead of calling it success.
    if report.status == crate::steps::StepStatus::Succeeded && !spec.is_built() {
        return StepReport::warned(
            &name,
            report.duration,
            format!(
                "build exited 0 but {} was not produced",
                spec.artifact.display()
            ),
            spec.in_checkout(&spec.build_command),
        );
    }

    report
}

fn run_in_checkout(spec: &RepoSpec, name: &str, command: &str, timeout: Duration) -> StepReport {
    let start = Instant::now();
    let options = CommandOptions {
        cwd: Some(spec.target.clone()),
        timeout: Some(timeout),
        ..Default::default()
    };

    match execute(command, &options) {
        Ok(result) if result.success => {
            StepReport::succeeded(name, result.duration, format!("{} succeeded", command))
        }
        Ok(result) => {
            let detail = if result.timed_out {
                format!("{} timed out", command)
            } else {
                result
                    .stderr_summary()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("{} exited {:?}", command, result.exit_code))
            };
            let error = GroundworkError::BuildFailed {
                repo: spec.name.clone(),
                step: name.to_string(),
                message: detail,
            };
            StepReport::failed(name, result.duration, error.to_string(), spec.in_checkout(command))
        }
        Err(e) => StepReport::failed(name, start.elapsed(), e.to_string(), spec.in_checkout(command)),
    }
}
