//! The step model: what the orchestrator executes and what it records.
//!
//! - [`Step`] - A named, immutable unit of work
//! - [`StepStatus`] / [`StepReport`] - The per-step outcome record
//! - [`RunContext`] - State threaded through a run (resolved tool paths,
//!   prior step statuses)
//!
//! A step never aborts the run unless it was constructed fatal; none of the
//! shipped bootstrap steps are. Failure is data, collected in the report.

pub mod report;

pub use report::{format_duration, StepReport, StepStatus};

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// State shared across the steps of a single run.
///
/// Earlier steps resolve tool paths that later steps (config rendering)
/// consume; the runner records each step's status here so dependent steps
/// can degrade instead of failing blind.
#[derive(Debug, Default)]
pub struct RunContext {
    tool_paths: HashMap<String, PathBuf>,
    statuses: HashMap<String, StepStatus>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record where a tool's binary resolved.
    pub fn set_tool_path(&mut self, tool: impl Into<String>, path: impl Into<PathBuf>) {
        self.tool_paths.insert(tool.into(), path.into());
    }

    /// Resolved binary path for a tool, if an earlier step found one.
    pub fn tool_path(&self, tool: &str) -> Option<&Path> {
        self.tool_paths.get(tool).map(PathBuf::as_path)
    }

    /// Record a finished step's status. Called by the runner, not by steps.
    pub fn record_status(&mut self, step: impl Into<String>, status: StepStatus) {
        self.statuses.insert(step.into(), status);
    }

    /// Status of an earlier step in this run.
    pub fn status_of(&self, step: &str) -> Option<StepStatus> {
        self.statuses.get(step).copied()
    }

    /// Whether an earlier step ended in Warned or Failed.
    pub fn step_failed(&self, step: &str) -> bool {
        matches!(
            self.status_of(step),
            Some(StepStatus::Warned) | Some(StepStatus::Failed)
        )
    }
}

/// The action a step performs. Runs at most once per run.
pub type StepAction = Box<dyn FnOnce(&mut RunContext) -> StepReport>;

/// A named unit of bootstrap work.
///
/// Immutable once constructed; the orchestrator only executes it. A step
/// with `fatal: true` aborts the run on failure — no shipped step sets it,
/// the flag exists so the plan type can express the distinction.
pub struct Step {
    name: String,
    fatal: bool,
    action: StepAction,
}

impl Step {
    /// Create a non-fatal step.
    ///
    /// Panics on an empty name: a malformed plan is a programming defect,
    /// caught at construction rather than surfacing mid-run.
    pub fn new(name: impl Into<String>, action: StepAction) -> Self {
        let name = name.into();
        assert!(!name.trim().is_empty(), "step name must not be empty");
        Self {
            name,
            fatal: false,
            action,
        }
    }

    /// Mark this step fatal: its failure aborts the whole run.
    pub fn fatal(mut self) -> Self {
        self.fatal = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_fatal(&self) -> bool {
        self.fatal
    }

    /// Execute the step, consuming it.
    pub fn run(self, ctx: &mut RunContext) -> StepReport {
        (self.action)(ctx)
    }
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("fatal", &self.fatal)
            .finish_non_exhaustive()
    }
}
