//! Bootstrap orchestration.
//!
//! The orchestrator's contract is blunt: `Start → [Step₁ … Stepₙ] → Ready`.
//! Steps execute sequentially in declared order; a failed step is recorded
//! and the run continues, because a half-working environment a user can
//! finish by hand beats an aborted one. The only thing that stops a run
//! early is a step explicitly constructed fatal, and the shipped plan has
//! none.

pub mod report;

pub use report::{Outcome, RunReport};

use crate::secrets::OutputMasker;
use crate::steps::{RunContext, Step};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Options for running the step sequence.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Show a spinner per step (off for quiet/non-tty runs).
    pub show_progress: bool,
}

/// Execute steps in order and assemble the run report.
///
/// Panics on duplicate step names: two steps with one name would make the
/// report and the context ambiguous, and a malformed plan is a programming
/// defect to catch at startup, not a runtime failure mode.
pub fn execute(steps: Vec<Step>, masker: &OutputMasker, options: &RunOptions) -> RunReport {
    let mut seen = HashSet::new();
    for step in &steps {
        assert!(
            seen.insert(step.name().to_string()),
            "duplicate step name: '{}'",
            step.name()
        );
    }

    let started_at = Utc::now();
    let start = Instant::now();
    let total = steps.len();

    let mut ctx = RunContext::new();
    let mut reports = Vec::with_capacity(total);
    let mut warnings = Vec::new();

    for (index, step) in steps.into_iter().enumerate() {
        let name = step.name().to_string();
        let fatal = step.is_fatal();

        let spinner = if options.show_progress {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::with_template("{spinner} [{prefix}] {msg}")
                    .expect("static spinner template"),
            );
            pb.set_prefix(format!("{}/{}", index + 1, total));
            pb.set_message(name.clone());
            pb.enable_steady_tick(Duration::from_millis(100));
            Some(pb)
        } else {
            None
        };

        tracing::info!(step = %name, "starting");
        let mut report = step.run(&mut ctx);

        // Report text reaches logs and stdout; everything passes through
        // the masker, whatever a subprocess may have echoed back.
        report.message = masker.mask(&report.message);
        report.remediation = report.remediation.map(|r| masker.mask(&r));

        tracing::info!(step = %name, status = %report.status, "finished");
        ctx.record_status(&name, report.status);

        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        let aborts = fatal && report.status.is_warning();
        warnings.extend(report.warning_line());
        reports.push(report);

        if aborts {
            tracing::error!(step = %name, "fatal step failed, aborting run");
            warnings.push(format!("run aborted by fatal step '{}'", name));
            break;
        }
    }

    RunReport {
        started_at,
        duration: start.elapsed(),
        steps: reports,
        warnings,
        outcome: Outcome::Ready,
    }
}
