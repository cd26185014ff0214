//! The run report: everything a bootstrap run has to say for itself.

use crate::steps::report::duration_ms;
use crate::steps::{format_duration, StepReport, StepStatus};
use chrono::{DateTime, Utc};
use console::style;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Terminal outcome of a run. There is exactly one: the orchestrator has no
/// failed terminal state — failure lives in the warnings list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Ready,
}

/// Full record of one bootstrap run. Created fresh each invocation and
/// discarded after printing; the filesystem carries all persistent state.
#[derive(Debug, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
    pub steps: Vec<StepReport>,
    pub warnings: Vec<String>,
    pub outcome: Outcome,
}

impl RunReport {
    /// Whether any step warned or failed.
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Count of steps with a given status.
    pub fn count(&self, status: StepStatus) -> usize {
        self.steps.iter().filter(|s| s.status == status).count()
    }

    /// Serialize for `--report json`.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Render the human-readable summary.
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        for step in &self.steps {
            let line = step.summary_line();
            let styled = match step.status {
                StepStatus::Succeeded => style(line).green().to_string(),
                StepStatus::Skipped => style(line).dim().to_string(),
                StepStatus::Warned => style(line).yellow().to_string(),
                StepStatus::Failed => style(line).red().to_string(),
            };
            out.push_str(&styled);
            out.push('\n');
        }

        out.push('\n');
        if self.warnings.is_empty() {
            out.push_str(&format!(
                "{} Environment ready in {}\n",
                style("✓").green().bold(),
                format_duration(self.duration)
            ));
        } else {
            out.push_str(&format!(
                "{} Environment ready in {} with {} warning(s):\n",
                style("!").yellow().bold(),
                format_duration(self.duration),
                self.warnings.len()
            ));
            for warning in &self.warnings {
                out.push_str(&format!("  {} {}\n", style("•").yellow(), warning));
            }
        }

        out
    }
}
