//! Per-step outcome records.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Terminal status of a step within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Idempotency predicate held; nothing to do.
    Skipped,

    /// Step ran and succeeded.
    Succeeded,

    /// Step ran with a degraded result worth flagging.
    Warned,

    /// Step ran and failed. Non-fatal unless the step was declared fatal.
    Failed,
}

impl StepStatus {
    /// Whether this status contributes to the warnings list.
    pub fn is_warning(&self) -> bool {
        matches!(self, StepStatus::Warned | StepStatus::Failed)
    }

    /// Get a display character for this status.
    pub fn display_char(&self) -> char {
        match self {
            StepStatus::Skipped => '⊘',
            StepStatus::Succeeded => '✓',
            StepStatus::Warned => '!',
            StepStatus::Failed => '✗',
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StepStatus::Skipped => "skipped",
            StepStatus::Succeeded => "succeeded",
            StepStatus::Warned => "warned",
            StepStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Record of one step's execution. Produced once per step per run; the
/// retry mechanism is re-running the whole bootstrap, which is safe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    /// Step name.
    pub name: String,

    /// Terminal status.
    pub status: StepStatus,

    /// Human-readable outcome description.
    pub message: String,

    /// Execution duration.
    #[serde(with = "duration_ms")]
    pub duration: Duration,

    /// Exact command to re-run just this step, present on Warned/Failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl StepReport {
    /// Create a skipped report.
    pub fn skipped(name: &str, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: StepStatus::Skipped,
            message: message.into(),
            duration: Duration::ZERO,
            remediation: None,
        }
    }

    /// Create a success report.
    pub fn succeeded(name: &str, duration: Duration, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: StepStatus::Succeeded,
            message: message.into(),
            duration,
            remediation: None,
        }
    }

    /// Create a warned report.
    pub fn warned(
        name: &str,
        duration: Duration,
        message: impl Into<String>,
        remediation: impl Into<String>,
    ) -> Self {
        Self {
            name: name.to_string(),
            status: StepStatus::Warned,
            message: message.into(),
            duration,
            remediation: Some(remediation.into()),
        }
    }

    /// Create a failure report.
    pub fn failed(
        name: &str,
        duration: Duration,
        message: impl Into<String>,
        remediation: impl Into<String>,
    ) -> Self {
        Self {
            name: name.to_string(),
            status: StepStatus::Failed,
            message: message.into(),
            duration,
            remediation: Some(remediation.into()),
        }
    }

    /// Generate a summary line for display.
    pub fn summary_line(&self) -> String {
        match self.status {
            StepStatus::Succeeded => format!(
                "{} {} ({})",
                self.status.display_char(),
                self.name,
                format_duration(self.duration)
            ),
            StepStatus::Skipped => {
                format!("{} {} ({})", self.status.display_char(), self.name, self.message)
            }
            StepStatus::Warned | StepStatus::Failed => {
                format!("{} {} - {}", self.status.display_char(), self.name, self.message)
            }
        }
    }

    /// Warning text for the run report's warnings list.
    ///
    /// Includes the remediation command so a user can re-run the one failed
    /// step without repeating the whole bootstrap.
    pub fn warning_line(&self) -> Option<String> {
        if !self.status.is_warning() {
            return None;
        }
        let mut line = format!("{}: {}", self.name, self.message);
        if let Some(fix) = &self.remediation {
            line.push_str(&format!(" (retry with: {})", fix));
        }
        Some(line)
    }
}

/// Serialize a Duration as integer milliseconds.
pub(crate) mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let ms = u64::deserialize(d)?;
        Ok(Duration::from_millis(ms))
    }
}

/// Format a duration for display.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if secs == 0 {
        format!("{}ms", millis)
    } else if secs < 60 {
        format!("{}.{}s", secs, millis / 100)
    } else {
        let mins = secs / 60;
        let secs = secs % 60;
        format!("{}m {}s", mins, secs)
    }
}
