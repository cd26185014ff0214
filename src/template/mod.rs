//! Template-driven config rendering.
//!
//! Substitution is literal token replacement, not a templating language:
//! every occurrence of each declared token is replaced by its value, and
//! tokens nobody declared stay verbatim so a partially configured output
//! is still usable by a human. Writes are atomic (temp file + rename); a
//! crash mid-write never leaves a half-written config at the destination.

pub mod builtin;
pub mod values;

pub use values::{resolve, resolve_with_env, ResolvedValue, ValueSource};

use crate::error::GroundworkError;
use crate::steps::StepReport;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

/// Where a template body comes from.
#[derive(Debug, Clone)]
pub enum TemplateSource {
    /// Compiled-in template, by file name under `templates/`.
    Embedded(&'static str),
    /// On-disk template file.
    File(PathBuf),
}

impl TemplateSource {
    fn describe(&self) -> String {
        match self {
            TemplateSource::Embedded(name) => format!("embedded:{}", name),
            TemplateSource::File(path) => path.display().to_string(),
        }
    }

    fn load(&self) -> Option<String> {
        match self {
            TemplateSource::Embedded(name) => builtin::get(name).map(str::to_string),
            TemplateSource::File(path) => std::fs::read_to_string(path).ok(),
        }
    }
}

/// When an existing destination file may be replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwritePolicy {
    /// Never replace an existing file, not even with `--force`.
    Never,
    /// Skip when the destination exists; `--force` re-renders.
    IfAbsent,
    /// Re-render every run.
    Always,
}

/// One token substitution with provenance.
#[derive(Debug, Clone)]
pub struct Mapping {
    /// Literal token to replace (e.g. `__SOCRATA_APP_TOKEN__`).
    pub token: String,
    /// Replacement value.
    pub value: String,
    /// True when the value is a fallback (missing secret, unresolved tool
    /// path) and the rendered config needs hand-editing to actually work.
    pub degraded: bool,
}

impl Mapping {
    pub fn new(token: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            value: value.into(),
            degraded: false,
        }
    }

    pub fn degraded(token: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            value: value.into(),
            degraded: true,
        }
    }

    /// Build a mapping from a resolved secret value.
    pub fn from_resolved(token: impl Into<String>, resolved: &ResolvedValue) -> Self {
        Self {
            token: token.into(),
            value: resolved.value.clone(),
            degraded: resolved.is_placeholder(),
        }
    }
}

/// A config file to materialize.
#[derive(Debug, Clone)]
pub struct TemplateSpec {
    /// Name used in step reports ("render opendata-mcp config").
    pub name: String,
    pub source: TemplateSource,
    pub destination: PathBuf,
    pub mapping: Vec<Mapping>,
    pub overwrite: OverwritePolicy,
}

impl TemplateSpec {
    /// Step name for this render.
    pub fn step_name(&self) -> String {
        format!("render {}", self.name)
    }
}

/// Replace every occurrence of each declared token.
///
/// Unmapped tokens are left verbatim — never an error.
pub fn render_str(template: &str, mapping: &[Mapping]) -> String {
    let mut result = template.to_string();
    for m in mapping {
        result = result.replace(&m.token, &m.value);
    }
    result
}

/// Render a template spec to its destination.
pub fn render(spec: &TemplateSpec, force: bool) -> StepReport {
    let name = spec.step_name();
    let start = Instant::now();

    let exists = spec.destination.exists();
    let skip = match spec.overwrite {
        // `never` protects hand-maintained files outright.
        OverwritePolicy::Never => exists,
        // `if-absent` protects hand-edited configs from being clobbered on
        // re-run, unless the user explicitly forces a re-render.
        OverwritePolicy::IfAbsent => exists && !force,
        OverwritePolicy::Always => false,
    };
    if skip {
        return StepReport::skipped(
            &name,
            format!("{} exists, left untouched", spec.destination.display()),
        );
    }

    let Some(body) = spec.source.load() else {
        let error = GroundworkError::TemplateMissing {
            name: spec.source.describe(),
        };
        return StepReport::failed(&name, start.elapsed(), error.to_string(), "groundwork run");
    };

    let rendered = render_str(&body, &spec.mapping);

    if let Err(e) = write_atomic(&spec.destination, &rendered) {
        let error = GroundworkError::WriteFailed {
            path: spec.destination.clone(),
            message: e.to_string(),
        };
        return StepReport::failed(&name, start.elapsed(), error.to_string(), "groundwork run");
    }

    // Values never appear in messages, degraded or not — only token names.
    let degraded: Vec<&str> = spec
        .mapping
        .iter()
        .filter(|m| m.degraded && body.contains(m.token.as_str()))
        .map(|m| m.token.as_str())
        .collect();

    if degraded.is_empty() {
        StepReport::succeeded(
            &name,
            start.elapsed(),
            format!("wrote {}", spec.destination.display()),
        )
    } else {
        StepReport::warned(
            &name,
            start.elapsed(),
            format!(
                "wrote {} with placeholder value(s) for {}",
                spec.destination.display(),
                degraded.join(", ")
            ),
            format!("edit {} or set the missing values and re-run groundwork run --force",
                spec.destination.display()),
        )
    }
}

/// Write content atomically: temp file in the destination directory, then
/// rename over the target.
fn write_atomic(destination: &std::path::Path, content: &str) -> std::io::Result<()> {
    let parent = destination.parent().unwrap_or_else(|| std::path::Path::new("."));
    std::fs::create_dir_all(parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.persist(destination).map_err(|e| e.error)?;
    Ok(())
}
