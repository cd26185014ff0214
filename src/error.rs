//! Error types for Groundwork operations.
//!
//! This module defines [`GroundworkError`], the primary error type used
//! throughout the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Every variant here is recoverable at the orchestrator level: it becomes
//!   a warning in the run report, never a nonzero exit
//! - Use `anyhow::Error` (via `GroundworkError::Other`) for unexpected errors
//! - All errors should carry the exact command a user can re-run

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for Groundwork operations.
#[derive(Debug, Error)]
pub enum GroundworkError {
    /// A required tool is not on PATH and was not installed.
    #[error("Tool '{tool}' not found: {message}")]
    ToolAbsent { tool: String, message: String },

    /// Every installation strategy for a tool failed.
    #[error("Failed to install '{tool}': {message}")]
    InstallFailed { tool: String, message: String },

    /// Shallow clone of a source repository failed.
    #[error("Failed to clone {remote}: {message}")]
    CloneFailed { remote: String, message: String },

    /// Dependency install or build command for a checkout failed.
    #[error("Build step '{step}' failed for {repo}: {message}")]
    BuildFailed {
        repo: String,
        step: String,
        message: String,
    },

    /// Template source missing (embedded name unknown or file absent).
    #[error("Template not found: {name}")]
    TemplateMissing { name: String },

    /// Rendered config could not be written to its destination.
    #[error("Failed to write {path}: {message}")]
    WriteFailed { path: PathBuf, message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for Groundwork operations.
pub type Result<T> = std::result::Result<T, GroundworkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_absent_displays_tool_and_message() {
        let err = GroundworkError::ToolAbsent {
            tool: "node".into(),
            message: "not on PATH".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("node"));
        assert!(msg.contains("not on PATH"));
    }

    #[test]
    fn install_failed_displays_tool() {
        let err = GroundworkError::InstallFailed {
            tool: "github-mcp".into(),
            message: "all strategies exhausted".into(),
        };
        assert!(err.to_string().contains("github-mcp"));
    }

    #[test]
    fn clone_failed_displays_remote() {
        let err = GroundworkError::CloneFailed {
            remote: "https://github.com/org/opendata-mcp.git".into(),
            message: "exit code 128".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("opendata-mcp"));
        assert!(msg.contains("128"));
    }

    #[test]
    fn build_failed_distinguishes_step() {
        let deps = GroundworkError::BuildFailed {
            repo: "opendata-mcp".into(),
            step: "install dependencies".into(),
            message: "npm exited 1".into(),
        };
        let build = GroundworkError::BuildFailed {
            repo: "opendata-mcp".into(),
            step: "build".into(),
            message: "tsc exited 2".into(),
        };
        assert!(deps.to_string().contains("install dependencies"));
        assert!(build.to_string().contains("'build'"));
    }

    #[test]
    fn template_missing_displays_name() {
        let err = GroundworkError::TemplateMissing {
            name: "opendata-mcp.json.tmpl".into(),
        };
        assert!(err.to_string().contains("opendata-mcp.json.tmpl"));
    }

    #[test]
    fn write_failed_displays_path() {
        let err = GroundworkError::WriteFailed {
            path: PathBuf::from("/cfg/opendata-mcp.json"),
            message: "permission denied".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/cfg/opendata-mcp.json"));
        assert!(msg.contains("permission denied"));
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: GroundworkError = io_err.into();
        assert!(matches!(err, GroundworkError::Io(_)));
    }

    #[test]
    fn result_type_alias_works() {
        fn returns_error() -> Result<()> {
            Err(GroundworkError::TemplateMissing {
                name: "test".into(),
            })
        }
        assert!(returns_error().is_err());
    }
}
