//! Capability probing for required tools.
//!
//! A probe answers one question (is this tool usable right now?) without
//! mutating anything. Resolution walks PATH entries directly rather than
//! shelling out to `which`: `which` behavior varies across systems and is
//! sometimes a shell builtin with inconsistent error handling.
//!
//! A tool whose binary resolves but whose version query fails is still
//! [`Capability::Present`], just with an unknown version. Absence of the
//! executable is a signal for the installer, not an error.

use crate::shell::{execute, CommandOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Upper bound on a version query. A tool that takes longer than this to
/// print its version is treated as present with unknown version.
const VERSION_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of probing for a tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    /// The tool resolves to an executable on the search path.
    Present {
        /// Resolved binary path.
        path: PathBuf,
        /// Parsed version, when the version query produced one.
        version: Option<String>,
    },
    /// No executable found.
    Absent,
}

impl Capability {
    /// Whether the tool was found.
    pub fn is_present(&self) -> bool {
        matches!(self, Capability::Present { .. })
    }

    /// Resolved binary path, if present.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Capability::Present { path, .. } => Some(path),
            Capability::Absent => None,
        }
    }

    /// One-line description for status output.
    pub fn describe(&self) -> String {
        match self {
            Capability::Present {
                path,
                version: Some(v),
            } => format!("{} ({})", path.display(), v),
            Capability::Present {
                path,
                version: None,
            } => format!("{} (unknown version)", path.display()),
            Capability::Absent => "not found".to_string(),
        }
    }
}

/// How to probe for one tool.
#[derive(Debug, Clone)]
pub struct VersionProbe {
    /// Binary name to resolve on PATH.
    pub binary: String,
    /// Arguments for the version query (typically `--version`).
    pub version_args: String,
}

impl VersionProbe {
    /// Probe with the conventional `--version` query.
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            version_args: "--version".to_string(),
        }
    }

    /// Probe with custom version-query arguments.
    pub fn with_version_args(mut self, args: impl Into<String>) -> Self {
        self.version_args = args.into();
        self
    }

    /// Detect the tool on the system PATH.
    pub fn detect(&self) -> Capability {
        self.detect_on_path(&parse_system_path())
    }

    /// Detect the tool on an explicit list of directories.
    ///
    /// This is the injectable entry point used by tests.
    pub fn detect_on_path(&self, path_entries: &[PathBuf]) -> Capability {
        let Some(path) = resolve_tool_path(&self.binary, path_entries) else {
            return Capability::Absent;
        };

        let version = query_version(&path, &self.version_args);
        Capability::Present { path, version }
    }
}

/// Check whether a file has executable permission bits set.
#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// On Windows, executability is determined by file extension, not permission bits.
#[cfg(not(unix))]
pub fn is_executable(_path: &Path) -> bool {
    true
}

/// Resolve a tool's binary path by iterating over PATH entries.
///
/// Returns the first match that exists and is executable.
pub fn resolve_tool_path(tool: &str, path_entries: &[PathBuf]) -> Option<PathBuf> {
    for dir in path_entries {
        let candidate = dir.join(tool);
        if candidate.is_file() && is_executable(&candidate) {
            return Some(candidate);
        }
    }
    None
}

/// Parse the system PATH environment variable into a list of directories.
pub fn parse_system_path() -> Vec<PathBuf> {
    std::env::var_os("PATH")
        .map(|path| std::env::split_paths(&path).collect())
        .unwrap_or_default()
}

/// Run the version query against a resolved binary.
///
/// Any failure (spawn error, non-zero exit, timeout, unparseable output)
/// yields None, never Absent.
fn query_version(path: &Path, args: &str) -> Option<String> {
    let command = format!("{} {}", shell_quote(path), args);
    let result = execute(&command, &CommandOptions::timed(VERSION_QUERY_TIMEOUT)).ok()?;
    if !result.success {
        return None;
    }
    // Some tools print the version on stderr (python2 famously did).
    extract_version(&result.stdout).or_else(|| extract_version(&result.stderr))
}

/// Extract a version number from command output.
pub fn extract_version(output: &str) -> Option<String> {
    let patterns = [r"(\d+\.\d+\.\d+)", r"version\s+(\d+\.\d+)", r"v(\d+\.\d+)"];

    for pattern in &patterns {
        if let Ok(re) = regex::Regex::new(pattern) {
            if let Some(caps) = re.captures(output) {
                if let Some(m) = caps.get(1) {
                    return Some(m.as_str().to_string());
                }
            }
        }
    }

    None
}

fn shell_quote(path: &Path) -> String {
    let raw = path.to_string_lossy();
    format!("'{}'", raw.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Create a fake binary at a path (creates parent dirs as needed).
    fn create_fake_binary(path: &Path, body: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
        }
    }

    #[test]
    fn resolve_tool_path_finds_first_match() {
        let temp = TempDir::new().unwrap();
        let dir_a = temp.path().join("a");
        let dir_b = temp.path().join("b");

        create_fake_binary(&dir_a.join("node"), "exit 0");
        create_fake_binary(&dir_b.join("node"), "exit 0");

        let result = resolve_tool_path("node", &[dir_a.clone(), dir_b.clone()]);
        assert_eq!(result, Some(dir_a.join("node")));
    }

    #[test]
    fn resolve_tool_path_returns_none_when_not_found() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("empty");
        fs::create_dir_all(&dir).unwrap();

        let result = resolve_tool_path("node", &[dir]);
        assert!(result.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn resolve_tool_path_skips_non_executable() {
        let temp = TempDir::new().unwrap();
        let dir_a = temp.path().join("a");
        let dir_b = temp.path().join("b");

        fs::create_dir_all(&dir_a).unwrap();
        fs::write(dir_a.join("node"), "not executable").unwrap();
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir_a.join("node"), fs::Permissions::from_mode(0o644)).unwrap();
        create_fake_binary(&dir_b.join("node"), "exit 0");

        let result = resolve_tool_path("node", &[dir_a.clone(), dir_b.clone()]);
        assert_eq!(result, Some(dir_b.join("node")));
    }

    #[test]
    fn is_executable_returns_false_for_nonexistent_file() {
        assert!(!is_executable(Path::new("/nonexistent/path/to/file")));
    }

    #[test]
    fn detect_absent_tool() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("empty");
        fs::create_dir_all(&dir).unwrap();

        let probe = VersionProbe::new("no-such-tool-12345");
        assert_eq!(probe.detect_on_path(&[dir]), Capability::Absent);
    }

    #[cfg(unix)]
    #[test]
    fn detect_present_tool_with_version() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().to_path_buf();
        create_fake_binary(&dir.join("fakenode"), "echo v22.11.0");

        let probe = VersionProbe::new("fakenode");
        let cap = probe.detect_on_path(&[dir.clone()]);

        assert_eq!(
            cap,
            Capability::Present {
                path: dir.join("fakenode"),
                version: Some("22.11.0".to_string()),
            }
        );
    }

    #[cfg(unix)]
    #[test]
    fn failing_version_query_is_still_present() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().to_path_buf();
        create_fake_binary(&dir.join("grumpy"), "exit 3");

        let probe = VersionProbe::new("grumpy");
        let cap = probe.detect_on_path(&[dir.clone()]);

        assert!(cap.is_present());
        assert_eq!(
            cap,
            Capability::Present {
                path: dir.join("grumpy"),
                version: None,
            }
        );
    }

    #[cfg(unix)]
    #[test]
    fn version_on_stderr_is_parsed() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().to_path_buf();
        create_fake_binary(&dir.join("oldpy"), "echo 'Python 2.7.18' >&2");

        let probe = VersionProbe::new("oldpy");
        match probe.detect_on_path(&[dir]) {
            Capability::Present { version, .. } => assert_eq!(version.as_deref(), Some("2.7.18")),
            Capability::Absent => panic!("expected present"),
        }
    }

    #[test]
    fn extract_version_semver() {
        let output = "node v22.11.0 (build abc)";
        assert_eq!(extract_version(output), Some("22.11.0".to_string()));
    }

    #[test]
    fn extract_version_with_v() {
        assert_eq!(extract_version("v18.17"), Some("18.17".to_string()));
    }

    #[test]
    fn extract_version_no_match() {
        assert!(extract_version("no version here").is_none());
    }

    #[test]
    fn describe_present_with_version() {
        let cap = Capability::Present {
            path: PathBuf::from("/usr/bin/node"),
            version: Some("22.11.0".to_string()),
        };
        let s = cap.describe();
        assert!(s.contains("/usr/bin/node"));
        assert!(s.contains("22.11.0"));
    }

    #[test]
    fn describe_absent() {
        assert_eq!(Capability::Absent.describe(), "not found");
    }
}
