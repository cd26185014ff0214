//! Shell command execution.
//!
//! Every external process the bootstrap runs (clone, install, build, version
//! query) goes through [`execute`]. Output is always captured, never
//! inherited: a post-create hook has no terminal worth writing to, and
//! captured output can be masked before it reaches any log.

use crate::error::{GroundworkError, Result};
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// How often to poll a running child when a timeout is set.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Result of executing a shell command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal or by timeout).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether command succeeded (exit code 0).
    pub success: bool,

    /// Whether the command was killed because it exceeded its timeout.
    pub timed_out: bool,
}

impl CommandResult {
    /// Create a success result.
    pub fn success(stdout: String, stderr: String, duration: Duration) -> Self {
        Self {
            exit_code: Some(0),
            stdout,
            stderr,
            duration,
            success: true,
            timed_out: false,
        }
    }

    /// Create a failure result.
    pub fn failure(
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
        duration: Duration,
    ) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            duration,
            success: false,
            timed_out: false,
        }
    }

    /// Create a timeout result. A timeout reads exactly like a non-zero
    /// exit to callers that only look at `success`.
    pub fn timeout(stdout: String, stderr: String, duration: Duration) -> Self {
        Self {
            exit_code: None,
            stdout,
            stderr,
            duration,
            success: false,
            timed_out: true,
        }
    }

    /// First non-empty line of stderr, for one-line failure summaries.
    pub fn stderr_summary(&self) -> Option<&str> {
        self.stderr.lines().map(str::trim).find(|l| !l.is_empty())
    }
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory.
    pub cwd: Option<std::path::PathBuf>,

    /// Environment variables (merged with system env).
    pub env: HashMap<String, String>,

    /// Hard timeout. None means wait forever.
    pub timeout: Option<Duration>,
}

impl CommandOptions {
    /// Options with only a timeout set.
    pub fn timed(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..Default::default()
        }
    }
}

/// Execute a shell command, capturing output.
///
/// With a timeout set, the child is polled and killed once the deadline
/// passes; the result then has `timed_out: true` and `success: false`.
pub fn execute(command: &str, options: &CommandOptions) -> Result<CommandResult> {
    let start = Instant::now();

    let shell = detect_shell();

    let mut cmd = Command::new(&shell);
    cmd.arg(shell_flag());
    cmd.arg(command);

    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }

    for (key, value) in &options.env {
        cmd.env(key, value);
    }

    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|_| GroundworkError::ToolAbsent {
        tool: shell.clone(),
        message: format!("could not spawn shell for: {}", command),
    })?;

    // Reader threads drain the pipes while we wait; a full pipe would
    // otherwise deadlock a child that writes more than the buffer holds.
    let stdout_handle = spawn_reader(child.stdout.take());
    let stderr_handle = spawn_reader(child.stderr.take());

    let status = match options.timeout {
        None => Some(child.wait()?),
        Some(limit) => {
            let deadline = start + limit;
            loop {
                if let Some(status) = child.try_wait()? {
                    break Some(status);
                }
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    break None;
                }
                thread::sleep(POLL_INTERVAL);
            }
        }
    };

    let stdout = stdout_handle.join().unwrap_or_default();
    let stderr = stderr_handle.join().unwrap_or_default();
    let duration = start.elapsed();

    match status {
        None => Ok(CommandResult::timeout(stdout, stderr, duration)),
        Some(status) if status.success() => Ok(CommandResult::success(stdout, stderr, duration)),
        Some(status) => Ok(CommandResult::failure(
            status.code(),
            stdout,
            stderr,
            duration,
        )),
    }
}

/// Execute a command and return success/failure.
pub fn execute_check(command: &str, cwd: Option<&std::path::Path>) -> bool {
    let options = CommandOptions {
        cwd: cwd.map(|p| p.to_path_buf()),
        ..Default::default()
    };

    execute(command, &options)
        .map(|r| r.success)
        .unwrap_or(false)
}

fn spawn_reader<R: Read + Send + 'static>(source: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let Some(source) = source else {
            return String::new();
        };
        let reader = BufReader::new(source);
        let mut output = String::new();
        for line in reader.lines().map_while(std::result::Result::ok) {
            output.push_str(&line);
            output.push('\n');
        }
        output
    })
}

/// Detect the current shell.
fn detect_shell() -> String {
    if cfg!(target_os = "windows") {
        std::env::var("COMSPEC").unwrap_or_else(|_| "cmd.exe".to_string())
    } else {
        std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string())
    }
}

/// Get the flag to pass commands to the shell.
///
/// Uses `-lc` (login, non-interactive) on Unix: the bootstrap runs from
/// post-create hooks and CI where `-i` would fail trying to set up job
/// control without a TTY, but a login shell still picks up PATH additions
/// from the user's profile.
fn shell_flag() -> &'static str {
    if cfg!(target_os = "windows") {
        "/C"
    } else {
        "-lc"
    }
}
