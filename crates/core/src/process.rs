//! Process execution utilities
//!
//! Hooks shell out to a small set of external tools: `git` for branch
//! resolution, `tar` for unpacking release archives, and delegated hook
//! binaries whose output is streamed straight to the terminal.

use crate::error::{Error, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

/// Result of a command execution
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Whether the command succeeded (exit code 0)
    pub success: bool,
    /// Exit code of the command
    pub exit_code: i32,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
}

impl CommandResult {
    /// Create from std::process::Output
    pub fn from_output(output: Output) -> Self {
        Self {
            success: output.status.success(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }

    /// Get combined output (stdout + stderr)
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

fn spawn_error(program: &OsStr, err: &std::io::Error) -> Error {
    let name = program.to_string_lossy();
    if err.kind() == std::io::ErrorKind::NotFound {
        Error::command_not_found(&name)
    } else {
        Error::process(format!("Failed to execute {}: {}", name, err))
    }
}

/// Run a command and capture output
pub fn run_command<S: AsRef<OsStr>>(program: impl AsRef<OsStr>, args: &[S]) -> Result<CommandResult> {
    let program = program.as_ref();
    let output = Command::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| spawn_error(program, &e))?;

    Ok(CommandResult::from_output(output))
}

/// Run a command in a specific directory
pub fn run_command_in_dir<S: AsRef<OsStr>>(
    program: impl AsRef<OsStr>,
    args: &[S],
    dir: &Path,
) -> Result<CommandResult> {
    let program = program.as_ref();
    let output = Command::new(program)
        .args(args)
        .current_dir(dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| spawn_error(program, &e))?;

    Ok(CommandResult::from_output(output))
}

/// Run a command and stream output to stdout/stderr, returning its exit code
///
/// A process killed by a signal has no exit code and reports `-1`.
pub fn run_command_streaming<S: AsRef<OsStr>>(program: impl AsRef<OsStr>, args: &[S]) -> Result<i32> {
    let program = program.as_ref();
    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| spawn_error(program, &e))?;

    Ok(status.code().unwrap_or(-1))
}

/// Get the path to a command, or a `CommandNotFound` error
pub fn require_command(program: &str) -> Result<PathBuf> {
    which::which(program).map_err(|_| Error::command_not_found(program))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_require_command_nonexistent() {
        let err = require_command("nonexistent_command_12345").unwrap_err();
        assert_eq!(err.code, ErrorCode::CommandNotFound);
    }

    #[cfg(unix)]
    #[test]
    fn test_run_command_echo() {
        let result = run_command("echo", &["hello"]).unwrap();
        assert!(result.success);
        assert!(result.stdout.contains("hello"));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_command_in_dir_uses_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "").unwrap();
        let result = run_command_in_dir("ls", &["marker.txt"], dir.path()).unwrap();
        assert!(result.success);
    }

    #[test]
    fn test_run_missing_program_is_command_not_found() {
        let err = run_command("nonexistent_command_12345", &["--version"]).unwrap_err();
        assert_eq!(err.code, ErrorCode::CommandNotFound);
    }

    #[test]
    fn test_command_result_combined_output() {
        let result = CommandResult {
            success: true,
            exit_code: 0,
            stdout: "out".to_string(),
            stderr: "err".to_string(),
        };
        assert!(result.combined_output().contains("out"));
        assert!(result.combined_output().contains("err"));
    }
}
