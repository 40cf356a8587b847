//! Process execution utilities
//!
//! Runs the external code generator:
//! - Program lookup on `PATH`
//! - Directory context
//! - Captured or streamed output

use crate::error::{Error, Result};
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
    /// Create from `std::process::Output`
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

/// Run a command in a specific directory and capture output
pub fn run_command_in_dir(program: &Path, args: &[&str], dir: &Path) -> Result<CommandResult> {
    let output = Command::new(program)
        .args(args)
        .current_dir(dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| {
            Error::process(format!("Failed to execute {}: {e}", program.display())).with_source(e)
        })?;

    Ok(CommandResult::from_output(output))
}

/// Run a command in a specific directory, streaming output to the terminal
pub fn run_command_streaming_in_dir(program: &Path, args: &[&str], dir: &Path) -> Result<i32> {
    let status = Command::new(program)
        .args(args)
        .current_dir(dir)
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| {
            Error::process(format!("Failed to execute {}: {e}", program.display())).with_source(e)
        })?;

    Ok(status.code().unwrap_or(-1))
}

/// Get the path to a command
pub fn which_command(program: &str) -> Option<PathBuf> {
    which::which(program).ok()
}

/// Check if a command exists in PATH
pub fn command_exists(program: &str) -> bool {
    which_command(program).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_command_exists_sh() {
        assert!(command_exists("sh"));
    }

    #[test]
    fn test_command_exists_nonexistent() {
        assert!(!command_exists("nonexistent_command_12345"));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_command_in_dir_captures_output() {
        let dir = tempfile::tempdir().unwrap();
        let sh = which_command("sh").unwrap();
        let result = run_command_in_dir(&sh, &["-c", "pwd"], dir.path()).unwrap();
        assert!(result.success);
        assert!(!result.stdout.trim().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_streaming_reports_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let sh = which_command("sh").unwrap();
        let code = run_command_streaming_in_dir(&sh, &["-c", "exit 3"], dir.path()).unwrap();
        assert_eq!(code, 3);
    }

    #[test]
    fn test_combined_output() {
        let result = CommandResult {
            success: false,
            exit_code: 1,
            stdout: "out".to_string(),
            stderr: "err".to_string(),
        };
        assert_eq!(result.combined_output(), "out\nerr");
    }
}
