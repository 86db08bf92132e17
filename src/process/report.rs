//! Execution report types.

use std::time::Duration;

use crate::error::StarterError;

/// Snapshot of one finished invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Exit code reported by the process.
    pub exit_code: i32,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Wall time of the invocation.
    pub duration: Duration,
}

impl ExecutionReport {
    /// Create a new execution report.
    pub fn new(exit_code: i32, stdout: String, stderr: String, duration: Duration) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            duration,
        }
    }

    /// Check if the process exited with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Check if the process exited with a non-zero code.
    pub fn failed(&self) -> bool {
        !self.success()
    }

    /// Get stdout as string, trimmed.
    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }

    /// Get stdout lines.
    pub fn stdout_lines(&self) -> impl Iterator<Item = &str> {
        self.stdout.lines()
    }

    /// Get stderr lines.
    pub fn stderr_lines(&self) -> impl Iterator<Item = &str> {
        self.stderr.lines()
    }

    /// Turn a non-zero exit into [`StarterError::NonZeroExit`].
    ///
    /// The error keeps the captured text so callers can report it.
    pub fn into_result(self) -> Result<Self, StarterError> {
        if self.success() {
            Ok(self)
        } else {
            Err(StarterError::NonZeroExit {
                code: self.exit_code,
                stdout: self.stdout,
                stderr: self.stderr,
            })
        }
    }
}
