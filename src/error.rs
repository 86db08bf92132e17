//! Error types for process-starter.

use std::time::Duration;

use thiserror::Error;

/// Main error type for process-starter operations.
#[derive(Error, Debug)]
pub enum StarterError {
    /// The OS refused or failed to create the process.
    #[error("failed to start executable '{executable}': {source}")]
    Spawn {
        executable: String,
        #[source]
        source: std::io::Error,
    },

    /// Spawn reported success but no usable process handle came back.
    #[error("executable '{executable}' started without a usable process handle")]
    NoProcess { executable: String },

    /// The process did not exit and close both streams before the deadline.
    #[error("process did not finish within {0:?}")]
    Timeout(Duration),

    /// I/O error while reading a pipe or waiting for exit.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The process exited with a non-zero code.
    ///
    /// Never produced by `start` itself; see
    /// [`ExecutionReport::into_result`](crate::ExecutionReport::into_result).
    #[error("process exited with code {code}")]
    NonZeroExit {
        code: i32,
        stdout: String,
        stderr: String,
    },
}

impl StarterError {
    /// Exit code the binary reports for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Spawn { .. } => 127,
            Self::NoProcess { .. } => 126,
            Self::Timeout(_) => 124,
            Self::Io(_) => 1,
            Self::NonZeroExit { code, .. } => *code,
        }
    }

    /// Check if this error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Convenience Result type for process-starter operations.
pub type Result<T> = std::result::Result<T, StarterError>;
