//! Configuration management for process-starter.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cli::Args;

/// Default execution timeout: one day.
pub const DEFAULT_TIMEOUT_MS: u64 = 24 * 60 * 60 * 1000;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarterConfig {
    /// Executable to start. Resolved through `PATH` unless absolute.
    pub executable: Option<String>,
    /// Execution timeout in milliseconds.
    pub timeout_ms: u64,
    /// Kill the process when the timeout elapses.
    pub kill_on_timeout: bool,
    /// Logging configuration.
    pub logging: LoggingSection,
}

impl Default for StarterConfig {
    fn default() -> Self {
        Self {
            executable: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            kill_on_timeout: true,
            logging: LoggingSection::default(),
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace) or a full filter directive.
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl StarterConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars<F>(&mut self, var: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(executable) = var("PROCESS_STARTER_EXECUTABLE") {
            if !executable.is_empty() {
                self.executable = Some(executable);
            }
        }

        if let Some(timeout) = var("PROCESS_STARTER_TIMEOUT_MS") {
            self.timeout_ms = timeout
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout(timeout))?;
        }

        if let Some(kill) = var("PROCESS_STARTER_KILL_ON_TIMEOUT") {
            self.kill_on_timeout = !matches!(
                kill.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "no" | "off"
            );
        }

        if let Some(level) = var("PROCESS_STARTER_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Some(level) = var("RUST_LOG") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(ref executable) = args.executable {
            self.executable = Some(executable.clone());
        }

        if let Some(timeout_ms) = args.timeout_ms {
            self.timeout_ms = timeout_ms;
        }

        if args.no_kill {
            self.kill_on_timeout = false;
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match args.config {
            Some(ref path) => StarterConfig::from_file(path)?,
            None => StarterConfig::default(),
        };

        config.apply_env()?;
        config.apply_args(args);

        Ok(config)
    }

    /// The configured executable.
    pub fn executable(&self) -> Result<&str, ConfigError> {
        self.executable
            .as_deref()
            .filter(|e| !e.is_empty())
            .ok_or(ConfigError::MissingExecutable)
    }

    /// The configured timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// No executable configured.
    MissingExecutable,
    /// Timeout value is not a whole number of milliseconds.
    InvalidTimeout(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::MissingExecutable => write!(f, "no executable configured"),
            Self::InvalidTimeout(value) => {
                write!(f, "invalid timeout in milliseconds: '{}'", value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
