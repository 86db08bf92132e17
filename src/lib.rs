//! # process-starter
//!
//! Timeout-bound runner for external command-line executables.
//!
//! This crate starts an executable, drains its standard output and standard
//! error into memory while waiting for it to exit, and bounds the whole
//! invocation by one deadline. It is meant to sit under command objects that
//! assemble argument strings for a CLI such as `docker-compose` and need the
//! exit code plus the captured text back.
//!
//! ## Features
//!
//! - **Single deadline**: one cancellation token shared by the exit wait and
//!   both stream drains
//! - **No shell**: argument strings are tokenized and passed as a vector
//! - **Deterministic cleanup**: every leg has settled and the child is
//!   reaped (or killed on timeout) before a call returns
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use process_starter::{ExecutableStarter, StarterError};
//!
//! #[tokio::main]
//! async fn main() -> process_starter::Result<()> {
//!     process_starter::logging::try_init().ok();
//!
//!     let mut starter = ExecutableStarter::new("docker");
//!     match starter.start("--version", Duration::from_secs(5)).await {
//!         Ok(code) => println!("exit {code}: {}", starter.standard_output()),
//!         Err(StarterError::Timeout(d)) => eprintln!("gave up after {d:?}"),
//!         Err(e) => return Err(e),
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod process;

// Re-export commonly used types
pub use config::{ConfigError, StarterConfig};
pub use error::{Result, StarterError};
pub use process::{
    Arguments, DrainOutcome, DrainState, ExecutableStarter, ExecutionReport, LineSource,
    OutputBuffer, PipeLines, ProcessStarter, StreamDrain,
};
