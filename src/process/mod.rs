//! Timeout-bound process execution.
//!
//! This module provides:
//! - [`ExecutableStarter`]: spawns one executable per call, drains stdout
//!   and stderr while waiting for exit, and enforces a single deadline
//! - [`StreamDrain`]: the per-stream drain state machine
//! - [`Arguments`]: argument tokens, passed to the OS without a shell
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use process_starter::ExecutableStarter;
//!
//! # async fn example() -> process_starter::Result<()> {
//! let mut starter = ExecutableStarter::new("docker-compose");
//! let code = starter
//!     .start("-f \"project.yaml\" up --detach", Duration::from_secs(60))
//!     .await?;
//! println!("exit code {code}: {}", starter.standard_output());
//! # Ok(())
//! # }
//! ```

mod arguments;
mod drain;
mod output;
mod report;
mod starter;

use std::future::Future;
use std::time::{Duration, Instant};

pub use arguments::Arguments;
pub use drain::{DrainOutcome, DrainState, LineSource, PipeLines, StreamDrain};
pub use output::OutputBuffer;
pub use report::ExecutionReport;
pub use starter::ExecutableStarter;

use crate::Result;

/// Something that runs a command line and keeps what it printed.
///
/// Command layers depend on this trait rather than on
/// [`ExecutableStarter`], so they can be exercised with a fake.
pub trait ProcessStarter: Send {
    /// Run with `arguments`, bounded by `timeout`, returning the exit code.
    fn start(
        &mut self,
        arguments: Arguments,
        timeout: Duration,
    ) -> impl Future<Output = Result<i32>> + Send;

    /// Captured standard output of the last call.
    fn standard_output(&self) -> &str;

    /// Captured standard error of the last call.
    fn standard_error(&self) -> &str;

    /// Run and snapshot the exit code, both outputs and the elapsed time.
    fn run(
        &mut self,
        arguments: Arguments,
        timeout: Duration,
    ) -> impl Future<Output = Result<ExecutionReport>> + Send {
        async move {
            let started = Instant::now();
            let exit_code = self.start(arguments, timeout).await?;
            Ok(ExecutionReport::new(
                exit_code,
                self.standard_output().to_owned(),
                self.standard_error().to_owned(),
                started.elapsed(),
            ))
        }
    }
}
