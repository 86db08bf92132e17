//! Process starter for external executables.

use std::future::Future;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::arguments::Arguments;
use super::drain::{DrainOutcome, PipeLines, StreamDrain};
use super::output::OutputBuffer;
use super::ProcessStarter;
use crate::config::{ConfigError, StarterConfig};
use crate::error::StarterError;
use crate::Result;

/// Deadline used when `now + timeout` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Starts one executable and captures what it writes.
///
/// The executable is fixed at construction; every [`start`](Self::start)
/// spawns a fresh process. Captured output belongs to the most recent call
/// and is only readable between calls, which `&mut self` enforces.
#[derive(Debug)]
pub struct ExecutableStarter {
    executable: String,
    kill_on_timeout: bool,
    stdout: OutputBuffer,
    stderr: OutputBuffer,
}

/// How the exit-wait leg finished.
enum ExitLeg {
    Exited(std::io::Result<ExitStatus>),
    Cancelled,
}

impl ExecutableStarter {
    /// Create a starter for `executable`.
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            kill_on_timeout: true,
            stdout: OutputBuffer::new(),
            stderr: OutputBuffer::new(),
        }
    }

    /// Create a starter from loaded configuration.
    pub fn from_config(config: &StarterConfig) -> std::result::Result<Self, ConfigError> {
        Ok(Self::new(config.executable()?).with_kill_on_timeout(config.kill_on_timeout))
    }

    /// Set whether a timed-out process is killed.
    ///
    /// When disabled the process is released without a signal and may keep
    /// running after the timeout is reported.
    pub fn with_kill_on_timeout(mut self, kill: bool) -> Self {
        self.kill_on_timeout = kill;
        self
    }

    /// The executable this starter runs.
    pub fn executable(&self) -> &str {
        &self.executable
    }

    /// Captured standard output of the last call.
    pub fn standard_output(&self) -> &str {
        self.stdout.as_str()
    }

    /// Captured standard error of the last call.
    pub fn standard_error(&self) -> &str {
        self.stderr.as_str()
    }

    /// Run the executable with `arguments`, bounded by `timeout`.
    ///
    /// Returns the process exit code once the process has exited and both
    /// output streams reached end-of-output. A zero timeout counts as
    /// already expired.
    ///
    /// # Errors
    ///
    /// - [`StarterError::Spawn`] if the process could not be created.
    /// - [`StarterError::NoProcess`] if spawning yielded no usable handle.
    /// - [`StarterError::Timeout`] if the deadline passed first.
    /// - [`StarterError::Io`] if a pipe or the exit status could not be read.
    pub async fn start(
        &mut self,
        arguments: impl Into<Arguments>,
        timeout: Duration,
    ) -> Result<i32> {
        let arguments = arguments.into();
        self.stdout.clear();
        self.stderr.clear();

        debug!(executable = %self.executable, arguments = %arguments, "spawning process");

        let mut child = Command::new(&self.executable)
            .args(arguments.iter())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(self.kill_on_timeout)
            .spawn()
            .map_err(|source| StarterError::Spawn {
                executable: self.executable.clone(),
                source,
            })?;

        // tokio yields a pid and both piped handles right after spawn, so this
        // branch is not reachable from tests.
        let (Some(pid), Some(stdout), Some(stderr)) =
            (child.id(), child.stdout.take(), child.stderr.take())
        else {
            return Err(StarterError::NoProcess {
                executable: self.executable.clone(),
            });
        };

        info!(executable = %self.executable, pid, "process started");

        let cancel = CancellationToken::new();
        if timeout.is_zero() {
            cancel.cancel();
        }
        let now = Instant::now();
        let deadline = now.checked_add(timeout).unwrap_or(now + FAR_FUTURE);

        let (exit, stdout_outcome, stderr_outcome) = race_legs(
            &mut child,
            stdout,
            stderr,
            &mut self.stdout,
            &mut self.stderr,
            deadline,
            &cancel,
        )
        .await;

        let timed_out = matches!(exit, ExitLeg::Cancelled)
            || stdout_outcome.is_cancelled()
            || stderr_outcome.is_cancelled();

        if timed_out {
            warn!(executable = %self.executable, pid, ?timeout, "process timed out");
            let exited = matches!(exit, ExitLeg::Exited(Ok(_)));
            self.release_timed_out(&mut child, pid, exited).await;
            return Err(StarterError::Timeout(timeout));
        }

        for outcome in [stdout_outcome, stderr_outcome] {
            if let DrainOutcome::Failed(e) = outcome {
                return Err(StarterError::Io(e));
            }
        }

        let status = match exit {
            ExitLeg::Exited(status) => status?,
            ExitLeg::Cancelled => return Err(StarterError::Timeout(timeout)),
        };

        let code = exit_code(status);
        info!(executable = %self.executable, pid, exit_code = code, "process exited");
        Ok(code)
    }

    async fn release_timed_out(&self, child: &mut Child, pid: u32, exited: bool) {
        if exited {
            // Something else still holds the pipes open; the child itself is reaped.
            debug!(pid, "process exited but its output streams stayed open");
            return;
        }
        if !self.kill_on_timeout {
            warn!(pid, "leaving timed-out process running");
            return;
        }

        match child.kill().await {
            Ok(()) => debug!(pid, "killed timed-out process"),
            Err(e) => warn!(pid, error = %e, "failed to kill timed-out process"),
        }
    }
}

impl ProcessStarter for ExecutableStarter {
    fn start(
        &mut self,
        arguments: Arguments,
        timeout: Duration,
    ) -> impl Future<Output = Result<i32>> + Send {
        ExecutableStarter::start(self, arguments, timeout)
    }

    fn standard_output(&self) -> &str {
        ExecutableStarter::standard_output(self)
    }

    fn standard_error(&self) -> &str {
        ExecutableStarter::standard_error(self)
    }
}

/// Run the exit-wait leg and both drains until all three settle.
///
/// When the deadline passes first the token is cancelled and the legs are
/// still awaited, so no leg touches a buffer after this returns.
async fn race_legs(
    child: &mut Child,
    stdout: ChildStdout,
    stderr: ChildStderr,
    stdout_sink: &mut OutputBuffer,
    stderr_sink: &mut OutputBuffer,
    deadline: Instant,
    cancel: &CancellationToken,
) -> (ExitLeg, DrainOutcome, DrainOutcome) {
    let mut stdout_drain = StreamDrain::new("stdout", stdout_sink);
    let mut stderr_drain = StreamDrain::new("stderr", stderr_sink);

    let legs = async {
        tokio::join!(
            wait_for_exit(child, cancel),
            stdout_drain.run(PipeLines::new(stdout), cancel),
            stderr_drain.run(PipeLines::new(stderr), cancel),
        )
    };
    tokio::pin!(legs);

    tokio::select! {
        settled = &mut legs => settled,
        _ = tokio::time::sleep_until(deadline) => {
            debug!("deadline elapsed, cancelling legs");
            cancel.cancel();
            legs.await
        }
    }
}

async fn wait_for_exit(child: &mut Child, cancel: &CancellationToken) -> ExitLeg {
    tokio::select! {
        biased;

        _ = cancel.cancelled() => ExitLeg::Cancelled,
        status = child.wait() => ExitLeg::Exited(status),
    }
}

/// Map an exit status to an integer code.
///
/// A Unix process ended by a signal reports `128 + signal`, the same value
/// a shell would show.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    -1
}
