//! Stream drain coordination.
//!
//! A drain consumes one line-oriented output stream into its
//! [`OutputBuffer`] until the stream reports end-of-output or the shared
//! cancellation token fires, whichever comes first. The notification source
//! is abstracted behind [`LineSource`] so that child pipes and push-style
//! channels drain through the same state machine.

use std::future::Future;
use std::io;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::output::{decode_line, OutputBuffer};

/// A source of line notifications.
///
/// `Ok(None)` is the end-of-output marker. It is distinct from an empty
/// line, which arrives as `Ok(Some(String::new()))`.
pub trait LineSource: Send {
    /// Wait for the next line.
    fn recv_line(&mut self) -> impl Future<Output = io::Result<Option<String>>> + Send;
}

/// Line reader over a raw pipe.
///
/// Lines are split on `\n` and decoded lossily, so a child writing invalid
/// UTF-8 can never fault the drain.
pub struct PipeLines<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin + Send> PipeLines<R> {
    /// Wrap a pipe.
    pub fn new(pipe: R) -> Self {
        Self {
            reader: BufReader::new(pipe),
            buf: Vec::with_capacity(256),
        }
    }
}

impl<R: AsyncRead + Unpin + Send> LineSource for PipeLines<R> {
    fn recv_line(&mut self) -> impl Future<Output = io::Result<Option<String>>> + Send {
        async move {
            self.buf.clear();
            let n = self.reader.read_until(b'\n', &mut self.buf).await?;
            if n == 0 {
                return Ok(None);
            }
            Ok(Some(decode_line(&self.buf)))
        }
    }
}

/// Push-style source: every sender dropping is the end-of-output marker.
impl LineSource for mpsc::Receiver<String> {
    fn recv_line(&mut self) -> impl Future<Output = io::Result<Option<String>>> + Send {
        async move { Ok(self.recv().await) }
    }
}

/// Lifecycle of one drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrainState {
    /// Receiving lines.
    #[default]
    Listening,
    /// End-of-output observed.
    Completed,
    /// Cancellation observed first.
    Cancelled,
    /// Reading the stream failed.
    Faulted,
}

impl DrainState {
    /// Settle into a terminal state.
    ///
    /// Only the first settlement out of `Listening` takes effect; later
    /// calls return `false` and leave the state unchanged.
    pub fn settle(&mut self, target: DrainState) -> bool {
        if *self != DrainState::Listening || target == DrainState::Listening {
            return false;
        }
        *self = target;
        true
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DrainState::Listening)
    }
}

/// How a drain finished.
#[derive(Debug)]
pub enum DrainOutcome {
    /// The stream reached end-of-output.
    Completed,
    /// The cancellation token fired first.
    Cancelled,
    /// The stream could not be read.
    Failed(io::Error),
}

impl DrainOutcome {
    /// Check if the stream was fully drained.
    pub fn is_completed(&self) -> bool {
        matches!(self, DrainOutcome::Completed)
    }

    /// Check if the drain stopped on cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DrainOutcome::Cancelled)
    }
}

/// Drains one stream into its buffer.
pub struct StreamDrain<'a> {
    stream: &'static str,
    sink: &'a mut OutputBuffer,
    state: DrainState,
}

impl<'a> StreamDrain<'a> {
    /// Create a drain writing into `sink`. `stream` names it in logs.
    pub fn new(stream: &'static str, sink: &'a mut OutputBuffer) -> Self {
        Self {
            stream,
            sink,
            state: DrainState::Listening,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DrainState {
        self.state
    }

    /// Consume `source` until end-of-output or cancellation.
    ///
    /// The source is dropped before this returns, so nothing it delivers
    /// afterwards can reach the buffer. Calling `run` again on a settled
    /// drain returns immediately without touching the source.
    pub async fn run<S: LineSource>(
        &mut self,
        mut source: S,
        cancel: &CancellationToken,
    ) -> DrainOutcome {
        let stream = self.stream;
        match self.state {
            DrainState::Listening => {}
            DrainState::Completed => return DrainOutcome::Completed,
            DrainState::Cancelled => return DrainOutcome::Cancelled,
            DrainState::Faulted => {
                return DrainOutcome::Failed(io::Error::other("stream already failed"))
            }
        }

        let mut lines = 0usize;
        let outcome = loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    self.state.settle(DrainState::Cancelled);
                    debug!(stream, lines, "drain cancelled");
                    break DrainOutcome::Cancelled;
                }
                line = source.recv_line() => match line {
                    Ok(Some(line)) => {
                        trace!(stream, "{}", line);
                        self.sink.push_line(&line);
                        lines += 1;
                    }
                    Ok(None) => {
                        self.state.settle(DrainState::Completed);
                        debug!(stream, lines, "end of output");
                        break DrainOutcome::Completed;
                    }
                    Err(e) => {
                        self.state.settle(DrainState::Faulted);
                        warn!(stream, error = %e, "failed to read stream");
                        break DrainOutcome::Failed(e);
                    }
                },
            }
        };

        drop(source);
        outcome
    }
}
