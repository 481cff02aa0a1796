//! Relay session
//!
//! Copies bytes between a negotiated client and an authenticated upstream
//! until the first direction ends, then cancels the other one.

use crate::helper::DEFAULT_BUFFER_SIZE;
use std::fmt;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Copy direction within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Client to upstream proxy
    ClientToUpstream,
    /// Upstream proxy to client
    UpstreamToClient,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::ClientToUpstream => write!(f, "client->upstream"),
            Direction::UpstreamToClient => write!(f, "upstream->client"),
        }
    }
}

/// How one copy direction ended
#[derive(Debug)]
pub enum PipeEnd {
    /// The reader reached end-of-stream
    Eof,
    /// The session was cancelled
    Cancelled,
    /// A read or write failed
    Failed(io::Error),
}

/// Result of one copy direction
#[derive(Debug)]
pub struct PipeOutcome {
    /// Bytes written to the destination
    pub bytes: u64,
    /// Why the copy stopped
    pub end: PipeEnd,
}

impl fmt::Display for PipeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.end {
            PipeEnd::Eof => write!(f, "{} bytes, eof", self.bytes),
            PipeEnd::Cancelled => write!(f, "{} bytes, cancelled", self.bytes),
            PipeEnd::Failed(e) => write!(f, "{} bytes, error: {}", self.bytes, e),
        }
    }
}

/// Final accounting of a session
#[derive(Debug)]
pub struct SessionSummary {
    /// Direction that terminated first
    pub first_finished: Direction,
    /// Client to upstream outcome
    pub client_to_upstream: PipeOutcome,
    /// Upstream to client outcome
    pub upstream_to_client: PipeOutcome,
}

/// One client paired with one authenticated upstream
pub struct Session<C, U> {
    client: C,
    upstream: U,
    cancel: CancellationToken,
}

impl<C, U> Session<C, U>
where
    C: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    U: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Create a session
    ///
    /// `cancel` must be scoped to this session (typically a child of the
    /// relay's root token): the session cancels it when the first direction
    /// ends.
    pub fn new(client: C, upstream: U, cancel: CancellationToken) -> Self {
        Session {
            client,
            upstream,
            cancel,
        }
    }

    /// The session's cancellation token
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Relay until either direction ends, then tear down both streams
    pub async fn run(self) -> SessionSummary {
        let (client_read, client_write) = tokio::io::split(self.client);
        let (upstream_read, upstream_write) = tokio::io::split(self.upstream);

        let mut client_to_upstream =
            tokio::spawn(pipe(client_read, upstream_write, self.cancel.clone()));
        let mut upstream_to_client =
            tokio::spawn(pipe(upstream_read, client_write, self.cancel.clone()));

        let (first_finished, first) = tokio::select! {
            result = &mut client_to_upstream => (Direction::ClientToUpstream, result),
            result = &mut upstream_to_client => (Direction::UpstreamToClient, result),
        };

        self.cancel.cancel();

        // Both halves of each stream are dropped once both tasks are joined
        let (c2u, u2c) = match first_finished {
            Direction::ClientToUpstream => (first, upstream_to_client.await),
            Direction::UpstreamToClient => (client_to_upstream.await, first),
        };

        let summary = SessionSummary {
            first_finished,
            client_to_upstream: joined(c2u),
            upstream_to_client: joined(u2c),
        };

        debug!(
            "Session closed ({} first): client->upstream {}; upstream->client {}",
            summary.first_finished, summary.client_to_upstream, summary.upstream_to_client
        );

        summary
    }
}

fn joined(result: Result<PipeOutcome, tokio::task::JoinError>) -> PipeOutcome {
    result.unwrap_or_else(|e| PipeOutcome {
        bytes: 0,
        end: PipeEnd::Failed(io::Error::new(io::ErrorKind::Other, e.to_string())),
    })
}

/// Read-then-write loop from `reader` into `writer`
///
/// Every read and write races `cancel`. On EOF the writer is shut down so
/// the peer sees the half-close.
async fn pipe<R, W>(mut reader: R, mut writer: W, cancel: CancellationToken) -> PipeOutcome
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; DEFAULT_BUFFER_SIZE];
    let mut bytes = 0u64;

    let end = loop {
        let n = tokio::select! {
            _ = cancel.cancelled() => break PipeEnd::Cancelled,
            result = reader.read(&mut buf) => match result {
                Ok(0) => {
                    let _ = writer.shutdown().await;
                    break PipeEnd::Eof;
                }
                Ok(n) => n,
                Err(e) => break PipeEnd::Failed(e),
            },
        };

        tokio::select! {
            _ = cancel.cancelled() => break PipeEnd::Cancelled,
            result = writer.write_all(&buf[..n]) => {
                if let Err(e) = result {
                    break PipeEnd::Failed(e);
                }
            }
        }

        bytes += n as u64;
    };

    PipeOutcome { bytes, end }
}
