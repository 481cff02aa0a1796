//! Local listener
//!
//! Binds the client-facing TCP socket and runs the accept loop.

use crate::error::{RelayError, Result};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Pause after a failed accept (e.g. file descriptor exhaustion)
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// Bound client-facing socket
#[derive(Debug)]
pub struct LocalListener {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl LocalListener {
    /// Bind to `addr:port`; port 0 asks the OS for an ephemeral port
    pub async fn bind(addr: IpAddr, port: u16) -> Result<Self> {
        let requested = SocketAddr::new(addr, port);
        let bind_error = |source| RelayError::Bind {
            addr: requested.to_string(),
            source,
        };

        let listener = TcpListener::bind(requested).await.map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;

        Ok(LocalListener {
            listener,
            local_addr,
        })
    }

    /// Resolved local address
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Resolved local port
    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Accept connections until `shutdown` is cancelled
    ///
    /// Each accepted stream is passed to `on_accept`, which must not block;
    /// it is expected to spawn the connection's handling. The socket is
    /// closed when this returns.
    pub async fn accept_loop<F>(self, shutdown: CancellationToken, mut on_accept: F)
    where
        F: FnMut(TcpStream, SocketAddr),
    {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                result = self.listener.accept() => match result {
                    Ok((stream, peer)) => {
                        debug!("Accepted connection from {}", peer);
                        on_accept(stream, peer);
                    }
                    Err(e) => {
                        error!("Accept error on {}: {}", self.local_addr, e);
                        tokio::select! {
                            _ = shutdown.cancelled() => break,
                            _ = tokio::time::sleep(ACCEPT_ERROR_BACKOFF) => {}
                        }
                    }
                }
            }
        }

        info!("Listener on {} closed", self.local_addr);
    }
}
