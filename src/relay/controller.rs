//! Relay controller
//!
//! Owns the local listener and the root cancellation token, and exposes
//! the start/stop lifecycle.

use super::connection::serve_connection;
use super::listener::LocalListener;
use crate::config::RelayConfig;
use crate::error::{RelayError, Result};
use crate::socks::UpstreamAuthenticator;
use crate::transport::SocketOpts;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

/// Lifecycle state of a [`SocksRelay`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    /// Configured, nothing bound
    Created,
    /// Listening and accepting
    Started,
    /// Shutdown in progress
    Stopping,
    /// Listener closed, all connections finished
    Stopped,
}

/// The running accept loop
#[derive(Debug)]
struct ListenerHandle {
    local_addr: SocketAddr,
    accept_task: JoinHandle<()>,
}

/// Local relay in front of an authenticated upstream SOCKS5 proxy
#[derive(Debug)]
pub struct SocksRelay {
    config: RelayConfig,
    authenticator: Arc<UpstreamAuthenticator>,
    shutdown: CancellationToken,
    connections: TaskTracker,
    state: RelayState,
    listener: Option<ListenerHandle>,
}

impl SocksRelay {
    /// Create a relay, validating the configuration
    pub fn new(config: RelayConfig) -> Result<Self> {
        config.validate()?;
        let authenticator = Arc::new(UpstreamAuthenticator::from_config(&config)?);

        Ok(SocksRelay {
            config,
            authenticator,
            shutdown: CancellationToken::new(),
            connections: TaskTracker::new(),
            state: RelayState::Created,
            listener: None,
        })
    }

    /// Bind the local listener and start accepting
    ///
    /// Returns the bound local port, which differs from the configured
    /// one when an ephemeral port was requested.
    pub async fn start(&mut self) -> Result<u16> {
        match self.state {
            RelayState::Created => {}
            RelayState::Started | RelayState::Stopping => {
                return Err(RelayError::InvalidState("relay already started"))
            }
            RelayState::Stopped => return Err(RelayError::InvalidState("relay has been stopped")),
        }

        let listen = &self.config.listen;
        let listener = LocalListener::bind(listen.bind_addr, listen.port).await?;
        let local_addr = listener.local_addr();

        let socket_opts = SocketOpts::from_tcp_config(&self.config.tcp);
        let authenticator = self.authenticator.clone();
        let connections = self.connections.clone();
        let root = self.shutdown.clone();

        let accept_task = tokio::spawn(listener.accept_loop(
            self.shutdown.clone(),
            move |stream, peer| {
                socket_opts.hint(&stream);
                let authenticator = authenticator.clone();
                let cancel = root.child_token();
                connections.spawn(async move {
                    serve_connection(stream, peer, &authenticator, cancel).await;
                });
            },
        ));

        info!(
            "Relay listening on {}, upstream {}",
            local_addr,
            self.authenticator.addr()
        );

        self.listener = Some(ListenerHandle {
            local_addr,
            accept_task,
        });
        self.state = RelayState::Started;

        Ok(local_addr.port())
    }

    /// Stop accepting, cancel every live connection and wait for them
    ///
    /// The local socket is closed when this returns. Calling it again, or
    /// on a relay that was never started, does nothing.
    pub async fn stop(&mut self) {
        match self.state {
            RelayState::Created | RelayState::Stopped => return,
            RelayState::Started | RelayState::Stopping => {}
        }

        self.state = RelayState::Stopping;
        self.shutdown.cancel();

        if let Some(handle) = self.listener.take() {
            if let Err(e) = handle.accept_task.await {
                warn!("Accept loop on {} ended abnormally: {}", handle.local_addr, e);
            }
        }

        self.connections.close();
        self.connections.wait().await;

        self.state = RelayState::Stopped;
        info!("Relay stopped");
    }

    /// Current lifecycle state
    pub fn state(&self) -> RelayState {
        self.state
    }

    /// Bound local address while started
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().map(|handle| handle.local_addr)
    }

    /// Bound local port while started
    pub fn local_port(&self) -> Option<u16> {
        self.local_addr().map(|addr| addr.port())
    }

    /// Number of connections currently being handled
    pub fn active_connections(&self) -> usize {
        self.connections.len()
    }

    /// Root cancellation token
    ///
    /// Cancelling it stops the accept loop and every live connection, as
    /// the first half of [`SocksRelay::stop`] does. `stop` must still be
    /// awaited to release the listener handle and drain connections.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}

impl Drop for SocksRelay {
    fn drop(&mut self) {
        self.shutdown.cancel();
        if let Some(handle) = self.listener.take() {
            handle.accept_task.abort();
        }
    }
}
