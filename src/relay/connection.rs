//! Per-connection pipeline
//!
//! Upstream authentication, then client negotiation, then the session.
//! Each phase races the connection's cancellation token.

use super::session::{Session, SessionSummary};
use crate::error::Result;
use crate::socks::{negotiate_client, UpstreamAuthenticator};
use std::net::SocketAddr;
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, warn, Instrument};

/// Drive one accepted client through the relay
///
/// Returns `Ok(None)` if `cancel` fired before the session started.
/// Dropping the streams on any early return closes them.
pub async fn handle_connection(
    mut client: TcpStream,
    authenticator: &UpstreamAuthenticator,
    cancel: CancellationToken,
) -> Result<Option<SessionSummary>> {
    let upstream = tokio::select! {
        _ = cancel.cancelled() => return Ok(None),
        result = authenticator.connect() => result?,
    };

    tokio::select! {
        _ = cancel.cancelled() => return Ok(None),
        result = negotiate_client(&mut client) => { result?; }
    }

    Ok(Some(Session::new(client, upstream, cancel).run().await))
}

/// Run [`handle_connection`] and log its outcome
///
/// Errors stop here; they never reach the accept loop.
pub(crate) async fn serve_connection(
    client: TcpStream,
    peer: SocketAddr,
    authenticator: &UpstreamAuthenticator,
    cancel: CancellationToken,
) {
    let span = info_span!("connection", %peer);

    async move {
        match handle_connection(client, authenticator, cancel).await {
            Ok(Some(summary)) => debug!(
                "Connection finished: sent {} bytes, received {} bytes",
                summary.client_to_upstream.bytes, summary.upstream_to_client.bytes
            ),
            Ok(None) => debug!("Connection cancelled during handshake"),
            Err(e) if e.is_transport() => debug!("Connection dropped: {}", e),
            Err(e) => warn!("Connection aborted: {}", e),
        }
    }
    .instrument(span)
    .await
}
