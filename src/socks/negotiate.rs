//! Client-facing method negotiation
//!
//! Answers the client's SOCKS5 greeting with "no authentication required"
//! and nothing more. The client's command request that follows is left in
//! the stream for the upstream proxy to interpret.

use super::consts::*;
use crate::error::{RelayError, Result};
use crate::helper::{hex, read_full};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

/// Consume the client's method-negotiation request and select no-auth
///
/// Returns the number of methods the client offered. The offered method
/// list is drained and discarded; a short method list is tolerated.
pub async fn negotiate_client<S>(stream: &mut S) -> Result<u8>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut header = [0u8; 2];
    let n = read_full(stream, &mut header).await?;
    if n < header.len() {
        return Err(RelayError::Protocol(format!(
            "short negotiation request: got {} of 2 bytes [{}]",
            n,
            hex(&header[..n])
        )));
    }

    if header[0] != SOCKS5_VERSION {
        return Err(RelayError::Protocol(format!(
            "not SOCKS5: version byte {:#04x}",
            header[0]
        )));
    }

    let num_methods = header[1] as usize;
    let mut methods = [0u8; u8::MAX as usize];
    let read = read_full(stream, &mut methods[..num_methods]).await?;
    if read < num_methods {
        warn!(
            "Client offered {} methods but sent only {} before EOF",
            num_methods, read
        );
    }

    debug!(
        "Client negotiation [{}] methods [{}]",
        hex(&header),
        hex(&methods[..read])
    );

    stream.write_all(&CLIENT_METHOD_REPLY).await?;
    stream.flush().await?;

    Ok(header[1])
}
