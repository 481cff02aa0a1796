//! TCP transport implementation
//!
//! Provides the plain TCP connection to the upstream proxy.

use super::SocketOpts;
use crate::error::{RelayError, Result};
use std::io;
use std::time::Duration;
use tokio::net::TcpStream;

/// Open a TCP connection to `host:port`
///
/// Name resolution is whatever the runtime's connect primitive does. With
/// `timeout` unset the connect waits as long as the OS does.
pub async fn connect_upstream(
    host: &str,
    port: u16,
    opts: &SocketOpts,
    timeout: Option<Duration>,
) -> Result<TcpStream> {
    let connect = TcpStream::connect((host, port));

    let result = match timeout {
        Some(timeout) => match tokio::time::timeout(timeout, connect).await {
            Ok(result) => result,
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("connect timed out after {:?}", timeout),
            )),
        },
        None => connect.await,
    };

    let stream = result.map_err(|source| RelayError::Connect {
        addr: format!("{}:{}", host, port),
        source,
    })?;

    opts.hint(&stream);

    tracing::debug!("TCP connection established to {}:{}", host, port);

    Ok(stream)
}
