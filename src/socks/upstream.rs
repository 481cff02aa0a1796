//! Upstream proxy authentication
//!
//! Implements the client side of the SOCKS5 method negotiation followed by
//! the RFC 1929 username/password sub-negotiation against the upstream proxy.

use super::consts::*;
use crate::config::{RelayConfig, MAX_CREDENTIAL_LEN};
use crate::error::{RelayError, Result};
use crate::helper::{hex, read_full};
use crate::transport::{connect_upstream, SocketOpts};
use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// Username/password pair, each guaranteed to fit a one-byte length field
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Create credentials, rejecting values longer than 255 bytes
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        let username = username.into();
        let password = password.into();

        if username.len() > MAX_CREDENTIAL_LEN {
            return Err(RelayError::Config(format!(
                "username is {} bytes, at most {} allowed",
                username.len(),
                MAX_CREDENTIAL_LEN
            )));
        }
        if password.len() > MAX_CREDENTIAL_LEN {
            return Err(RelayError::Config(format!(
                "password is {} bytes, at most {} allowed",
                password.len(),
                MAX_CREDENTIAL_LEN
            )));
        }

        Ok(Credentials { username, password })
    }

    /// Username
    pub fn username(&self) -> &str {
        &self.username
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Build the username/password sub-negotiation request
///
/// ```text
/// +----+------+----------+------+----------+
/// |VER | ULEN |  UNAME   | PLEN |  PASSWD  |
/// +----+------+----------+------+----------+
/// | 1  |  1   | 0 to 255 |  1   | 0 to 255 |
/// +----+------+----------+------+----------+
/// ```
pub fn build_auth_request(credentials: &Credentials) -> Bytes {
    let username = credentials.username.as_bytes();
    let password = credentials.password.as_bytes();

    let mut buf = BytesMut::with_capacity(3 + username.len() + password.len());
    buf.put_u8(SOCKS5_AUTH_VERSION);
    buf.put_u8(username.len() as u8);
    buf.put_slice(username);
    buf.put_u8(password.len() as u8);
    buf.put_slice(password);
    buf.freeze()
}

/// Authenticate to the upstream proxy over an already connected stream
///
/// On success the stream is positioned right after the sub-negotiation
/// reply and is ready to carry opaque client bytes.
pub async fn negotiate_upstream<S>(stream: &mut S, credentials: &Credentials) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(&UPSTREAM_GREETING).await?;
    stream.flush().await?;

    let mut selection = [0u8; 2];
    let n = read_full(stream, &mut selection).await?;
    if n < selection.len() {
        return Err(RelayError::Protocol(format!(
            "short negotiation response: got {} of 2 bytes [{}]",
            n,
            hex(&selection[..n])
        )));
    }

    debug!("Upstream method selection [{}]", hex(&selection));

    if selection[0] != SOCKS5_VERSION {
        warn!("Upstream replied with version {:#04x}", selection[0]);
    }
    if selection[1] != SOCKS5_AUTH_METHOD_PASSWORD {
        return Err(RelayError::UnsupportedAuth(selection[1]));
    }

    let request = build_auth_request(credentials);
    stream.write_all(&request).await?;
    stream.flush().await?;

    let mut status = [0u8; 2];
    let n = read_full(stream, &mut status).await?;
    if n < status.len() {
        return Err(RelayError::Protocol(format!(
            "bad auth response: got {} of 2 bytes [{}]",
            n,
            hex(&status[..n])
        )));
    }
    if status[1] != SOCKS5_AUTH_SUCCESS {
        return Err(RelayError::AuthFailed(status[1]));
    }

    debug!("Upstream authentication reply [{}]", hex(&status));

    Ok(())
}

/// Opens authenticated connections to the configured upstream proxy
#[derive(Debug, Clone)]
pub struct UpstreamAuthenticator {
    host: String,
    port: u16,
    credentials: Credentials,
    socket_opts: SocketOpts,
    connect_timeout: Option<Duration>,
}

impl UpstreamAuthenticator {
    /// Create an authenticator from the relay configuration
    pub fn from_config(config: &RelayConfig) -> Result<Self> {
        let upstream = &config.upstream;
        Ok(UpstreamAuthenticator {
            host: upstream.host.clone(),
            port: upstream.port,
            credentials: Credentials::new(upstream.username.clone(), upstream.password.clone())?,
            socket_opts: SocketOpts::from_tcp_config(&config.tcp),
            connect_timeout: upstream.connect_timeout(),
        })
    }

    /// Upstream address in `host:port` form
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Connect to the upstream and run one authentication attempt
    pub async fn connect(&self) -> Result<TcpStream> {
        let mut stream =
            connect_upstream(&self.host, self.port, &self.socket_opts, self.connect_timeout)
                .await?;

        debug!("Connected to proxy {}", self.addr());

        negotiate_upstream(&mut stream, &self.credentials).await?;

        info!(
            "Authenticated to upstream {} as {}",
            self.addr(),
            self.credentials.username()
        );

        Ok(stream)
    }
}
