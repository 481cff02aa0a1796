//! Relay configuration types
//!
//! Defines the local listener and upstream proxy settings for the relay.

use super::TcpConfig;
use crate::error::{RelayError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

/// Longest username or password encodable in the one-byte length fields
/// of the username/password sub-negotiation
pub const MAX_CREDENTIAL_LEN: usize = 255;

fn default_bind_addr() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

/// Root configuration structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RelayConfig {
    /// Local listener configuration
    #[serde(default)]
    pub listen: ListenConfig,

    /// Upstream SOCKS5 proxy configuration
    pub upstream: UpstreamConfig,

    /// Socket options for client and upstream connections
    #[serde(default)]
    pub tcp: TcpConfig,
}

/// Local listener configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ListenConfig {
    /// Interface to bind (all interfaces by default)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: IpAddr,

    /// Local port, 0 asks the OS for an ephemeral port
    #[serde(default)]
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        ListenConfig {
            bind_addr: default_bind_addr(),
            port: 0,
        }
    }
}

/// Upstream SOCKS5 proxy configuration
#[derive(Serialize, Deserialize, Clone)]
pub struct UpstreamConfig {
    /// Upstream host name or IP address
    pub host: String,

    /// Upstream port
    pub port: u16,

    /// Username for the username/password sub-negotiation
    pub username: String,

    /// Password for the username/password sub-negotiation
    pub password: String,

    /// Upstream connect timeout in seconds (no timeout when unset)
    #[serde(default)]
    pub connect_timeout: Option<u64>,
}

impl fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl UpstreamConfig {
    /// Upstream address in `host:port` form
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Connect timeout as a duration, if configured
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout.map(Duration::from_secs)
    }
}

impl RelayConfig {
    /// Build a configuration with default listener and socket settings
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
        local_port: Option<u16>,
    ) -> Self {
        RelayConfig {
            listen: ListenConfig {
                port: local_port.unwrap_or(0),
                ..Default::default()
            },
            upstream: UpstreamConfig {
                host: host.into(),
                port,
                username: username.into(),
                password: password.into(),
                connect_timeout: None,
            },
            tcp: TcpConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let upstream = &self.upstream;
        if upstream.host.trim().is_empty() {
            return Err(RelayError::Config("upstream host is empty".to_string()));
        }
        if upstream.port == 0 {
            return Err(RelayError::Config("upstream port must be in 1-65535".to_string()));
        }
        if upstream.username.len() > MAX_CREDENTIAL_LEN {
            return Err(RelayError::Config(format!(
                "upstream username is {} bytes, at most {} allowed",
                upstream.username.len(),
                MAX_CREDENTIAL_LEN
            )));
        }
        if upstream.password.len() > MAX_CREDENTIAL_LEN {
            return Err(RelayError::Config(format!(
                "upstream password is {} bytes, at most {} allowed",
                upstream.password.len(),
                MAX_CREDENTIAL_LEN
            )));
        }
        Ok(())
    }
}
