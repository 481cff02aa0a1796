//! Error types for Sockrelay
//!
//! This module defines the error taxonomy used by the relay engine.

use std::io;
use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, RelayError>;

/// Main error type for relay operations
#[derive(Error, Debug)]
pub enum RelayError {
    /// The local listener could not be bound
    #[error("Failed to bind local listener on {addr}: {source}")]
    Bind {
        /// Requested bind address
        addr: String,
        /// Underlying socket error
        #[source]
        source: io::Error,
    },

    /// The upstream proxy could not be reached
    #[error("Failed to connect to upstream {addr}: {source}")]
    Connect {
        /// Upstream address as configured
        addr: String,
        /// Underlying socket error
        #[source]
        source: io::Error,
    },

    /// Malformed or truncated handshake bytes
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Upstream did not select username/password authentication
    #[error("Upstream does not support username/password authentication (selected method {0:#04x})")]
    UnsupportedAuth(u8),

    /// Upstream rejected the configured credentials
    #[error("Bad username/password (upstream status {0:#04x})")]
    AuthFailed(u8),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation not allowed in the relay's current state
    #[error("Invalid state: {0}")]
    InvalidState(&'static str),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl RelayError {
    /// Whether this error is an ordinary network event rather than a
    /// protocol or configuration problem
    pub fn is_transport(&self) -> bool {
        matches!(self, RelayError::Io(_) | RelayError::Connect { .. })
    }
}
