//! # Sockrelay - Local SOCKS5 Relay for Authenticated Upstreams
//!
//! Sockrelay listens on a local TCP port, answers the SOCKS5 method
//! negotiation of local clients with "no authentication required", and
//! forwards everything else verbatim over a connection it has already
//! authenticated (username/password) to an upstream SOCKS5 proxy.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sockrelay::{RelayConfig, SocksRelay};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = RelayConfig::new("1.2.3.4", 1337, "user", "pass", None);
//!     let mut relay = SocksRelay::new(config)?;
//!
//!     let port = relay.start().await?;
//!     println!("socks5://127.0.0.1:{}", port);
//!
//!     tokio::signal::ctrl_c().await?;
//!     relay.stop().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! SOCKS5 Client -> Sockrelay (no auth) -> Upstream SOCKS5 (user/pass) -> Target
//! ```
//!
//! Per accepted connection the relay first authenticates a fresh upstream
//! connection, then answers the client's greeting, then copies bytes in
//! both directions until either side finishes. The client's CONNECT
//! request is part of the copied bytes and is answered by the upstream.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod helper;
pub mod relay;
pub mod socks;
pub mod transport;

// Re-export commonly used items
pub use config::{load_config, RelayConfig};
pub use error::{RelayError, Result};
pub use relay::{RelayState, SocksRelay};

/// Version of the Sockrelay library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the application
pub const NAME: &str = env!("CARGO_PKG_NAME");
