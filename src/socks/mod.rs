//! SOCKS5 module for Sockrelay
//!
//! The two halves of the handshake this relay performs: authenticating to
//! the upstream proxy, and answering the client's method negotiation. No
//! SOCKS5 command is parsed on either side; everything after the handshake
//! is opaque payload.

mod consts;
mod negotiate;
mod upstream;

pub use consts::*;
pub use negotiate::negotiate_client;
pub use upstream::{build_auth_request, negotiate_upstream, Credentials, UpstreamAuthenticator};
