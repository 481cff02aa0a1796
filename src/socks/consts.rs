//! SOCKS5 protocol constants
//!
//! The subset of RFC 1928 / RFC 1929 bytes this relay speaks.

/// SOCKS5 protocol version
pub const SOCKS5_VERSION: u8 = 0x05;

/// Username/password sub-negotiation version
pub const SOCKS5_AUTH_VERSION: u8 = 0x01;

// Authentication methods
/// No authentication required
pub const SOCKS5_AUTH_METHOD_NONE: u8 = 0x00;
/// Username/password authentication
pub const SOCKS5_AUTH_METHOD_PASSWORD: u8 = 0x02;

/// Sub-negotiation status for accepted credentials
pub const SOCKS5_AUTH_SUCCESS: u8 = 0x00;

/// Method-negotiation request sent to the upstream: offer no-auth and
/// username/password
pub const UPSTREAM_GREETING: [u8; 4] = [
    SOCKS5_VERSION,
    0x02,
    SOCKS5_AUTH_METHOD_NONE,
    SOCKS5_AUTH_METHOD_PASSWORD,
];

/// Method selection sent to every client: no authentication required
pub const CLIENT_METHOD_REPLY: [u8; 2] = [SOCKS5_VERSION, SOCKS5_AUTH_METHOD_NONE];
