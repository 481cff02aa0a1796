//! Helper utilities for Sockrelay
//!
//! This module provides common utility functions used throughout the application.

use std::fmt::Write as _;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Default buffer size for IO operations
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Read until `buf` is full or the stream reaches EOF
///
/// Unlike `read_exact`, a premature EOF is not an error: the number of
/// bytes actually read is returned so callers can report short reads
/// separately from unexpected content.
pub async fn read_full<S>(stream: &mut S, buf: &mut [u8]) -> std::io::Result<usize>
where
    S: AsyncRead + Unpin + ?Sized,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = stream.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Render bytes as lowercase hex for diagnostics
pub fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{:02x}", b);
    }
    out
}
