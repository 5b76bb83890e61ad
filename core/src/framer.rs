//! Response framing: skip the status line and header block.
//!
//! The status code is logged but never acted on. A 4xx/5xx body is handed to
//! the extractor like any other and fails there on schema mismatch.

use std::io;

use tracing::{debug, warn};

use crate::transport::{ByteStream, Session};

/// Blank line separating headers from the body.
pub const HEADER_SEPARATOR: &[u8] = b"\r\n\r\n";

/// Position `session` at the first body byte.
///
/// Returns `false` when the stream ends before the header/body separator.
pub fn skip_to_body<S: ByteStream>(session: &mut Session<S>) -> io::Result<bool> {
    let Some(status_line) = session.read_line(b'\n')? else {
        debug!("stream ended before status line");
        return Ok(false);
    };

    match parse_status_code(status_line.as_bytes()) {
        Some(code) if (200..300).contains(&code) => debug!(code, "status line"),
        Some(code) => warn!(code, "non-success status, decoding body anyway"),
        None => warn!("unrecognized status line"),
    }

    // The status line's own CRLF is the first half of the separator when the
    // header block is empty.
    let primed = if status_line.ends_with_cr() { 2 } else { 0 };
    session.find_sequence_from(HEADER_SEPARATOR, primed)
}

/// Extract the numeric code from a status line such as `HTTP/1.1 200 OK`.
pub fn parse_status_code(line: &[u8]) -> Option<u16> {
    let line = std::str::from_utf8(line).ok()?;
    let mut parts = line.trim_end().split(' ');
    let version = parts.next()?;
    if !version.starts_with("HTTP/") {
        return None;
    }
    let code = parts.next()?;
    if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    code.parse().ok()
}
