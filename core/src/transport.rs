//! Transport session over a connected byte stream.
//!
//! # Design
//! `Session` owns exactly one stream from `open` until `close`. Reads go
//! through a fixed-size buffer so the layers above can work byte by byte
//! without issuing a syscall per byte and without growing memory. The stream
//! is shut down on every exit path: `close` does it explicitly and `Drop`
//! catches anything that returns early.
//!
//! `Connector` is the seam to the link layer. `TcpConnector` is the real one;
//! tests plug in in-memory streams.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};

use tracing::debug;

use crate::config::TransportConfig;
use crate::error::ConnectError;

/// Size of the session's read buffer.
pub const READ_BUFFER_SIZE: usize = 512;

/// Longest line `read_line` retains. Longer lines are consumed but truncated.
pub const LINE_CAPACITY: usize = 256;

/// A readable, writable stream that can be shut down.
pub trait ByteStream: Read + Write {
    fn close_stream(&mut self) -> io::Result<()>;
}

impl ByteStream for TcpStream {
    fn close_stream(&mut self) -> io::Result<()> {
        self.shutdown(Shutdown::Both)
    }
}

/// Establishes connected streams.
pub trait Connector {
    type Stream: ByteStream;

    fn connect(&self, host: &str, port: u16) -> Result<Self::Stream, ConnectError>;
}

impl<C: Connector> Connector for &C {
    type Stream = C::Stream;

    fn connect(&self, host: &str, port: u16) -> Result<Self::Stream, ConnectError> {
        (**self).connect(host, port)
    }
}

/// Connects over TCP, trying each resolved address within the connect timeout.
#[derive(Debug, Clone, Default)]
pub struct TcpConnector {
    config: TransportConfig,
}

impl TcpConnector {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }
}

impl Connector for TcpConnector {
    type Stream = TcpStream;

    fn connect(&self, host: &str, port: u16) -> Result<TcpStream, ConnectError> {
        let addrs = (host, port)
            .to_socket_addrs()
            .map_err(|source| ConnectError::Resolve {
                host: host.to_string(),
                source,
            })?;

        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.config.connect_timeout) {
                Ok(stream) => {
                    let configured = stream
                        .set_read_timeout(self.config.read_timeout)
                        .and_then(|()| stream.set_write_timeout(self.config.write_timeout))
                        .and_then(|()| stream.set_nodelay(true));
                    if let Err(source) = configured {
                        return Err(ConnectError::Connect { addr, source });
                    }
                    debug!(%addr, "connected");
                    return Ok(stream);
                }
                Err(source) => {
                    debug!(%addr, error = %source, "connect attempt failed");
                    last_err = Some(ConnectError::Connect { addr, source });
                }
            }
        }

        Err(last_err.unwrap_or_else(|| ConnectError::NoAddress {
            host: host.to_string(),
        }))
    }
}

/// Lifecycle of a session's stream.
///
/// `Disconnected` means the peer ended the stream; the session still owns it
/// and must still be closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
    Closed,
}

/// A line read by `Session::read_line`, without its terminator.
#[derive(Debug, Clone, Default)]
pub struct Line {
    bytes: heapless::Vec<u8, LINE_CAPACITY>,
    truncated: bool,
    last: Option<u8>,
}

impl Line {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// True when the line was longer than `LINE_CAPACITY` and bytes were dropped.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// True when the byte before the terminator was `\r`.
    pub fn ends_with_cr(&self) -> bool {
        self.last == Some(b'\r')
    }

    fn push(&mut self, byte: u8) {
        if self.bytes.push(byte).is_err() {
            self.truncated = true;
        }
        self.last = Some(byte);
    }
}

/// Exclusive owner of one connected stream.
pub struct Session<S: ByteStream> {
    stream: S,
    state: ConnectionState,
    buf: [u8; READ_BUFFER_SIZE],
    pos: usize,
    filled: usize,
}

impl<S: ByteStream> Session<S> {
    /// Connect through `connector` and take ownership of the stream.
    pub fn open<C>(connector: &C, host: &str, port: u16) -> Result<Self, ConnectError>
    where
        C: Connector<Stream = S>,
    {
        let stream = connector.connect(host, port)?;
        Ok(Self::from_stream(stream))
    }

    /// Wrap an already connected stream.
    pub fn from_stream(stream: S) -> Self {
        Self {
            stream,
            state: ConnectionState::Connected,
            buf: [0; READ_BUFFER_SIZE],
            pos: 0,
            filled: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Write all of `bytes` and flush. Partial writes are retried;
    /// a stream that stops accepting bytes is an error.
    pub fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.stream.write_all(bytes)?;
        self.stream.flush()?;
        debug!(len = bytes.len(), "request sent");
        Ok(())
    }

    /// Read up to and including `terminator`. Returns `None` if the stream
    /// ends before any byte is read.
    pub fn read_line(&mut self, terminator: u8) -> io::Result<Option<Line>> {
        let mut line = Line::default();
        let mut any = false;
        while let Some(byte) = self.next_byte()? {
            any = true;
            if byte == terminator {
                return Ok(Some(line));
            }
            line.push(byte);
        }
        Ok(any.then_some(line))
    }

    /// Discard bytes up to and including the first occurrence of `sequence`.
    /// Returns `false` after consuming the rest of the stream if it never appears.
    pub fn find_sequence(&mut self, sequence: &[u8]) -> io::Result<bool> {
        self.find_sequence_from(sequence, 0)
    }

    /// Like `find_sequence`, treating the first `matched` bytes of `sequence`
    /// as already consumed.
    pub fn find_sequence_from(&mut self, sequence: &[u8], matched: usize) -> io::Result<bool> {
        let mut matched = matched.min(sequence.len());
        if matched == sequence.len() {
            return Ok(true);
        }
        while let Some(byte) = self.next_byte()? {
            matched = advance(sequence, matched, byte);
            if matched == sequence.len() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Shut the stream down and release the session.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.state == ConnectionState::Closed {
            return;
        }
        if let Err(err) = self.stream.close_stream() {
            // A peer that already hung up makes shutdown fail with NotConnected.
            debug!(error = %err, "stream shutdown failed");
        }
        self.state = ConnectionState::Closed;
        debug!("session closed");
    }

    fn fill(&mut self) -> io::Result<bool> {
        if self.pos < self.filled {
            return Ok(true);
        }
        if self.state != ConnectionState::Connected {
            return Ok(false);
        }
        loop {
            match self.stream.read(&mut self.buf) {
                Ok(0) => {
                    self.state = ConnectionState::Disconnected;
                    return Ok(false);
                }
                Ok(n) => {
                    self.pos = 0;
                    self.filled = n;
                    return Ok(true);
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
    }

    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        if !self.fill()? {
            return Ok(None);
        }
        let byte = self.buf[self.pos];
        self.pos += 1;
        Ok(Some(byte))
    }
}

impl<S: ByteStream> Read for Session<S> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() || !self.fill()? {
            return Ok(0);
        }
        let n = out.len().min(self.filled - self.pos);
        out[..n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

impl<S: ByteStream> Drop for Session<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Match length after feeding `byte` to a matcher that has matched
/// `sequence[..matched]`. Falls back through borders of the matched prefix so
/// overlapping candidates are not skipped.
fn advance(sequence: &[u8], mut matched: usize, byte: u8) -> usize {
    loop {
        if sequence[matched] == byte {
            return matched + 1;
        }
        if matched == 0 {
            return 0;
        }
        matched = border(&sequence[..matched]);
    }
}

/// Length of the longest proper prefix of `prefix` that is also its suffix.
fn border(prefix: &[u8]) -> usize {
    (1..prefix.len())
        .rev()
        .find(|&k| prefix[..k] == prefix[prefix.len() - k..])
        .unwrap_or(0)
}
