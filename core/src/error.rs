//! Error types for the weather request pipeline.
//!
//! # Design
//! Each layer owns its error enum: `ConnectError` for link establishment,
//! `DecodeError` for the bounded extractor and `ConfigError` for startup.
//! `RequestError` is the per-request umbrella the orchestrator reports. Every
//! variant is terminal for the request that produced it; none is retried
//! inside the core.

use std::io;
use std::net::SocketAddr;

use serde::Serialize;

/// The link could not establish a session with the server.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// Name resolution failed.
    #[error("failed to resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: io::Error,
    },

    /// Resolution succeeded but produced no addresses.
    #[error("{host} resolved to no addresses")]
    NoAddress { host: String },

    /// Every resolved address refused, was unreachable, or timed out.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

/// Failures of the bounded JSON extractor.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The byte stream is not syntactically valid JSON.
    #[error("malformed JSON: {0}")]
    Malformed(&'static str),

    /// A fixed-path field is absent, has the wrong type, or the results array is empty.
    #[error("schema mismatch at `{0}`")]
    SchemaMismatch(&'static str),

    /// The document does not fit the fixed decode capacity.
    #[error("document exceeds decode capacity: {0}")]
    CapacityExceeded(&'static str),

    /// The body stream failed while it was being decoded.
    #[error("read failed while decoding: {0}")]
    Io(#[from] io::Error),
}

/// Invalid or unreadable client configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Everything that can end a single request before a record is produced.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// The request bytes could not be fully delivered.
    #[error("failed to send request: {0}")]
    Send(#[source] io::Error),

    /// The response stream failed while locating the body.
    #[error("failed to read response: {0}")]
    Transport(#[source] io::Error),

    /// The header/body separator was never found before the stream ended.
    #[error("response has no header/body separator")]
    Framing,

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Coarse classification of a `RequestError`, as emitted by reporters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Connect,
    Send,
    Transport,
    Framing,
    Malformed,
    SchemaMismatch,
    CapacityExceeded,
}

impl RequestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RequestError::Connect(_) => ErrorKind::Connect,
            RequestError::Send(_) => ErrorKind::Send,
            RequestError::Transport(_) | RequestError::Decode(DecodeError::Io(_)) => {
                ErrorKind::Transport
            }
            RequestError::Framing => ErrorKind::Framing,
            RequestError::Decode(DecodeError::Malformed(_)) => ErrorKind::Malformed,
            RequestError::Decode(DecodeError::SchemaMismatch(_)) => ErrorKind::SchemaMismatch,
            RequestError::Decode(DecodeError::CapacityExceeded(_)) => ErrorKind::CapacityExceeded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_errors_map_to_their_kind() {
        let err = RequestError::from(DecodeError::SchemaMismatch("results"));
        assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
        let err = RequestError::from(DecodeError::CapacityExceeded("string storage"));
        assert_eq!(err.kind(), ErrorKind::CapacityExceeded);
        let err = RequestError::from(DecodeError::Malformed("expected value"));
        assert_eq!(err.kind(), ErrorKind::Malformed);
    }

    #[test]
    fn io_failure_during_decode_is_a_transport_failure() {
        let io = io::Error::new(io::ErrorKind::TimedOut, "read timed out");
        let err = RequestError::from(DecodeError::from(io));
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[test]
    fn kind_serializes_as_snake_case() {
        let json = serde_json::to_string(&ErrorKind::CapacityExceeded).unwrap();
        assert_eq!(json, r#""capacity_exceeded""#);
    }

    #[test]
    fn schema_mismatch_names_the_path() {
        let err = DecodeError::SchemaMismatch("results[0].now.code");
        assert_eq!(err.to_string(), "schema mismatch at `results[0].now.code`");
    }
}
