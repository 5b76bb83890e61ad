//! Bounded-resource weather client core.
//!
//! # Overview
//! Issues one HTTP/1.1 GET over a raw TCP stream, skips the response status
//! line and headers, and decodes the body into a `WeatherRecord` using a JSON
//! document whose capacity is fixed by the known response shape.
//!
//! # Design
//! - Data flows strictly downstream: location → resource path → request bytes
//!   → response bytes → body → `WeatherRecord`.
//! - `Session` is the only stateful piece. It owns one connection and is
//!   closed after every request, on success and on every failure path.
//! - Decoding never grows memory: overflow of the fixed capacity is an error,
//!   not a reallocation.
//! - `Orchestrator` runs requests strictly one at a time.

pub mod config;
pub mod error;
pub mod framer;
pub mod json;
pub mod orchestrator;
pub mod report;
pub mod request;
pub mod transport;
pub mod types;

pub use config::{ClientConfig, TransportConfig};
pub use error::{ConfigError, ConnectError, DecodeError, ErrorKind, RequestError};
pub use framer::skip_to_body;
pub use json::decode;
pub use orchestrator::Orchestrator;
pub use report::{JsonLinesReporter, LogReporter, Reporter};
pub use request::{build_resource, QueryParameters, RequestSpec};
pub use transport::{ByteStream, ConnectionState, Connector, Session, TcpConnector};
pub use types::WeatherRecord;
