//! Bounded JSON extraction.
//!
//! # Overview
//! The response body is parsed incrementally into a `Document` whose capacity
//! is fixed by the known response shape (see `capacity`), then a handful of
//! fixed paths are read out into a `WeatherRecord`. The document is dropped
//! as soon as the record is built.

pub mod capacity;
pub mod document;
mod parser;
pub mod weather;

pub use document::{Document, Value, ValueKind};
pub use weather::{decode, extract, WeatherDocument};
