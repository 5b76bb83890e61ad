//! Fixed-path extraction of the current-weather response.
//!
//! Paths read: `results[0].location.id`, `results[0].now.text`,
//! `results[0].now.code` and `results[0].last_update`. Other members are
//! parsed (they count against capacity) but ignored.

use std::io::Read;

use tracing::debug;

use crate::error::DecodeError;
use crate::json::capacity::{WEATHER_NESTING, WEATHER_SLOTS, WEATHER_STRING_BYTES};
use crate::json::document::{Document, Value, ValueKind};
use crate::types::WeatherRecord;

/// Document sized for the current-weather schema.
pub type WeatherDocument = Document<WEATHER_SLOTS, WEATHER_STRING_BYTES>;

/// Decode a response body into a `WeatherRecord`.
pub fn decode<R: Read>(body: R) -> Result<WeatherRecord, DecodeError> {
    let doc = WeatherDocument::parse(body, WEATHER_NESTING)?;
    debug!(
        slots = doc.slots_used(),
        bytes = doc.bytes_used(),
        "body parsed"
    );
    extract(&doc)
}

/// Read the weather fields out of an already parsed document.
pub fn extract<const SLOTS: usize, const BYTES: usize>(
    doc: &Document<SLOTS, BYTES>,
) -> Result<WeatherRecord, DecodeError> {
    let root = doc.root().ok_or(DecodeError::SchemaMismatch("results"))?;
    let results = member(root, "results", ValueKind::Array, "results")?;
    let result = results
        .at(0)
        .filter(|v| v.kind() == ValueKind::Object)
        .ok_or(DecodeError::SchemaMismatch("results[0]"))?;

    let location = member(result, "location", ValueKind::Object, "results[0].location")?;
    let now = member(result, "now", ValueKind::Object, "results[0].now")?;

    let location_id = string(location, "id", "results[0].location.id")?;
    let condition_text = string(now, "text", "results[0].now.text")?;
    let condition_code = now
        .get("code")
        .and_then(parse_code)
        .ok_or(DecodeError::SchemaMismatch("results[0].now.code"))?;
    let last_update = string(result, "last_update", "results[0].last_update")?;

    Ok(WeatherRecord {
        location_id,
        condition_text,
        condition_code,
        last_update,
    })
}

fn member<'a, const SLOTS: usize, const BYTES: usize>(
    parent: Value<'a, SLOTS, BYTES>,
    key: &str,
    kind: ValueKind,
    path: &'static str,
) -> Result<Value<'a, SLOTS, BYTES>, DecodeError> {
    parent
        .get(key)
        .filter(|v| v.kind() == kind)
        .ok_or(DecodeError::SchemaMismatch(path))
}

fn string<const SLOTS: usize, const BYTES: usize>(
    parent: Value<'_, SLOTS, BYTES>,
    key: &str,
    path: &'static str,
) -> Result<String, DecodeError> {
    parent
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .ok_or(DecodeError::SchemaMismatch(path))
}

/// The code is a string of ASCII digits; a bare non-negative integer is accepted too.
fn parse_code<const SLOTS: usize, const BYTES: usize>(
    value: Value<'_, SLOTS, BYTES>,
) -> Option<u32> {
    match value.kind() {
        ValueKind::String => {
            let text = value.as_str()?;
            if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            text.parse().ok()
        }
        ValueKind::Number => value.as_u64().and_then(|n| u32::try_from(n).ok()),
        _ => None,
    }
}
