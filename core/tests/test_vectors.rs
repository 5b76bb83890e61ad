//! Verify the request builder and the decoder against JSON test vectors in `test-vectors/`.
//!
//! Each decode vector carries a response body and either the expected record
//! or the expected error kind. Bodies are fed both in one piece and one byte
//! per read, so the incremental parser sees every chunk boundary.

use std::io::{self, Read};

use weather_core::{build_resource, decode, DecodeError, QueryParameters, WeatherRecord};

/// Reader that returns a single byte per call.
struct OneByte<'a>(&'a [u8]);

impl Read for OneByte<'_> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        match (self.0.split_first(), out.first_mut()) {
            (Some((&byte, rest)), Some(slot)) => {
                *slot = byte;
                self.0 = rest;
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}

fn error_name(err: &DecodeError) -> &'static str {
    match err {
        DecodeError::Malformed(_) => "Malformed",
        DecodeError::SchemaMismatch(_) => "SchemaMismatch",
        DecodeError::CapacityExceeded(_) => "CapacityExceeded",
        DecodeError::Io(_) => "Io",
    }
}

// ---------------------------------------------------------------------------
// Resource paths
// ---------------------------------------------------------------------------

#[test]
fn resource_test_vectors() {
    let raw = include_str!("../../test-vectors/resource.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let base = case["base"].as_str().unwrap();
        let params: QueryParameters = case["params"]
            .as_array()
            .unwrap()
            .iter()
            .map(|pair| {
                let pair = pair.as_array().unwrap();
                (pair[0].as_str().unwrap(), pair[1].as_str().unwrap())
            })
            .collect();

        let resource = build_resource(base, &params);
        assert_eq!(resource, case["expected"].as_str().unwrap(), "{name}");
    }
}

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

#[test]
fn decode_test_vectors() {
    let raw = include_str!("../../test-vectors/decode.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let body = case["body"].as_str().unwrap().as_bytes();

        let whole = decode(body);
        let bytewise = decode(OneByte(body));

        if let Some(expected_error) = case.get("expected_error") {
            let expected_error = expected_error.as_str().unwrap();
            let err = whole.unwrap_err();
            assert_eq!(error_name(&err), expected_error, "{name}: {err}");
            let err = bytewise.unwrap_err();
            assert_eq!(error_name(&err), expected_error, "{name} (bytewise): {err}");
        } else {
            let expected: WeatherRecord = serde_json::from_value(case["expected_result"].clone()).unwrap();
            assert_eq!(whole.unwrap(), expected, "{name}");
            assert_eq!(bytewise.unwrap(), expected, "{name} (bytewise)");
        }
    }
}
