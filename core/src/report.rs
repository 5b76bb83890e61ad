//! Reporting sinks for per-request outcomes.
//!
//! The orchestrator hands every outcome to a `Reporter`. Reporting never
//! fails the pipeline: a sink that cannot write logs and moves on.

use std::io::Write;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{ErrorKind, RequestError};
use crate::types::WeatherRecord;

pub trait Reporter {
    fn report(&mut self, location: &str, outcome: Result<&WeatherRecord, &RequestError>);
}

/// Emits outcomes as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&mut self, location: &str, outcome: Result<&WeatherRecord, &RequestError>) {
        match outcome {
            Ok(record) => info!(
                location,
                location_id = %record.location_id,
                condition_text = %record.condition_text,
                condition_code = record.condition_code,
                last_update = %record.last_update,
                "weather report"
            ),
            Err(err) => warn!(location, kind = ?err.kind(), error = %err, "request failed"),
        }
    }
}

/// One JSON object per line.
#[derive(Serialize)]
#[serde(untagged)]
enum Line<'a> {
    Record {
        location: &'a str,
        record: &'a WeatherRecord,
    },
    Error {
        location: &'a str,
        error: ErrorLine,
    },
}

#[derive(Serialize)]
struct ErrorLine {
    kind: ErrorKind,
    message: String,
}

/// Writes each outcome as a JSON line.
#[derive(Debug)]
pub struct JsonLinesReporter<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, line: &Line<'_>) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.out, line)?;
        self.out.write_all(b"\n")?;
        self.out.flush()
    }
}

impl<W: Write> Reporter for JsonLinesReporter<W> {
    fn report(&mut self, location: &str, outcome: Result<&WeatherRecord, &RequestError>) {
        let line = match outcome {
            Ok(record) => Line::Record { location, record },
            Err(err) => Line::Error {
                location,
                error: ErrorLine {
                    kind: err.kind(),
                    message: err.to_string(),
                },
            },
        };
        if let Err(err) = self.write_line(&line) {
            warn!(error = %err, "failed to write report");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;

    fn record() -> WeatherRecord {
        WeatherRecord {
            location_id: "C23NB62W20TF".to_string(),
            condition_text: "Cloudy".to_string(),
            condition_code: 4,
            last_update: "2015-09-25T22:45:00-07:00".to_string(),
        }
    }

    fn lines(out: Vec<u8>) -> Vec<serde_json::Value> {
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn json_lines_for_record_and_error() {
        let mut reporter = JsonLinesReporter::new(Vec::new());
        reporter.report("chongqing", Ok(&record()));
        reporter.report("chengdu", Err(&RequestError::Framing));
        reporter.report(
            "beijing",
            Err(&RequestError::Decode(DecodeError::SchemaMismatch("results"))),
        );

        let lines = lines(reporter.into_inner());
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["location"], "chongqing");
        assert_eq!(lines[0]["record"]["locationId"], "C23NB62W20TF");
        assert_eq!(lines[0]["record"]["conditionCode"], 4);
        assert_eq!(lines[1]["error"]["kind"], "framing");
        assert_eq!(lines[2]["error"]["kind"], "schema_mismatch");
        assert_eq!(lines[2]["error"]["message"], "schema mismatch at `results`");
    }

    #[test]
    fn log_reporter_accepts_both_outcomes() {
        let mut reporter = LogReporter;
        reporter.report("chongqing", Ok(&record()));
        reporter.report("chongqing", Err(&RequestError::Framing));
    }
}
