//! Sequential polling over the configured locations.
//!
//! # Design
//! One request is fully resolved before the next begins. Each request opens
//! its own session, and that session is closed before `fetch` returns,
//! whatever the outcome. Failures are reported and the loop moves on; the
//! fixed interval is the only retry mechanism.

use std::thread;

use tracing::{debug, info, instrument};

use crate::config::ClientConfig;
use crate::error::RequestError;
use crate::framer::skip_to_body;
use crate::json::decode;
use crate::report::Reporter;
use crate::request::{build_resource, RequestSpec};
use crate::transport::{ByteStream, Connector, Session};
use crate::types::WeatherRecord;

pub struct Orchestrator<C, R> {
    config: ClientConfig,
    connector: C,
    reporter: R,
}

impl<C: Connector, R: Reporter> Orchestrator<C, R> {
    pub fn new(config: ClientConfig, connector: C, reporter: R) -> Self {
        Self {
            config,
            connector,
            reporter,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn into_parts(self) -> (C, R) {
        (self.connector, self.reporter)
    }

    /// Run the whole pipeline for one location.
    #[instrument(skip(self), fields(host = %self.config.host))]
    pub fn fetch(&self, location: &str) -> Result<WeatherRecord, RequestError> {
        let resource = build_resource(&self.config.base_path, &self.config.query_for(location));
        let spec = RequestSpec::new(self.config.host.as_str(), self.config.port, resource);

        debug!(port = spec.port(), "opening session");
        let mut session = Session::open(&self.connector, spec.host(), spec.port())?;
        let outcome = exchange(&mut session, &spec);
        session.close();
        outcome
    }

    /// Visit every location once, reporting each outcome and pausing after
    /// each request. Returns how many requests produced a record.
    pub fn run_cycle(&mut self) -> usize {
        let mut successes = 0;
        for index in 0..self.config.locations.len() {
            let location = self.config.locations[index].clone();
            info!(location = %location, "requesting weather");
            let outcome = self.fetch(&location);
            if outcome.is_ok() {
                successes += 1;
            }
            self.reporter.report(&location, outcome.as_ref());
            if !self.config.interval.is_zero() {
                thread::sleep(self.config.interval);
            }
        }
        successes
    }

    /// Repeat cycles `cycles` times, or forever when `None`.
    pub fn run(&mut self, cycles: Option<u64>) {
        let mut completed = 0u64;
        while cycles.map_or(true, |limit| completed < limit) {
            let successes = self.run_cycle();
            completed += 1;
            debug!(cycle = completed, successes, "cycle finished");
        }
    }
}

fn exchange<S: ByteStream>(
    session: &mut Session<S>,
    spec: &RequestSpec,
) -> Result<WeatherRecord, RequestError> {
    let request = spec.to_wire();
    debug!(request = %request.trim_end(), "sending request");
    session.send(request.as_bytes()).map_err(RequestError::Send)?;

    if !skip_to_body(session).map_err(RequestError::Transport)? {
        return Err(RequestError::Framing);
    }
    Ok(decode(session)?)
}
