//! Process-wide, read-only client configuration.
//!
//! # Design
//! `ClientConfig` is built once at startup (defaults, an optional JSON file,
//! then command-line overrides) and handed to the orchestrator by value.
//! Nothing mutates it afterwards. Durations are written in milliseconds in
//! the JSON form.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::request::QueryParameters;

/// Connect and I/O bounds enforced by the transport session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    #[serde(rename = "connect_timeout_ms", with = "millis")]
    pub connect_timeout: Duration,
    /// `None` blocks indefinitely.
    #[serde(rename = "read_timeout_ms", with = "optional_millis")]
    pub read_timeout: Option<Duration>,
    #[serde(rename = "write_timeout_ms", with = "optional_millis")]
    pub write_timeout: Option<Duration>,
}

impl TransportConfig {
    /// Sockets reject a zero timeout; an unbounded read or write is `None`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::Invalid("connect timeout must be positive"));
        }
        if self.read_timeout.is_some_and(|d| d.is_zero()) {
            return Err(ConfigError::Invalid("read timeout must be positive or null"));
        }
        if self.write_timeout.is_some_and(|d| d.is_zero()) {
            return Err(ConfigError::Invalid("write timeout must be positive or null"));
        }
        Ok(())
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            read_timeout: Some(Duration::from_secs(10)),
            write_timeout: Some(Duration::from_secs(10)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub base_path: String,
    pub api_key: String,
    pub language: String,
    pub unit: String,
    /// Visited in order, one request at a time.
    pub locations: Vec<String>,
    /// Pause after each request.
    #[serde(rename = "interval_ms", with = "millis")]
    pub interval: Duration,
    pub transport: TransportConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "api.seniverse.com".to_string(),
            port: 80,
            base_path: "/v3/weather/now.json".to_string(),
            api_key: String::new(),
            language: "en".to_string(),
            unit: "c".to_string(),
            locations: vec!["chongqing".to_string(), "chengdu".to_string()],
            interval: Duration::from_millis(2500),
            transport: TransportConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::Invalid("host must not be empty"));
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid("port must be between 1 and 65535"));
        }
        if self.locations.is_empty() {
            return Err(ConfigError::Invalid("at least one location is required"));
        }
        self.transport.validate()
    }

    /// `key`, `location`, `language`, `unit`, in wire order.
    pub fn query_for(&self, location: &str) -> QueryParameters {
        QueryParameters::new()
            .with("key", self.api_key.as_str())
            .with("location", location)
            .with("language", self.language.as_str())
            .with("unit", self.unit.as_str())
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

mod optional_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(deserializer).map(|ms| ms.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.host, "api.seniverse.com");
        assert_eq!(config.port, 80);
        assert_eq!(config.interval, Duration::from_millis(2500));
    }

    #[test]
    fn from_json_fills_missing_fields_with_defaults() {
        let config = ClientConfig::from_json(
            r#"{"api_key": "SECRET", "locations": ["beijing"], "interval_ms": 100,
                "transport": {"read_timeout_ms": null}}"#,
        )
        .unwrap();
        assert_eq!(config.api_key, "SECRET");
        assert_eq!(config.locations, vec!["beijing".to_string()]);
        assert_eq!(config.interval, Duration::from_millis(100));
        assert_eq!(config.transport.read_timeout, None);
        assert_eq!(config.transport.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.unit, "c");
    }

    #[test]
    fn from_json_rejects_invalid_values() {
        assert!(matches!(
            ClientConfig::from_json(r#"{"port": 0}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ClientConfig::from_json(r#"{"locations": []}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ClientConfig::from_json(r#"{"port": 70000}"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            ClientConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn from_json_rejects_zero_timeouts() {
        for transport in [
            r#"{"connect_timeout_ms": 0}"#,
            r#"{"read_timeout_ms": 0}"#,
            r#"{"write_timeout_ms": 0}"#,
        ] {
            let json = format!(r#"{{"transport": {transport}}}"#);
            assert!(
                matches!(ClientConfig::from_json(&json), Err(ConfigError::Invalid(_))),
                "{transport}"
            );
        }
        assert!(ClientConfig::from_json(r#"{"transport": {"write_timeout_ms": null}}"#).is_ok());
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = ClientConfig::from_json_file("/nonexistent/weather.json").unwrap_err();
        assert!(matches!(err, ConfigError::Read(_)));
    }

    #[test]
    fn query_for_orders_parameters() {
        let config = ClientConfig {
            api_key: "SECRET".to_string(),
            ..ClientConfig::default()
        };
        let params = config.query_for("chongqing");
        let pairs: Vec<(&str, &str)> = params.iter().collect();
        assert_eq!(
            pairs,
            vec![
                ("key", "SECRET"),
                ("location", "chongqing"),
                ("language", "en"),
                ("unit", "c"),
            ]
        );
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = ClientConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(ClientConfig::from_json(&json).unwrap(), config);
    }
}
