// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)
// Parlor Telemetry - Configuration

//! # Telemetry Configuration
//!
//! Resolved configuration for the telemetry pipeline. The caller supplies
//! already-resolved strings (broker list, topic, build identifier); nothing
//! here performs discovery.

use crate::errors::{Error, Result};
use std::env;
use std::time::Duration;

/// Default metadata-probe and client-construction timeout in seconds.
/// 5 seconds detects a dead broker quickly while tolerating slow DNS and
/// TLS handshakes on cold connections.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Default bound on message delivery time in seconds.
/// With `acks=0` the client never waits for broker acknowledgment; this bound
/// only caps how long an undeliverable message may sit in the local queue
/// before its delivery callback reports failure.
pub const DEFAULT_SEND_TIMEOUT_SECS: u64 = 5;

/// Environment variable for the Kafka bootstrap broker list.
pub const ENV_KAFKA_BROKERS: &str = "PARLOR_KAFKA_BROKERS";

/// Environment variable for the Kafka topic name.
pub const ENV_KAFKA_TOPIC: &str = "PARLOR_KAFKA_TOPIC";

/// Environment variable for the build identifier.
pub const ENV_BUILD: &str = "PARLOR_BUILD";

/// Configuration for the telemetry pipeline
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Kafka bootstrap servers (comma-separated)
    pub brokers: String,

    /// Topic name for telemetry events
    pub topic: String,

    /// Build identifier, fixed per process lifetime.
    ///
    /// Stamped into every envelope and into the Kafka `client.id`.
    pub build: String,

    /// Bound on client construction and the topic metadata probe
    pub connect_timeout: Duration,

    /// Bound on message delivery (`message.timeout.ms`)
    pub send_timeout: Duration,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            brokers: "localhost:9092".to_string(),
            topic: "parlor-events".to_string(),
            build: "dev".to_string(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            send_timeout: Duration::from_secs(DEFAULT_SEND_TIMEOUT_SECS),
        }
    }
}

impl TelemetryConfig {
    /// Create a configuration from the given broker list, topic, and build id.
    pub fn new(brokers: &str, topic: &str, build: &str) -> Self {
        Self {
            brokers: brokers.to_string(),
            topic: topic.to_string(),
            build: build.to_string(),
            ..Default::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `PARLOR_KAFKA_BROKERS` | Kafka bootstrap servers | `localhost:9092` |
    /// | `PARLOR_KAFKA_TOPIC` | Telemetry topic | `parlor-events` |
    /// | `PARLOR_BUILD` | Build identifier | `dev` |
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            brokers: env_string_or(ENV_KAFKA_BROKERS, &defaults.brokers),
            topic: env_string_or(ENV_KAFKA_TOPIC, &defaults.topic),
            build: env_string_or(ENV_BUILD, &defaults.build),
            ..defaults
        }
    }

    /// Validate and normalize the configuration.
    ///
    /// The broker list is trimmed, empty entries are dropped, and the result
    /// rejoined. Empty brokers, topic, or build are rejected.
    pub fn validate(mut self) -> Result<Self> {
        let brokers: Vec<&str> = self
            .brokers
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if brokers.is_empty() {
            return Err(Error::InvalidConfig(
                "brokers must contain at least one address".to_string(),
            ));
        }
        self.brokers = brokers.join(",");

        if self.topic.trim().is_empty() {
            return Err(Error::InvalidConfig("topic must be non-empty".to_string()));
        }
        if self.build.trim().is_empty() {
            return Err(Error::InvalidConfig("build must be non-empty".to_string()));
        }
        if self.connect_timeout.is_zero() {
            tracing::warn!(
                fallback_secs = DEFAULT_CONNECT_TIMEOUT_SECS,
                "connect_timeout must be > 0; using default"
            );
            self.connect_timeout = Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS);
        }
        if self.send_timeout.is_zero() {
            tracing::warn!(
                fallback_secs = DEFAULT_SEND_TIMEOUT_SECS,
                "send_timeout must be > 0; using default"
            );
            self.send_timeout = Duration::from_secs(DEFAULT_SEND_TIMEOUT_SECS);
        }
        Ok(self)
    }
}

fn env_string_or(var: &str, default: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => default.to_string(),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = TelemetryConfig::default();
        assert_eq!(config.brokers, "localhost:9092");
        assert_eq!(config.topic, "parlor-events");
        assert_eq!(config.build, "dev");
        assert_eq!(config.connect_timeout.as_secs(), DEFAULT_CONNECT_TIMEOUT_SECS);
    }

    #[test]
    fn test_validate_normalizes_brokers() {
        let config = TelemetryConfig::new(" kafka1:9092, ,kafka2:9092 ", "t", "b")
            .validate()
            .unwrap();
        assert_eq!(config.brokers, "kafka1:9092,kafka2:9092");
    }

    #[test]
    fn test_validate_rejects_empty_brokers() {
        let result = TelemetryConfig::new(" , ", "t", "b").validate();
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_empty_topic() {
        let result = TelemetryConfig::new("localhost:9092", "  ", "b").validate();
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_empty_build() {
        let result = TelemetryConfig::new("localhost:9092", "t", "").validate();
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_fixes_zero_timeouts() {
        let config = TelemetryConfig {
            connect_timeout: Duration::ZERO,
            send_timeout: Duration::ZERO,
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert!(!config.connect_timeout.is_zero());
        assert!(!config.send_timeout.is_zero());
    }
}
