// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)
// Parlor Telemetry - Event Envelope

//! # Event Envelope
//!
//! Uniform transport wrapper around every emitted event payload. Consumers
//! key on `type` to pick a decoder for `data`; `version` is the only
//! compatibility signal and is bumped manually when the payload contracts
//! change.

use crate::TELEMETRY_SCHEMA_VERSION;
use serde::Serialize;
use serde_json::{Map, Value};

/// Transport envelope for a single telemetry event.
///
/// Immutable once built. Serialized to a JSON string and transmitted
/// verbatim with no message key, so broker default partitioning applies.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    /// Milliseconds since the Unix epoch at the time the event was built
    pub timestamp: i64,

    /// Build identifier, fixed per process lifetime
    pub build: String,

    /// Event type tag
    #[serde(rename = "type")]
    pub event_type: String,

    /// Opaque event payload; structure is defined per event type
    pub data: Map<String, Value>,

    /// Envelope schema version
    pub version: &'static str,
}

impl Envelope {
    /// Wrap a payload in a new envelope stamped with the current wall clock.
    pub fn new(event_type: &str, data: Map<String, Value>, build: &str) -> Self {
        Self {
            timestamp: chrono::Utc::now().timestamp_millis(),
            build: build.to_string(),
            event_type: event_type.to_string(),
            data,
            version: TELEMETRY_SCHEMA_VERSION,
        }
    }

    /// Serialize the envelope to its wire form.
    pub fn to_json(&self) -> crate::errors::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
