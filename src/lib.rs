// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)
// Parlor Telemetry - Best-Effort Game Server Telemetry

//! # Parlor Telemetry
//!
//! Best-effort telemetry pipeline for the Parlor game server. Domain events
//! (server lifecycle, user connections, game lifecycle, round outcomes) are
//! wrapped in a uniform JSON envelope and published asynchronously to an
//! Apache Kafka topic for downstream analytics.
//!
//! ## Design
//!
//! The event stream is far less reliable than the game server itself, so the
//! pipeline is built around three rules:
//!
//! - **Never block a game-server thread.** Sends enqueue into the client's
//!   bounded buffer; connection construction is single-flight, and threads
//!   that lose the race drop their event instead of waiting.
//! - **Never surface a failure to the caller.** Every failure mode ends in a
//!   log line and a lost event, never an error or a panic at the emitter API.
//! - **Never leak a client.** A delivery failure tears the producer down
//!   (generation-guarded, so stale callbacks cannot hit a successor) and the
//!   next event reconnects from scratch.
//!
//! ## Example
//!
//! ```rust,no_run
//! use parlor_telemetry::{TelemetryConfig, TelemetryEmitter};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TelemetryConfig::new("localhost:9092", "parlor-events", "build-42");
//!     let emitter = TelemetryEmitter::new(config)?;
//!
//!     emitter.server_start("startup-abc");
//!     emitter.user_disconnect("sess-1");
//!
//!     emitter.shutdown();
//!     Ok(())
//! }
//! ```

/// Envelope schema version; the only compatibility signal on the wire,
/// bumped manually when payload contracts change.
pub const TELEMETRY_SCHEMA_VERSION: &str = "0.1";

/// Telemetry transport backends (Kafka, JSONL file).
pub mod backends;
/// Resolved pipeline configuration.
pub mod config;
/// The event emitter API and dispatch path.
pub mod emitter;
/// The uniform transport envelope.
pub mod envelope;
/// Telemetry-specific error types.
pub mod errors;
/// Domain event collaborator types.
pub mod events;
/// Prometheus metric name constants.
pub mod metrics_constants;
/// Internal metrics helpers.
pub(crate) mod metrics_utils;
/// The producer lifecycle manager.
pub mod producer;
/// Test fixtures for lifecycle and dispatch tests.
pub mod testing;

pub use backends::{EventSink, FailureHook, FileConnector, KafkaConnector, SinkConnector};
pub use config::TelemetryConfig;
pub use emitter::TelemetryEmitter;
pub use envelope::Envelope;
pub use errors::{Error, Result};
pub use events::{
    BlackCardPlayed, BrowserAgent, CardSource, DeckSummary, GeoLookup, PlayedCard,
};
pub use producer::ProducerCell;
