// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)
// Parlor Telemetry - Backends Module

//! Telemetry transport backends.

/// File-based (JSONL) backend for local development.
pub mod file;
/// Kafka backend for production deployments.
pub mod kafka;
/// Abstract backend traits.
pub mod traits;

pub use file::{FileConnector, FileSink};
pub use kafka::{KafkaConnector, KafkaSink};
pub use traits::{EventSink, FailureHook, SinkConnector};
