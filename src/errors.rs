// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)
// Parlor Telemetry - Error Types

//! # Telemetry Error Types
//!
//! Error taxonomy for the telemetry pipeline. These errors flow between
//! internal components only; nothing in this crate surfaces an error to the
//! code that emits an event. A failed event is logged and lost.

use thiserror::Error;

/// Errors from the telemetry pipeline
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Invalid configuration supplied at construction time
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Broker client could not be constructed
    #[error("Connect error: {0}")]
    Connect(String),

    /// Topic metadata could not be fetched during the liveness probe
    #[error("Metadata error: {0}")]
    Metadata(String),

    /// Payload could not be enqueued into the client's send buffer
    #[error("Enqueue error: {0}")]
    Enqueue(String),

    /// Envelope serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error (file backend)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for telemetry operations
pub type Result<T> = std::result::Result<T, Error>;
