// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)
// Parlor Telemetry - Backend Traits

//! # Telemetry Backend Traits
//!
//! Abstract traits for telemetry transports, allowing interchangeable
//! backends for different deployment scenarios: Kafka in production, a JSONL
//! file for local development, and an in-memory backend for tests.

use crate::errors::Result;
use std::sync::Arc;

/// Hook invoked when an enqueued payload fails asynchronous delivery.
///
/// The transport calls this from its own threads, possibly concurrently for
/// several in-flight payloads against the same sink, so implementations must
/// be reentrant-safe. The hook carries no payload: a failed event is already
/// lost by the time this fires.
pub type FailureHook = Arc<dyn Fn() + Send + Sync>;

/// A live connection to the event stream.
///
/// A sink accepts serialized envelopes for best-effort asynchronous delivery.
/// `enqueue` must not block beyond placing the payload into the transport's
/// bounded internal buffer; a saturated or terminally failed transport
/// returns an error instead of blocking.
pub trait EventSink: Send + Sync + 'static {
    /// Submit a serialized envelope for asynchronous delivery.
    fn enqueue(&self, payload: &str) -> Result<()>;

    /// Flush and release the underlying connection.
    ///
    /// Called at most once per sink by the lifecycle manager; must not panic.
    fn close(&self);
}

/// Factory for [`EventSink`]s, bound to one configured destination.
///
/// Connecting both constructs the transport client and verifies liveness; a
/// client whose connectivity has not been probed is not ready and must not be
/// returned.
pub trait SinkConnector: Send + Sync + 'static {
    /// The sink type this connector produces
    type Sink: EventSink;

    /// Construct and probe a new sink.
    ///
    /// `on_delivery_failure` is invoked once per enqueued payload whose
    /// asynchronous delivery fails. The connector wires it into the
    /// transport's completion callback; it outlives the returned sink.
    fn connect(&self, on_delivery_failure: FailureHook) -> Result<Self::Sink>;
}
