// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)
// Parlor Telemetry - Metrics Helpers

//! Internal helpers for registering Prometheus metrics.

use prometheus::Counter;

/// Create a counter and register it on the default registry.
///
/// Registration can race when two `LazyLock`s resolve the same name in
/// parallel test binaries; the duplicate registration is logged and the local
/// handle still counts.
pub(crate) fn counter(name: &str, help: &str) -> Counter {
    #[allow(clippy::expect_used)] // Invariant: metric names here are static and valid
    let counter = Counter::new(name, help).expect("valid metric definition");
    if let Err(e) = prometheus::default_registry().register(Box::new(counter.clone())) {
        tracing::debug!(metric = name, error = %e, "metric already registered");
    }
    counter
}
