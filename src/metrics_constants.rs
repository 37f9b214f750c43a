// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)
// Parlor Telemetry - Metrics Constants
//
// All parlor_telemetry_* metric names are defined here and imported where
// needed, so names stay consistent across the crate.

//! Prometheus metric name constants for the telemetry pipeline.
//!
//! Metrics follow Prometheus naming conventions: counters end with `_total`.

/// Total number of events enqueued into the broker client's send buffer.
pub const METRIC_EVENTS_ENQUEUED_TOTAL: &str = "parlor_telemetry_events_enqueued_total";

/// Total number of events dropped because no live producer was available.
pub const METRIC_EVENTS_DROPPED_TOTAL: &str = "parlor_telemetry_events_dropped_total";

/// Total number of asynchronous delivery failures reported by the client.
pub const METRIC_DELIVERY_FAILURES_TOTAL: &str = "parlor_telemetry_delivery_failures_total";

/// Total number of failed producer construction attempts.
pub const METRIC_CONNECT_FAILURES_TOTAL: &str = "parlor_telemetry_connect_failures_total";
