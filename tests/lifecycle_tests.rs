// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)
// Parlor Telemetry - Lifecycle Concurrency Tests

//! Concurrency properties of the producer lifecycle manager: single-flight
//! construction, drop-on-contention, and idempotent failure invalidation.
//! All tests run against the in-memory backend; the connect gate parks the
//! winning thread inside `connect()` so contention windows are deterministic.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use parlor_telemetry::producer::ProducerCell;
use parlor_telemetry::testing::MemoryConnector;
use parlor_telemetry::TelemetryEmitter;
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn test_single_flight_under_concurrent_demand() {
    let connector = MemoryConnector::new();
    let hub = connector.hub();
    let cell = Arc::new(ProducerCell::new(connector));

    let gate = Arc::new(Barrier::new(2));
    hub.hold_next_connect(Arc::clone(&gate));

    // The winner parks inside connect() while holding the build lock.
    let winner = {
        let cell = Arc::clone(&cell);
        thread::spawn(move || cell.ensure_ready().is_some())
    };
    while hub.connect_attempts() == 0 {
        thread::yield_now();
    }

    // Every concurrent caller observes contention and returns immediately
    // without constructing anything.
    let losers: Vec<_> = (0..4)
        .map(|_| {
            let cell = Arc::clone(&cell);
            thread::spawn(move || cell.ensure_ready().is_none())
        })
        .collect();
    for loser in losers {
        assert!(
            loser.join().unwrap(),
            "contending caller must not block or build"
        );
    }

    gate.wait();
    assert!(winner.join().unwrap());
    assert_eq!(hub.connect_attempts(), 1);
    assert!(cell.current().is_some());
}

#[test]
fn test_event_dropped_while_construction_in_progress() {
    let connector = MemoryConnector::new();
    let hub = connector.hub();
    let emitter = Arc::new(TelemetryEmitter::with_connector("build-1", connector));

    let gate = Arc::new(Barrier::new(2));
    hub.hold_next_connect(Arc::clone(&gate));

    let winner = {
        let emitter = Arc::clone(&emitter);
        thread::spawn(move || emitter.server_start("s-1"))
    };
    while hub.connect_attempts() == 0 {
        thread::yield_now();
    }

    // This event arrives while the build lock is held: dropped, not blocked.
    emitter.user_disconnect("sess-1");
    assert!(hub.enqueued().is_empty());

    gate.wait();
    winner.join().unwrap();

    // Only the winner's event made it out.
    let enqueued = hub.enqueued();
    assert_eq!(enqueued.len(), 1);
    assert!(enqueued[0].contains("serverStart"));
}

#[test]
fn test_concurrent_delivery_failures_close_once() {
    let connector = MemoryConnector::new();
    let hub = connector.hub();
    let cell = Arc::new(ProducerCell::new(connector));
    cell.ensure_ready().unwrap();

    let hook = hub.last_hook().unwrap();
    let start = Arc::new(Barrier::new(2));
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let hook = Arc::clone(&hook);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                hook();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(cell.current().is_none());
    assert_eq!(hub.sink_close_calls(), 1);

    // Clearing the already-absent handle again stays a no-op.
    hook();
    assert_eq!(hub.sink_close_calls(), 1);
}

#[test]
fn test_failure_then_send_reconnects_exactly_once() {
    let connector = MemoryConnector::new();
    let hub = connector.hub();
    let emitter = TelemetryEmitter::with_connector("build-1", connector);

    emitter.server_start("s-1");
    assert_eq!(hub.connect_attempts(), 1);

    hub.trip_delivery_failure();
    emitter.user_disconnect("sess-1");
    assert_eq!(hub.connect_attempts(), 2);
    assert_eq!(hub.enqueued().len(), 2);
}

#[test]
fn test_many_threads_share_one_connection() {
    let connector = MemoryConnector::new();
    let hub = connector.hub();
    let emitter = Arc::new(TelemetryEmitter::with_connector("build-1", connector));

    // Warm the connection so every thread below finds a live handle.
    emitter.server_start("warmup");

    let threads: Vec<_> = (0..8)
        .map(|t| {
            let emitter = Arc::clone(&emitter);
            thread::spawn(move || {
                for i in 0..50 {
                    emitter.user_disconnect(&format!("sess-{t}-{i}"));
                }
            })
        })
        .collect();
    for handle in threads {
        handle.join().unwrap();
    }

    assert_eq!(hub.connect_attempts(), 1);
    assert_eq!(hub.enqueued().len(), 1 + 8 * 50);
}
