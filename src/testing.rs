// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)
// Parlor Telemetry - Test Fixtures

//! # Test Fixtures
//!
//! In-memory backend for exercising the lifecycle manager and dispatch path
//! without a broker. The shared [`MemoryHub`] records everything that happens
//! across connects and sinks, and lets tests inject connect failures, hold a
//! connect in progress behind a barrier, and trip the asynchronous
//! delivery-failure hook of the most recently connected sink.

use crate::backends::traits::{EventSink, FailureHook, SinkConnector};
use crate::errors::{Error, Result};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex, PoisonError};

/// Shared observation and fault-injection state for a [`MemoryConnector`]
/// and all sinks it has produced.
#[derive(Default)]
pub struct MemoryHub {
    connect_attempts: AtomicUsize,
    fail_connects: AtomicBool,
    fail_enqueues: AtomicBool,
    connect_gate: Mutex<Option<Arc<Barrier>>>,
    enqueued: Mutex<Vec<String>>,
    sink_close_calls: AtomicUsize,
    last_hook: Mutex<Option<FailureHook>>,
}

impl MemoryHub {
    /// Number of connect attempts made so far (successful or not).
    pub fn connect_attempts(&self) -> usize {
        self.connect_attempts.load(Ordering::SeqCst)
    }

    /// Make subsequent connect attempts fail.
    pub fn set_fail_connects(&self, fail: bool) {
        self.fail_connects.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent enqueues fail.
    pub fn set_fail_enqueues(&self, fail: bool) {
        self.fail_enqueues.store(fail, Ordering::SeqCst);
    }

    /// Park the next connect attempt on `barrier` before it completes.
    ///
    /// The connecting thread waits on the barrier while still holding the
    /// single-flight build lock, so a test can observe contention
    /// deterministically, then release it by waiting on the same barrier.
    pub fn hold_next_connect(&self, barrier: Arc<Barrier>) {
        let mut gate = self
            .connect_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *gate = Some(barrier);
    }

    /// All payloads enqueued across every sink, in enqueue order.
    pub fn enqueued(&self) -> Vec<String> {
        self.enqueued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Raw count of `close()` calls across every sink.
    ///
    /// Deliberately not deduplicated, so a double-close shows up as 2.
    pub fn sink_close_calls(&self) -> usize {
        self.sink_close_calls.load(Ordering::SeqCst)
    }

    /// The delivery-failure hook wired into the most recent sink.
    pub fn last_hook(&self) -> Option<FailureHook> {
        self.last_hook
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Invoke the most recent sink's delivery-failure hook, simulating the
    /// transport reporting an asynchronous delivery failure.
    ///
    /// Returns false when no sink has been connected yet.
    pub fn trip_delivery_failure(&self) -> bool {
        match self.last_hook() {
            Some(hook) => {
                hook();
                true
            }
            None => false,
        }
    }
}

/// In-memory [`SinkConnector`] for tests.
pub struct MemoryConnector {
    hub: Arc<MemoryHub>,
}

impl MemoryConnector {
    /// Create a connector with a fresh hub.
    #[must_use]
    pub fn new() -> Self {
        Self {
            hub: Arc::new(MemoryHub::default()),
        }
    }

    /// The hub shared by this connector and all its sinks.
    #[must_use]
    pub fn hub(&self) -> Arc<MemoryHub> {
        Arc::clone(&self.hub)
    }
}

impl Default for MemoryConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl SinkConnector for MemoryConnector {
    type Sink = MemorySink;

    fn connect(&self, on_delivery_failure: FailureHook) -> Result<MemorySink> {
        self.hub.connect_attempts.fetch_add(1, Ordering::SeqCst);

        let gate = {
            let mut gate = self
                .hub
                .connect_gate
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            gate.take()
        };
        if let Some(barrier) = gate {
            barrier.wait();
        }

        if self.hub.fail_connects.load(Ordering::SeqCst) {
            return Err(Error::Connect("synthetic connect failure".to_string()));
        }

        {
            let mut last = self
                .hub
                .last_hook
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            *last = Some(Arc::clone(&on_delivery_failure));
        }

        Ok(MemorySink {
            hub: Arc::clone(&self.hub),
            hook: on_delivery_failure,
        })
    }
}

/// In-memory [`EventSink`] recording enqueued payloads on its hub.
pub struct MemorySink {
    hub: Arc<MemoryHub>,
    hook: FailureHook,
}

impl MemorySink {
    /// Simulate the transport reporting delivery failure for this sink.
    pub fn fail_delivery(&self) {
        (self.hook)();
    }
}

impl EventSink for MemorySink {
    fn enqueue(&self, payload: &str) -> Result<()> {
        if self.hub.fail_enqueues.load(Ordering::SeqCst) {
            return Err(Error::Enqueue("synthetic enqueue failure".to_string()));
        }
        self.hub
            .enqueued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(payload.to_string());
        Ok(())
    }

    fn close(&self) {
        self.hub.sink_close_calls.fetch_add(1, Ordering::SeqCst);
    }
}
