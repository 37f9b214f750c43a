// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)
// Parlor Telemetry - Producer Lifecycle Manager

//! # Producer Lifecycle Manager
//!
//! Owns zero-or-one live sink and guarantees that at most one construction
//! attempt proceeds at a time, without ever blocking the threads that only
//! want to use an already-live sink.
//!
//! ## Locking discipline
//!
//! Two locks with disjoint jobs:
//!
//! - The slot (`RwLock`) serializes *visibility* of the current sink. Readers
//!   take a short read lock; installers and clearers take a short write lock.
//! - The build lock (`Mutex`, always `try_lock`) serializes *construction*.
//!   Losing the race is a normal outcome: the loser returns immediately and
//!   its event is dropped by the dispatch layer. Readers never touch this
//!   lock, which keeps the hot path non-blocking.
//!
//! Every installed sink is tagged with a generation number. Delivery-failure
//! hooks clear the slot only when the occupant's generation matches, so a
//! stale callback from a replaced sink can never tear down its successor, and
//! concurrent callbacks against the same failed sink close it exactly once.

use crate::backends::traits::{EventSink, FailureHook, SinkConnector};
use crate::metrics_constants::METRIC_CONNECT_FAILURES_TOTAL;
use prometheus::Counter;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock, Mutex, PoisonError, RwLock, TryLockError, Weak};
use tracing::{debug, error, info};

static CONNECT_FAILURES_TOTAL: LazyLock<Counter> = LazyLock::new(|| {
    crate::metrics_utils::counter(
        METRIC_CONNECT_FAILURES_TOTAL,
        "Total number of failed producer construction attempts",
    )
});

struct Installed<S> {
    generation: u64,
    sink: Arc<S>,
}

struct CellState<S: EventSink> {
    slot: RwLock<Option<Installed<S>>>,
    build_lock: Mutex<()>,
    generations: AtomicU64,
}

impl<S: EventSink> CellState<S> {
    fn current(&self) -> Option<(u64, Arc<S>)> {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref()
            .map(|installed| (installed.generation, Arc::clone(&installed.sink)))
    }

    fn install(&self, generation: u64, sink: Arc<S>) -> Option<Installed<S>> {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        slot.replace(Installed { generation, sink })
    }

    /// Remove the occupant only if its generation matches.
    ///
    /// Clearing an empty slot or a mismatched generation is a no-op, which
    /// makes the delivery-failure hooks idempotent and harmless when stale.
    fn clear(&self, generation: u64) -> Option<Installed<S>> {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            Some(installed) if installed.generation == generation => slot.take(),
            _ => None,
        }
    }

    fn take(&self) -> Option<Installed<S>> {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        slot.take()
    }
}

/// Lazily-connected, failure-invalidated holder of one live sink.
///
/// Shared by all emitting threads; no thread owns the sink exclusively.
pub struct ProducerCell<C: SinkConnector> {
    connector: C,
    state: Arc<CellState<C::Sink>>,
}

impl<C: SinkConnector> ProducerCell<C> {
    /// Create an empty cell; the first [`ensure_ready`](Self::ensure_ready)
    /// call connects.
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            state: Arc::new(CellState {
                slot: RwLock::new(None),
                build_lock: Mutex::new(()),
                generations: AtomicU64::new(0),
            }),
        }
    }

    /// The connector this cell builds sinks with.
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// The currently installed sink, if any. Never triggers construction.
    pub fn current(&self) -> Option<Arc<C::Sink>> {
        self.state.current().map(|(_, sink)| sink)
    }

    /// Return the live sink, connecting one first if the slot is empty.
    ///
    /// The fast path is a single short read lock. When the slot is empty,
    /// exactly one caller wins the advisory build lock and pays the
    /// construct-and-probe cost (bounded by the connector's own timeout);
    /// every other concurrent caller returns `None` immediately and its event
    /// is dropped upstream. Construction failure also returns `None`, leaving
    /// the slot empty so a later call retries from scratch.
    pub fn ensure_ready(&self) -> Option<(u64, Arc<C::Sink>)> {
        if let Some(live) = self.state.current() {
            return Some(live);
        }

        let _guard = match self.state.build_lock.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => {
                debug!("another thread is connecting the telemetry producer");
                return None;
            }
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };

        let generation = self.state.generations.fetch_add(1, Ordering::Relaxed) + 1;
        let hook = Self::failure_hook(&self.state, generation);
        info!(generation, "connecting telemetry producer");
        match self.connector.connect(hook) {
            Ok(sink) => {
                let sink = Arc::new(sink);
                if let Some(stale) = self.state.install(generation, Arc::clone(&sink)) {
                    // Tolerated race: a concurrent recreation finished while
                    // this one was building.
                    info!(
                        stale_generation = stale.generation,
                        "closing replaced producer"
                    );
                    stale.sink.close();
                }
                Some((generation, sink))
            }
            Err(e) => {
                CONNECT_FAILURES_TOTAL.inc();
                error!(error = %e, "failed to connect telemetry producer");
                None
            }
        }
    }

    /// Tear down the sink installed under `generation`, if it still is.
    ///
    /// Used by the dispatch layer when a synchronous enqueue fails; the
    /// asynchronous delivery path goes through the failure hook instead.
    pub fn invalidate(&self, generation: u64) {
        if let Some(failed) = self.state.clear(generation) {
            info!(generation, "telemetry producer invalidated");
            failed.sink.close();
        }
    }

    /// Close the current sink if present. Idempotent; never panics.
    pub fn shutdown(&self) {
        if let Some(installed) = self.state.take() {
            installed.sink.close();
        }
    }

    fn failure_hook(state: &Arc<CellState<C::Sink>>, generation: u64) -> FailureHook {
        let weak: Weak<CellState<C::Sink>> = Arc::downgrade(state);
        Arc::new(move || {
            let Some(state) = weak.upgrade() else {
                return;
            };
            if let Some(failed) = state.clear(generation) {
                info!(
                    generation,
                    "telemetry producer invalidated after delivery failure"
                );
                failed.sink.close();
            }
        })
    }
}
