//! Session instrumentation counters.
//!
//! Cheap cumulative counters, not an observability layer: they exist
//! so tests and benchmarks can assert how much work a seek actually
//! performed (records applied, checkpoints restored) without reaching
//! into the worker.

use std::sync::atomic::{AtomicU64, Ordering};

/// Cumulative work counters for one session.
///
/// Written by the runner thread with relaxed stores, readable from any
/// thread at any time via [`snapshot`](SessionStats::snapshot). Reset
/// only by opening a new session (each session gets a fresh instance).
#[derive(Debug, Default)]
pub struct SessionStats {
    records_applied: AtomicU64,
    ticks_committed: AtomicU64,
    checkpoints_captured: AtomicU64,
    checkpoint_restores: AtomicU64,
    seeks_completed: AtomicU64,
    seeks_interrupted: AtomicU64,
}

impl SessionStats {
    pub(crate) fn add_records_applied(&self, n: u64) {
        self.records_applied.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn add_tick_committed(&self) {
        self.ticks_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_checkpoint_captured(&self) {
        self.checkpoints_captured.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_checkpoint_restore(&self) {
        self.checkpoint_restores.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_seek_completed(&self) {
        self.seeks_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_seek_interrupted(&self) {
        self.seeks_interrupted.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            records_applied: self.records_applied.load(Ordering::Relaxed),
            ticks_committed: self.ticks_committed.load(Ordering::Relaxed),
            checkpoints_captured: self.checkpoints_captured.load(Ordering::Relaxed),
            checkpoint_restores: self.checkpoint_restores.load(Ordering::Relaxed),
            seeks_completed: self.seeks_completed.load(Ordering::Relaxed),
            seeks_interrupted: self.seeks_interrupted.load(Ordering::Relaxed),
        }
    }
}

/// Plain copy of [`SessionStats`] counters at one instant.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Change records applied to the store, including re-application
    /// after checkpoint restores.
    pub records_applied: u64,
    /// Batches committed to the store (one per boundary applied).
    pub ticks_committed: u64,
    /// Checkpoints captured into the index.
    pub checkpoints_captured: u64,
    /// Seeks that restored state from a checkpoint.
    pub checkpoint_restores: u64,
    /// Seeks that ran to completion.
    pub seeks_completed: u64,
    /// Seeks abandoned mid-flight because newer intent arrived.
    pub seeks_interrupted: u64,
}
