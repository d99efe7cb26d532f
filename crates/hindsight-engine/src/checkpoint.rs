//! Checkpoint index: sparse state snapshots for bounded-cost seeks.

use std::sync::Arc;

use hindsight_core::{Snapshot, Tick};

use crate::store::EntityStore;

/// One captured state.
///
/// `offset` is the byte position of the first record after `tick`'s
/// boundary, so restoring means loading `state` and resuming the
/// decoder exactly there.
#[derive(Clone, Debug)]
pub struct Checkpoint {
    /// Tick whose committed state this checkpoint holds.
    pub tick: Tick,
    /// Byte offset to resume decoding from.
    pub offset: u64,
    /// Immutable deep copy of the state at `tick`.
    pub state: Arc<Snapshot>,
}

/// Append-only index of checkpoints at a fixed tick spacing.
///
/// Seeded at construction with a synthetic entry for tick 0 (empty
/// state, first-record offset), which makes
/// [`nearest_at_or_before`](CheckpointIndex::nearest_at_or_before)
/// total: every target has an ancestor to restore from. Entries are
/// never rewritten; re-traversing already-captured territory after a
/// restore leaves the index untouched.
///
/// Memory is one retained snapshot per `interval` of session length;
/// any seek replays at most `interval` ticks after its restore. The
/// interval trades those two directly.
#[derive(Debug)]
pub struct CheckpointIndex {
    entries: Vec<Checkpoint>,
    interval: u64,
}

impl CheckpointIndex {
    /// Index seeded with the tick-0 entry at `data_start`.
    pub fn new(interval: u64, data_start: u64) -> Self {
        let zero = Checkpoint {
            tick: Tick(0),
            offset: data_start,
            state: Arc::new(Snapshot::empty()),
        };
        Self {
            entries: vec![zero],
            interval,
        }
    }

    /// Configured tick spacing.
    pub fn interval(&self) -> u64 {
        self.interval
    }

    /// Number of stored checkpoints (the seeded entry included).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false: the seeded entry never leaves.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The most recent checkpoint.
    pub fn last(&self) -> &Checkpoint {
        self.entries.last().expect("index is seeded at construction")
    }

    /// Capture the store's state if `tick` sits on the interval grid
    /// and extends the index. Returns whether a capture happened.
    ///
    /// The caller must hold the store materialized exactly at `tick`.
    pub fn maybe_capture(&mut self, tick: Tick, offset: u64, store: &EntityStore) -> bool {
        if tick.0 % self.interval != 0 {
            return false;
        }
        if tick <= self.last().tick {
            return false;
        }
        self.push(tick, offset, store);
        true
    }

    /// Capture the final tick's state when end of stream is
    /// discovered, whether or not it sits on the grid. Returns whether
    /// a capture happened (false when the grid already covered it).
    pub fn capture_end(&mut self, tick: Tick, offset: u64, store: &EntityStore) -> bool {
        if tick <= self.last().tick {
            return false;
        }
        self.push(tick, offset, store);
        true
    }

    /// The checkpoint with the greatest tick at or before `tick`.
    pub fn nearest_at_or_before(&self, tick: Tick) -> &Checkpoint {
        let idx = self.entries.partition_point(|c| c.tick <= tick);
        // idx >= 1: the seeded tick-0 entry satisfies the predicate.
        &self.entries[idx - 1]
    }

    fn push(&mut self, tick: Tick, offset: u64, store: &EntityStore) {
        self.entries.push(Checkpoint {
            tick,
            offset,
            state: Arc::new(store.snapshot(tick)),
        });
    }
}
