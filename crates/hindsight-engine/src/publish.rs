//! State published by the runner thread for foreground consumption.
//!
//! One writer (the runner), many readers. The snapshot hand-off is a
//! single `Arc` swap under a mutex, so readers always observe a whole
//! committed tick. The scalar fields are atomics mirroring the latest
//! publication for cheap polling; the snapshot itself carries its own
//! tick, so a reader that needs tick and state to agree reads the
//! snapshot and ignores the mirrors.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use hindsight_core::{Snapshot, Tick};

use crate::error::SessionError;

/// Lifecycle state of a replay session, as last published.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunnerState {
    /// No log is open.
    Idle = 0,
    /// A log is open and playback is paused.
    Ready = 1,
    /// Advancing one tick per cadence interval.
    Playing = 2,
    /// Materializing a demanded tick.
    Seeking = 3,
    /// A terminal error ended the session; reads still work.
    Closed = 4,
}

impl RunnerState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => RunnerState::Idle,
            1 => RunnerState::Ready,
            2 => RunnerState::Playing,
            3 => RunnerState::Seeking,
            _ => RunnerState::Closed,
        }
    }
}

/// Runner-owned state shared with foreground handles.
#[derive(Debug)]
pub(crate) struct SharedState {
    snapshot: Mutex<Arc<Snapshot>>,
    current_tick: AtomicU64,
    last_known_tick: AtomicU64,
    playing: AtomicBool,
    seeking: AtomicBool,
    state: AtomicU8,
    error: Mutex<Option<SessionError>>,
}

impl SharedState {
    pub(crate) fn new() -> Self {
        Self {
            snapshot: Mutex::new(Arc::new(Snapshot::empty())),
            current_tick: AtomicU64::new(0),
            last_known_tick: AtomicU64::new(0),
            playing: AtomicBool::new(false),
            seeking: AtomicBool::new(false),
            state: AtomicU8::new(RunnerState::Ready as u8),
            error: Mutex::new(None),
        }
    }

    /// Swap in a freshly committed snapshot and refresh the mirrors.
    pub(crate) fn publish_snapshot(&self, snapshot: Arc<Snapshot>, last_known: Tick) {
        let tick = snapshot.tick();
        *self.snapshot.lock().unwrap() = snapshot;
        self.current_tick.store(tick.0, Ordering::Release);
        self.last_known_tick.store(last_known.0, Ordering::Release);
    }

    /// Refresh the frontier mirror without touching the snapshot.
    /// Used on the error path, where the store may sit between commits
    /// and must not be published.
    pub(crate) fn publish_last_known(&self, last_known: Tick) {
        self.last_known_tick.store(last_known.0, Ordering::Release);
    }

    /// The most recently published snapshot.
    pub(crate) fn latest_snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot.lock().unwrap())
    }

    pub(crate) fn current_tick(&self) -> Tick {
        Tick(self.current_tick.load(Ordering::Acquire))
    }

    pub(crate) fn last_known_tick(&self) -> Tick {
        Tick(self.last_known_tick.load(Ordering::Acquire))
    }

    pub(crate) fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    pub(crate) fn set_playing(&self, playing: bool) {
        self.playing.store(playing, Ordering::Release);
    }

    pub(crate) fn is_seeking(&self) -> bool {
        self.seeking.load(Ordering::Acquire)
    }

    pub(crate) fn set_seeking(&self, seeking: bool) {
        self.seeking.store(seeking, Ordering::Release);
    }

    pub(crate) fn state(&self) -> RunnerState {
        RunnerState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set_state(&self, state: RunnerState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Record the terminal error. Only the first error is kept.
    pub(crate) fn publish_error(&self, error: SessionError) {
        let mut slot = self.error.lock().unwrap();
        if slot.is_none() {
            *slot = Some(error);
        }
    }

    /// Take the terminal error, leaving `None` behind. Each error is
    /// therefore observed at most once.
    pub(crate) fn take_error(&self) -> Option<SessionError> {
        self.error.lock().unwrap().take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hindsight_codec::DecodeError;

    #[test]
    fn snapshot_publication_updates_mirrors() {
        let shared = SharedState::new();
        assert_eq!(shared.current_tick(), Tick(0));

        let snap = Arc::new(Snapshot::new(Tick(7), indexmap::IndexMap::new()));
        shared.publish_snapshot(snap, Tick(42));
        assert_eq!(shared.current_tick(), Tick(7));
        assert_eq!(shared.last_known_tick(), Tick(42));
        assert_eq!(shared.latest_snapshot().tick(), Tick(7));
    }

    #[test]
    fn first_error_wins_and_is_taken_once() {
        let shared = SharedState::new();
        shared.publish_error(SessionError::Decode(DecodeError::InvalidMagic));
        shared.publish_error(SessionError::Decode(DecodeError::UnsupportedVersion {
            found: 9,
        }));

        match shared.take_error() {
            Some(SessionError::Decode(DecodeError::InvalidMagic)) => {}
            other => panic!("expected the first error, got {other:?}"),
        }
        assert!(shared.take_error().is_none());
    }

    #[test]
    fn state_round_trips_through_the_atomic() {
        let shared = SharedState::new();
        assert_eq!(shared.state(), RunnerState::Ready);
        for state in [
            RunnerState::Idle,
            RunnerState::Playing,
            RunnerState::Seeking,
            RunnerState::Closed,
        ] {
            shared.set_state(state);
            assert_eq!(shared.state(), state);
        }
    }
}
