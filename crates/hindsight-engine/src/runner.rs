//! Session worker thread.
//!
//! The runner owns the [`Timeline`] exclusively (moved in via
//! `thread::spawn`). Control messages arrive over an unbounded
//! crossbeam channel and carry intent only; all decoding and state
//! mutation happens here. Seeks poll the channel between records, so
//! a newer demand interrupts a long replay instead of queueing behind
//! it.

use std::io::{Read, Seek};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};

use hindsight_core::Tick;

use crate::error::SessionError;
use crate::publish::{RunnerState, SharedState};
use crate::timeline::{SeekResult, Timeline};

/// Control messages from the foreground to the runner.
pub(crate) enum ControlMsg {
    /// Demand the state at a tick. A newer demand supersedes an older
    /// one that has not finished materializing.
    Seek(Tick),
    /// Start or pause playback.
    SetPlaying(bool),
    /// Stop the thread.
    Shutdown,
}

/// State held by the runner thread's main loop.
pub(crate) struct Runner<R: Read> {
    timeline: Timeline<R>,
    shared: Arc<SharedState>,
    rx: Receiver<ControlMsg>,
    /// Wall-clock duration of one playback tick.
    cadence: Duration,
    /// The demand currently being materialized, if any.
    demanded: Option<Tick>,
    playing: bool,
    /// Set after a terminal error; demands are ignored from then on.
    closed: bool,
}

impl<R: Read + Seek> Runner<R> {
    pub fn new(
        timeline: Timeline<R>,
        shared: Arc<SharedState>,
        rx: Receiver<ControlMsg>,
        cadence: Duration,
    ) -> Self {
        Self {
            timeline,
            shared,
            rx,
            cadence,
            demanded: None,
            playing: false,
            closed: false,
        }
    }

    /// Main loop. Runs until a shutdown message arrives or every
    /// sender is gone.
    pub fn run(mut self) {
        loop {
            // Idle: nothing demanded, not playing. Block until the
            // controller says otherwise.
            if self.demanded.is_none() && !self.playing {
                match self.rx.recv() {
                    Ok(msg) => {
                        if self.handle(msg) {
                            return;
                        }
                    }
                    Err(_) => return,
                }
            }

            if self.drain() {
                return;
            }
            if let Some(target) = self.demanded {
                if self.execute_seek(target) {
                    return;
                }
                continue;
            }
            if self.playing && self.advance_playback() {
                return;
            }
        }
    }

    /// Apply one control message. Returns true on shutdown.
    fn handle(&mut self, msg: ControlMsg) -> bool {
        match msg {
            ControlMsg::Seek(target) => {
                if !self.closed {
                    self.demanded = Some(target);
                }
            }
            ControlMsg::SetPlaying(playing) => {
                if !self.closed {
                    self.playing = playing;
                    self.shared.set_playing(playing);
                    // While a demand is in flight the published state
                    // stays Seeking; execute_seek settles it.
                    if self.demanded.is_none() {
                        self.shared.set_state(if playing {
                            RunnerState::Playing
                        } else {
                            RunnerState::Ready
                        });
                    }
                }
            }
            ControlMsg::Shutdown => return true,
        }
        false
    }

    /// Drain every queued message so only the latest demand survives.
    /// Returns true on shutdown.
    fn drain(&mut self) -> bool {
        loop {
            match self.rx.try_recv() {
                Ok(msg) => {
                    if self.handle(msg) {
                        return true;
                    }
                }
                Err(TryRecvError::Empty) => return false,
                Err(TryRecvError::Disconnected) => return true,
            }
        }
    }

    /// Materialize the demanded tick. Returns true on shutdown.
    fn execute_seek(&mut self, target: Tick) -> bool {
        self.shared.set_seeking(true);
        self.shared.set_state(RunnerState::Seeking);
        let rx = &self.rx;
        match self.timeline.seek(target, || !rx.is_empty()) {
            Ok(SeekResult::Done) => {
                self.demanded = None;
                self.publish_current();
                self.shared.set_seeking(false);
                self.shared.set_state(if self.playing {
                    RunnerState::Playing
                } else {
                    RunnerState::Ready
                });
            }
            Ok(SeekResult::Interrupted) => {
                // A message is queued. Keep the demand; the next drain
                // decides whether it still stands.
            }
            Err(e) => self.fail(e),
        }
        false
    }

    /// Advance playback by one tick and wait out the cadence.
    /// Returns true on shutdown.
    fn advance_playback(&mut self) -> bool {
        let current = self.timeline.current_tick();
        if self.timeline.end_known() && current >= self.timeline.last_known_tick() {
            tracing::debug!(tick = current.0, "playback reached the end");
            self.playing = false;
            self.shared.set_playing(false);
            self.shared.set_state(RunnerState::Ready);
            return false;
        }

        let started = Instant::now();
        let rx = &self.rx;
        match self.timeline.seek(Tick(current.0 + 1), || !rx.is_empty()) {
            Ok(SeekResult::Done) => self.publish_current(),
            // A message is queued; let the main loop drain it.
            Ok(SeekResult::Interrupted) => return false,
            Err(e) => {
                self.fail(e);
                return false;
            }
        }

        // Sleep out the rest of the tick, waking early for messages.
        if let Some(remaining) = self.cadence.checked_sub(started.elapsed()) {
            match self.rx.recv_timeout(remaining) {
                Ok(msg) => return self.handle(msg),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return true,
            }
        }
        false
    }

    /// Publish the materialized state.
    fn publish_current(&mut self) {
        let snapshot = Arc::new(self.timeline.snapshot());
        self.shared
            .publish_snapshot(snapshot, self.timeline.last_known_tick());
    }

    /// Terminal error: publish it, freeze the published state, and
    /// stop accepting demands. The store may sit between commits here,
    /// so the last committed snapshot stays the published one.
    fn fail(&mut self, error: SessionError) {
        tracing::warn!(error = %error, "session failed; closing");
        self.playing = false;
        self.demanded = None;
        self.closed = true;
        self.shared.set_playing(false);
        self.shared.set_seeking(false);
        self.shared.publish_last_known(self.timeline.last_known_tick());
        self.shared.publish_error(error);
        self.shared.set_state(RunnerState::Closed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::stats::SessionStats;
    use hindsight_codec::{DecodeError, LogReader};
    use hindsight_test_utils::lifecycle_log;
    use std::io::Cursor;

    fn make_runner() -> (Runner<Cursor<Vec<u8>>>, crossbeam_channel::Sender<ControlMsg>) {
        let reader = LogReader::open(Cursor::new(lifecycle_log())).unwrap();
        let config = EngineConfig::default();
        let stats = Arc::new(SessionStats::default());
        let timeline = Timeline::new(reader, &config, stats);
        let shared = Arc::new(SharedState::new());
        let (tx, rx) = crossbeam_channel::unbounded();
        (
            Runner::new(timeline, shared, rx, Duration::from_millis(1)),
            tx,
        )
    }

    #[test]
    fn latest_demand_wins() {
        let (mut runner, tx) = make_runner();
        tx.send(ControlMsg::Seek(Tick(3))).unwrap();
        tx.send(ControlMsg::Seek(Tick(8))).unwrap();
        assert!(!runner.drain());
        assert_eq!(runner.demanded, Some(Tick(8)));
    }

    #[test]
    fn shutdown_stops_the_loop() {
        let (mut runner, _tx) = make_runner();
        assert!(runner.handle(ControlMsg::Shutdown));
    }

    #[test]
    fn set_playing_reaches_the_shared_state() {
        let (mut runner, _tx) = make_runner();
        runner.handle(ControlMsg::SetPlaying(true));
        assert!(runner.playing);
        assert!(runner.shared.is_playing());
        assert_eq!(runner.shared.state(), RunnerState::Playing);
    }

    #[test]
    fn completed_seek_publishes_and_settles() {
        let (mut runner, _tx) = make_runner();
        runner.demanded = Some(Tick(6));
        assert!(!runner.execute_seek(Tick(6)));

        assert_eq!(runner.demanded, None);
        assert_eq!(runner.shared.current_tick(), Tick(6));
        assert_eq!(runner.shared.latest_snapshot().len(), 2);
        assert!(!runner.shared.is_seeking());
        assert_eq!(runner.shared.state(), RunnerState::Ready);
    }

    #[test]
    fn queued_message_interrupts_a_seek() {
        let (mut runner, tx) = make_runner();
        runner.demanded = Some(Tick(9));
        // A message is already waiting, so the interrupt fires on the
        // first poll and the demand stays pending.
        tx.send(ControlMsg::Seek(Tick(2))).unwrap();
        assert!(!runner.execute_seek(Tick(9)));
        assert_eq!(runner.demanded, Some(Tick(9)));
        assert_eq!(runner.shared.state(), RunnerState::Seeking);

        // The drain then swaps in the newer demand.
        assert!(!runner.drain());
        assert_eq!(runner.demanded, Some(Tick(2)));
    }

    #[test]
    fn closed_runner_ignores_demands() {
        let (mut runner, _tx) = make_runner();
        runner.fail(SessionError::Decode(DecodeError::InvalidMagic));
        assert_eq!(runner.shared.state(), RunnerState::Closed);

        runner.handle(ControlMsg::Seek(Tick(5)));
        runner.handle(ControlMsg::SetPlaying(true));
        assert_eq!(runner.demanded, None);
        assert!(!runner.playing);
        assert_eq!(runner.shared.state(), RunnerState::Closed);
    }
}
