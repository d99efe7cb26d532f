//! Synchronous seek core.
//!
//! [`Timeline`] owns the decoder, the entity store, and the checkpoint
//! index, and knows how to move the materialized state to any tick.
//! It has no thread of its own; the runner drives it and decides when
//! a seek should yield to newer demands via the `interrupt` callback.
//!
//! Movement strategy per seek:
//!
//! - forward, with no checkpoint between here and the target: keep
//!   decoding and applying from the current position,
//! - anything else: restore the nearest checkpoint at or before the
//!   target, rewind the decoder to its offset, and replay forward.
//!
//! Records are staged per batch and applied only once the batch's
//! boundary record arrives. Interruption lands between record reads
//! and between commits, so at every point the runner can observe, the
//! store holds a whole committed tick.

use std::cmp;
use std::io::{Read, Seek};
use std::mem;
use std::sync::Arc;

use hindsight_codec::{DecodeError, LogHeader, LogReader};
use hindsight_core::record::ChangeRecord;
use hindsight_core::{Snapshot, Tick};

use crate::checkpoint::CheckpointIndex;
use crate::config::EngineConfig;
use crate::error::SessionError;
use crate::stats::SessionStats;
use crate::store::EntityStore;

/// How a seek call ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeekResult {
    /// The state now sits at the (clamped) target tick.
    Done,
    /// The interrupt callback fired; the seek stopped at a record
    /// edge. Calling [`Timeline::seek`] again continues the work.
    Interrupted,
}

/// Tick-addressable view over a session log.
pub struct Timeline<R: Read> {
    reader: LogReader<R>,
    store: EntityStore,
    index: CheckpointIndex,
    stats: Arc<SessionStats>,
    /// Tick the store currently materializes.
    current: Tick,
    /// Highest tick ever committed; the last known tick once
    /// `end_known` is set.
    frontier: Tick,
    end_known: bool,
    /// Records of the batch being staged, not yet committed.
    pending: Vec<ChangeRecord>,
    /// Byte offset of the first staged record.
    pending_start: u64,
    /// Boundary read for the staged batch, once seen.
    pending_boundary: Option<Tick>,
    /// Set when an apply failure left the store between commits; the
    /// next seek must restore before replaying.
    needs_restore: bool,
}

impl<R: Read> Timeline<R> {
    /// Wrap an opened reader. State starts at tick 0, empty.
    pub fn new(reader: LogReader<R>, config: &EngineConfig, stats: Arc<SessionStats>) -> Self {
        let index = CheckpointIndex::new(config.checkpoint_interval, reader.data_start());
        Self {
            reader,
            store: EntityStore::new(),
            index,
            stats,
            current: Tick(0),
            frontier: Tick(0),
            end_known: false,
            pending: Vec::new(),
            pending_start: 0,
            pending_boundary: None,
            needs_restore: false,
        }
    }

    /// Tick the store currently materializes.
    pub fn current_tick(&self) -> Tick {
        self.current
    }

    /// Highest tick observed so far. Once [`end_known`](Self::end_known)
    /// reports true this is the final tick of the log.
    pub fn last_known_tick(&self) -> Tick {
        self.frontier
    }

    /// Whether the end of the log has been reached at least once.
    pub fn end_known(&self) -> bool {
        self.end_known
    }

    /// Header metadata of the underlying log.
    pub fn header(&self) -> &LogHeader {
        self.reader.header()
    }

    /// The checkpoint index, mostly for instrumentation.
    pub fn checkpoints(&self) -> &CheckpointIndex {
        &self.index
    }

    /// Deep copy of the state at [`current_tick`](Self::current_tick).
    ///
    /// Consistent whenever the last seek returned `Ok`; after an
    /// error the store can sit inside a partially applied batch.
    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot(self.current)
    }

    /// Clamp a target into the playable range. Targets beyond the end
    /// are pulled back only once the end has been discovered; before
    /// that the log's true length is unknown and the seek itself will
    /// stop at the final tick.
    pub fn clamp(&self, target: Tick) -> Tick {
        if self.end_known && target > self.frontier {
            self.frontier
        } else {
            target
        }
    }
}

impl<R: Read + Seek> Timeline<R> {
    /// Move the materialized state to `target`, clamped into range.
    ///
    /// `interrupt` is polled between records; when it returns true the
    /// seek stops early with [`SeekResult::Interrupted`] and a later
    /// call picks the work back up. Errors are terminal for the
    /// timeline: the decoder position is unspecified afterwards and
    /// the frontier stays frozen at the last committed tick.
    pub fn seek(
        &mut self,
        target: Tick,
        mut interrupt: impl FnMut() -> bool,
    ) -> Result<SeekResult, SessionError> {
        let target = self.clamp(target);
        let forward = !self.needs_restore
            && target >= self.current
            && self.index.nearest_at_or_before(target).tick <= self.current;
        if !forward {
            self.restore_checkpoint(target)?;
        }
        let result = self.replay_until(target, &mut interrupt)?;
        match result {
            SeekResult::Done => self.stats.add_seek_completed(),
            SeekResult::Interrupted => self.stats.add_seek_interrupted(),
        }
        Ok(result)
    }

    /// Load the nearest checkpoint at or before `target` and rewind
    /// the decoder to its offset.
    fn restore_checkpoint(&mut self, target: Tick) -> Result<(), SessionError> {
        let (tick, offset, state) = {
            let cp = self.index.nearest_at_or_before(target);
            (cp.tick, cp.offset, Arc::clone(&cp.state))
        };
        tracing::debug!(tick = tick.0, offset, "restoring checkpoint");
        self.store.restore(&state);
        self.reader.rewind_to(offset, tick)?;
        self.current = tick;
        self.pending.clear();
        self.pending_boundary = None;
        self.needs_restore = false;
        self.stats.add_checkpoint_restore();
        Ok(())
    }

    fn replay_until(
        &mut self,
        target: Tick,
        interrupt: &mut impl FnMut() -> bool,
    ) -> Result<SeekResult, SessionError> {
        loop {
            if self.current >= target {
                return Ok(SeekResult::Done);
            }
            if let Some(boundary) = self.pending_boundary {
                if boundary > target {
                    // The next commit lies beyond the target, so the
                    // state at `target` equals the state already
                    // materialized. The staged batch stays staged for
                    // a later forward seek.
                    self.current = target;
                    return Ok(SeekResult::Done);
                }
                self.apply_pending(boundary)?;
                continue;
            }
            if interrupt() {
                return Ok(SeekResult::Interrupted);
            }
            let at = self.reader.position();
            match self.reader.next_record()? {
                None => {
                    if !self.pending.is_empty() {
                        return Err(SessionError::Decode(DecodeError::MalformedRecord {
                            offset: self.pending_start,
                            detail: "log ends inside an uncommitted batch".to_string(),
                        }));
                    }
                    self.end_known = true;
                    if self.index.capture_end(self.frontier, at, &self.store) {
                        self.stats.add_checkpoint_captured();
                        tracing::debug!(
                            tick = self.frontier.0,
                            offset = at,
                            "captured end-of-log checkpoint"
                        );
                    }
                    tracing::debug!(last_tick = self.frontier.0, "reached end of log");
                    self.current = self.frontier;
                    return Ok(SeekResult::Done);
                }
                Some(ChangeRecord::Boundary { tick }) => {
                    self.pending_boundary = Some(tick);
                }
                Some(record) => {
                    if self.pending.is_empty() {
                        self.pending_start = at;
                    }
                    self.pending.push(record);
                }
            }
        }
    }

    /// Commit the staged batch as tick `boundary`.
    ///
    /// The batch applies in one piece. Interruption happens between
    /// record reads and between commits, never halfway through a
    /// batch, so every interrupted seek leaves the store at a
    /// committed tick and a later call can simply continue.
    fn apply_pending(&mut self, boundary: Tick) -> Result<(), SessionError> {
        let records = mem::take(&mut self.pending);
        self.pending_boundary = None;
        for record in &records {
            if let Err(source) = self.store.apply(record) {
                self.needs_restore = true;
                return Err(SessionError::Consistency {
                    tick: boundary,
                    source,
                });
            }
            self.stats.add_records_applied(1);
        }
        self.current = boundary;
        self.frontier = cmp::max(self.frontier, boundary);
        self.stats.add_tick_committed();
        let offset = self.reader.position();
        if self.index.maybe_capture(boundary, offset, &self.store) {
            self.stats.add_checkpoint_captured();
            tracing::debug!(tick = boundary.0, offset, "captured checkpoint");
        }
        // Hand the allocation back for the next batch.
        self.pending = records;
        self.pending.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hindsight_core::{EntityId, PropList, PropValue};
    use hindsight_test_utils::{created, lifecycle_log, props, stamped_log, updated_int, LogBuilder};
    use std::io::Cursor;

    fn open_timeline(
        bytes: Vec<u8>,
        interval: u64,
    ) -> (Timeline<Cursor<Vec<u8>>>, Arc<SessionStats>) {
        let reader = LogReader::open(Cursor::new(bytes)).unwrap();
        let config = EngineConfig {
            checkpoint_interval: interval,
            ..EngineConfig::default()
        };
        let stats = Arc::new(SessionStats::default());
        let timeline = Timeline::new(reader, &config, Arc::clone(&stats));
        (timeline, stats)
    }

    fn hp(timeline: &Timeline<Cursor<Vec<u8>>>, id: u32, key: &str) -> Option<PropValue> {
        timeline
            .snapshot()
            .entity(EntityId(id))
            .and_then(|e| e.property(key).cloned())
    }

    #[test]
    fn forward_seek_materializes_state() {
        let (mut timeline, stats) = open_timeline(lifecycle_log(), 1000);

        assert_eq!(timeline.seek(Tick(6), || false).unwrap(), SeekResult::Done);
        assert_eq!(timeline.current_tick(), Tick(6));
        let at_six = timeline.snapshot();
        assert_eq!(at_six.len(), 2);
        assert!(at_six.entity(EntityId(2)).is_none());
        assert_eq!(hp(&timeline, 0, "hp"), Some(PropValue::Int(90)));
        assert_eq!(hp(&timeline, 1, "hp"), Some(PropValue::Int(75)));

        // Continuing forward picks up the recreation with fresh props.
        assert_eq!(timeline.seek(Tick(9), || false).unwrap(), SeekResult::Done);
        let at_nine = timeline.snapshot();
        assert_eq!(at_nine.len(), 3);
        let charlie = at_nine.entity(EntityId(2)).unwrap();
        assert_eq!(charlie.property("shield"), Some(&PropValue::Int(30)));
        assert_eq!(charlie.property("hp"), None);
        assert_eq!(stats.snapshot().checkpoint_restores, 0);
    }

    #[test]
    fn backward_seek_restores_and_replays() {
        let (mut timeline, stats) = open_timeline(lifecycle_log(), 2);
        timeline.seek(Tick(10), || false).unwrap();
        assert_eq!(stats.snapshot().ticks_committed, 10);

        timeline.seek(Tick(5), || false).unwrap();
        assert_eq!(timeline.current_tick(), Tick(5));
        let state = timeline.snapshot();
        assert_eq!(state.len(), 2);
        assert!(state.entity(EntityId(2)).is_none());
        assert_eq!(hp(&timeline, 1, "hp"), Some(PropValue::Int(100)));

        let s = stats.snapshot();
        assert_eq!(s.checkpoint_restores, 1);
        // Restored the tick-4 checkpoint, replayed only tick 5.
        assert_eq!(s.ticks_committed, 11);
    }

    #[test]
    fn seek_beyond_end_stops_at_final_tick() {
        let (mut timeline, stats) = open_timeline(lifecycle_log(), 1000);
        assert_eq!(
            timeline.seek(Tick(u64::MAX), || false).unwrap(),
            SeekResult::Done
        );
        assert_eq!(timeline.current_tick(), Tick(10));
        assert_eq!(timeline.last_known_tick(), Tick(10));
        assert!(timeline.end_known());

        // The final tick got a checkpoint even though the interval
        // grid never reached it.
        assert_eq!(timeline.checkpoints().nearest_at_or_before(Tick(10)).tick, Tick(10));

        // Later out-of-range targets clamp without replaying anything.
        let committed = stats.snapshot().ticks_committed;
        timeline.seek(Tick(50), || false).unwrap();
        assert_eq!(timeline.current_tick(), Tick(10));
        assert_eq!(stats.snapshot().ticks_committed, committed);
    }

    #[test]
    fn seek_to_zero_is_the_empty_prestate() {
        let (mut timeline, _) = open_timeline(lifecycle_log(), 1000);
        timeline.seek(Tick(7), || false).unwrap();
        timeline.seek(Tick(0), || false).unwrap();
        assert_eq!(timeline.current_tick(), Tick(0));
        assert!(timeline.snapshot().is_empty());

        // And the timeline still replays forward correctly afterwards.
        timeline.seek(Tick(3), || false).unwrap();
        assert_eq!(timeline.snapshot().len(), 3);
        assert_eq!(hp(&timeline, 0, "hp"), Some(PropValue::Int(90)));
    }

    #[test]
    fn target_between_commits_keeps_last_committed_state() {
        let mut builder = LogBuilder::new();
        builder.push_tick(
            1,
            &[created(0, "probe", props(&[("hp", PropValue::Int(40))]))],
        );
        builder.push_tick(9, &[updated_int(0, "hp", 13)]);
        let (mut timeline, stats) = open_timeline(builder.finish(), 1000);

        timeline.seek(Tick(5), || false).unwrap();
        assert_eq!(timeline.current_tick(), Tick(5));
        assert_eq!(timeline.snapshot().tick(), Tick(5));
        assert_eq!(hp(&timeline, 0, "hp"), Some(PropValue::Int(40)));
        assert_eq!(stats.snapshot().ticks_committed, 1);

        // The staged tick-9 batch commits once the target reaches it.
        timeline.seek(Tick(9), || false).unwrap();
        assert_eq!(hp(&timeline, 0, "hp"), Some(PropValue::Int(13)));
        assert_eq!(stats.snapshot().ticks_committed, 2);
    }

    #[test]
    fn interrupted_seek_converges_to_same_state() {
        let target = Tick(37);
        let (mut baseline, _) = open_timeline(stamped_log(50, 3), 10);
        baseline.seek(target, || false).unwrap();

        let (mut choppy, stats) = open_timeline(stamped_log(50, 3), 10);
        let mut calls = 0u64;
        let mut interrupt = move || {
            calls += 1;
            calls % 2 == 0
        };
        let mut rounds = 0;
        loop {
            match choppy.seek(target, &mut interrupt).unwrap() {
                SeekResult::Done => break,
                SeekResult::Interrupted => rounds += 1,
            }
            assert!(rounds < 10_000, "seek failed to converge");
        }

        assert!(rounds > 0, "interrupt never fired");
        assert!(stats.snapshot().seeks_interrupted > 0);
        assert_eq!(choppy.current_tick(), target);
        assert_eq!(choppy.snapshot(), baseline.snapshot());
    }

    #[test]
    fn truncated_batch_reports_batch_start_offset() {
        let mut builder = LogBuilder::new();
        builder.push_tick(1, &[created(0, "probe", PropList::new())]);
        let batch_start = builder.position();
        builder.push_record(&updated_int(0, "hp", 1));
        let (mut timeline, _) = open_timeline(builder.finish(), 1000);

        match timeline.seek(Tick(5), || false) {
            Err(SessionError::Decode(DecodeError::MalformedRecord { offset, detail })) => {
                assert_eq!(offset, batch_start);
                assert!(detail.contains("uncommitted"), "detail: {detail}");
            }
            other => panic!("expected truncation error, got {other:?}"),
        }
        // The frontier stays at the last commit that went through.
        assert_eq!(timeline.last_known_tick(), Tick(1));
    }

    #[test]
    fn apply_failure_freezes_frontier() {
        let mut builder = LogBuilder::new();
        builder.push_tick(1, &[created(0, "probe", PropList::new())]);
        builder.push_tick(2, &[updated_int(7, "hp", 1)]);
        let (mut timeline, _) = open_timeline(builder.finish(), 1000);

        match timeline.seek(Tick(9), || false) {
            Err(SessionError::Consistency { tick, .. }) => assert_eq!(tick, Tick(2)),
            other => panic!("expected consistency error, got {other:?}"),
        }
        assert_eq!(timeline.last_known_tick(), Tick(1));
        assert_eq!(timeline.current_tick(), Tick(1));
    }

    #[test]
    fn empty_log_pins_everything_to_zero() {
        let (mut timeline, _) = open_timeline(LogBuilder::new().finish(), 1000);
        assert_eq!(timeline.seek(Tick(100), || false).unwrap(), SeekResult::Done);
        assert_eq!(timeline.current_tick(), Tick(0));
        assert_eq!(timeline.last_known_tick(), Tick(0));
        assert!(timeline.end_known());
        assert!(timeline.snapshot().is_empty());
    }

    #[test]
    fn deep_backward_seek_replays_at_most_one_interval() {
        let (mut timeline, stats) = open_timeline(stamped_log(5000, 2), 1000);
        timeline.seek(Tick(4500), || false).unwrap();

        let before = stats.snapshot();
        timeline.seek(Tick(10), || false).unwrap();
        let after = stats.snapshot();

        assert_eq!(timeline.current_tick(), Tick(10));
        assert_eq!(after.checkpoint_restores, before.checkpoint_restores + 1);
        assert_eq!(after.ticks_committed - before.ticks_committed, 10);
    }
}
