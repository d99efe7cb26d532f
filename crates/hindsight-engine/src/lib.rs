//! Tick-indexed replay sessions over Hindsight logs.
//!
//! Reconstructs entity state at any tick of a recorded session and
//! keeps that state live for a foreground consumer while a background
//! runner decodes, seeks, and plays the log back.
//!
//! # Architecture
//!
//! - [`ReplayController`] is the foreground facade: open a log, demand
//!   a tick, toggle playback, read the published position
//! - [`Timeline`] is the synchronous core: it owns the decoder, the
//!   [`EntityStore`], and the [`CheckpointIndex`], and moves state to
//!   a target tick by replaying forward or restoring a checkpoint
//! - A runner thread owns the timeline exclusively; control messages
//!   carry intent only, and the latest demanded tick wins
//! - [`LiveEntityView`] is the read side: an owned entity table that
//!   jumps whole committed ticks on each refresh, never showing a
//!   torn state
//!
//! Checkpoints are in-memory snapshots captured every
//! [`EngineConfig::checkpoint_interval`] ticks during the first pass
//! over the log, so a backward or deep forward seek replays at most
//! one interval of ticks after restoring the nearest one.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod checkpoint;
pub mod config;
pub mod controller;
pub mod error;
pub mod stats;
pub mod store;
pub mod timeline;
pub mod view;

mod publish;
mod runner;

pub use checkpoint::{Checkpoint, CheckpointIndex};
pub use config::{ConfigError, EngineConfig};
pub use controller::ReplayController;
pub use error::{OpenError, SessionError};
pub use publish::RunnerState;
pub use stats::{SessionStats, StatsSnapshot};
pub use store::EntityStore;
pub use timeline::{SeekResult, Timeline};
pub use view::{LiveEntityView, ViewDelta};
