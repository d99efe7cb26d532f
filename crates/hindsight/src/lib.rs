//! Hindsight: a replay inspection engine for tick-based entity session logs.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the Hindsight sub-crates. For most users, adding `hindsight` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use hindsight::prelude::*;
//! use std::io::Cursor;
//!
//! // Record two ticks to an in-memory log.
//! let header = LogHeader {
//!     recorder: "quickstart".into(),
//!     map: "arena".into(),
//!     tick_rate: 60.0,
//! };
//! let mut writer = LogWriter::new(Vec::new(), &header).unwrap();
//! let mut props = PropList::new();
//! props.push(("hp".to_string(), PropValue::Int(100)));
//! writer
//!     .write_tick(
//!         Tick(1),
//!         &[ChangeRecord::Created {
//!             id: EntityId(0),
//!             name: "scout".into(),
//!             props,
//!         }],
//!     )
//!     .unwrap();
//! writer
//!     .write_tick(
//!         Tick(2),
//!         &[ChangeRecord::Updated {
//!             id: EntityId(0),
//!             props: [("hp".to_string(), PropValue::Int(64))].into_iter().collect(),
//!         }],
//!     )
//!     .unwrap();
//! let log = writer.into_inner();
//!
//! // Open a replay session and demand tick 2. The runner thread
//! // materializes the state in the background.
//! let mut controller = ReplayController::new(EngineConfig::default()).unwrap();
//! let mut view = controller.open_source(Cursor::new(log)).unwrap();
//! controller.set_demanded_tick(2);
//! for _ in 0..1000 {
//!     if controller.current_tick() == Tick(2) && !controller.is_seeking() {
//!         break;
//!     }
//!     std::thread::sleep(std::time::Duration::from_millis(1));
//! }
//! view.refresh();
//! assert_eq!(view.tick(), Tick(2));
//! let scout = view.entity(EntityId(0)).unwrap();
//! assert_eq!(scout.property("hp"), Some(&PropValue::Int(64)));
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `hindsight-core` | IDs, property values, change records, entities, snapshots |
//! | [`codec`] | `hindsight-codec` | The binary log format: record codec, reader, and writer |
//! | [`engine`] | `hindsight-engine` | Entity store, checkpoints, timeline, and the replay controller |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core vocabulary shared by every layer (`hindsight-core`).
///
/// Contains tick and entity identifiers, typed property values, change
/// records, reconstructed entities, and the [`types::Snapshot`] handed
/// across the thread boundary.
pub use hindsight_core as types;

/// Binary session log format (`hindsight-codec`).
///
/// The offset-tracking [`codec::LogReader`] drives decoding and is
/// restartable at record boundaries; [`codec::LogWriter`] records
/// streams for recorders and test fixtures.
pub use hindsight_codec as codec;

/// Replay session engine (`hindsight-engine`).
///
/// [`engine::ReplayController`] owns the session worker thread;
/// [`engine::LiveEntityView`] is the read side. The synchronous seek
/// machinery underneath ([`engine::Timeline`], [`engine::EntityStore`],
/// [`engine::CheckpointIndex`]) is public for embedders that drive
/// replay without the thread.
pub use hindsight_engine as engine;

/// Common imports for typical Hindsight usage.
///
/// ```rust
/// use hindsight::prelude::*;
/// ```
///
/// This imports the most frequently used types: identifiers, records,
/// the log reader and writer, and the replay controller with its view.
pub mod prelude {
    // Identifiers, values, records, and state
    pub use hindsight_core::{
        ChangeRecord, Entity, EntityId, PropList, PropValue, Snapshot, Tick,
    };

    // Log encoding and decoding
    pub use hindsight_codec::{LogHeader, LogReader, LogWriter};

    // Errors
    pub use hindsight_codec::{DecodeError, EncodeError};
    pub use hindsight_core::ApplyError;
    pub use hindsight_engine::{OpenError, SessionError};

    // Session engine
    pub use hindsight_engine::{
        EngineConfig, LiveEntityView, ReplayController, RunnerState, StatsSnapshot, ViewDelta,
    };
}
