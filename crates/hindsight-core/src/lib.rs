//! Core types for the Hindsight replay inspection engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by the codec and the engine: tick and entity
//! identifiers, typed property values, change records, entities, and
//! full-state snapshots.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod entity;
pub mod error;
pub mod id;
pub mod record;
pub mod snapshot;
pub mod value;

pub use entity::Entity;
pub use error::ApplyError;
pub use id::{EntityId, Tick};
pub use record::{ChangeRecord, PropList};
pub use snapshot::Snapshot;
pub use value::PropValue;
