//! Apply-time consistency errors.

use crate::id::EntityId;
use std::fmt;

/// A change record contradicted the reconstructed state it was applied
/// to.
///
/// A well-formed log never produces these: updates and deletions only
/// reference live entities, and creations only introduce dead or unseen
/// ids. Hitting one therefore means the stream is corrupt (or the
/// decoder is wrong) and the session cannot continue past it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// An update or deletion referenced an entity that is not live.
    UnknownEntity {
        /// The id the record referenced.
        id: EntityId,
    },
    /// A creation referenced an entity that is already live.
    AlreadyLive {
        /// The id the record referenced.
        id: EntityId,
    },
}

impl fmt::Display for ApplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplyError::UnknownEntity { id } => {
                write!(f, "change record references unknown entity {id}")
            }
            ApplyError::AlreadyLive { id } => {
                write!(f, "creation record references already-live entity {id}")
            }
        }
    }
}

impl std::error::Error for ApplyError {}
