//! Strongly-typed tick and entity identifiers.

use std::fmt;

/// A discrete unit of recorded session time; the addressable unit of
/// seeking.
///
/// Tick 0 is reserved for the empty pre-session state. Recorded tick
/// boundaries start at 1 and are strictly increasing, though not
/// necessarily contiguous: a log only carries boundaries for ticks on
/// which something changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tick(pub u64);

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Tick {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Stable integer identity of a recorded entity.
///
/// Identity alone keys all collections: an entity deleted at tick N and
/// recreated later reuses the same id, and the recreation is a distinct
/// lifetime of the same identity. Logs index entities densely from 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for EntityId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}
