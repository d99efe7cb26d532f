//! Change records: the decoded units of a replay log.

use crate::id::{EntityId, Tick};
use crate::value::PropValue;
use smallvec::SmallVec;

/// An ordered list of named property changes carried by one record.
///
/// Uses `SmallVec<[_; 4]>` because delta records typically touch only a
/// handful of properties; large creation records spill to the heap
/// transparently.
pub type PropList = SmallVec<[(String, PropValue); 4]>;

/// One decoded unit of log data.
///
/// Records are produced strictly in log order, and order is
/// semantically significant: applying them out of order or in parallel
/// produces garbage state. A [`Boundary`](ChangeRecord::Boundary)
/// record commits the records that precede it since the previous
/// boundary; records after the final boundary of a stream are
/// uncommitted and must never become visible.
///
/// # Examples
///
/// ```
/// use hindsight_core::{ChangeRecord, EntityId, PropList, Tick};
///
/// let mut props = PropList::new();
/// props.push(("hp".to_string(), 100i64.into()));
/// let rec = ChangeRecord::Created {
///     id: EntityId(7),
///     name: "courier".to_string(),
///     props,
/// };
/// assert_eq!(rec.entity_id(), Some(EntityId(7)));
/// assert_eq!(ChangeRecord::Boundary { tick: Tick(3) }.tick(), Some(Tick(3)));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum ChangeRecord {
    /// A new entity came into existence with a display name and its
    /// initial properties.
    Created {
        /// Identity of the new entity.
        id: EntityId,
        /// Display name, fixed for this lifetime of the entity.
        name: String,
        /// Initial property set, in recorded order.
        props: PropList,
    },
    /// Properties of a live entity changed. Only the changed properties
    /// are carried.
    Updated {
        /// Identity of the mutated entity.
        id: EntityId,
        /// Changed properties, in recorded order.
        props: PropList,
    },
    /// A live entity ceased to exist.
    Deleted {
        /// Identity of the removed entity.
        id: EntityId,
    },
    /// Commit marker: the records since the previous boundary belong to
    /// `tick` and are now complete and consistent.
    Boundary {
        /// The committed tick. Strictly increasing within a stream,
        /// never 0.
        tick: Tick,
    },
}

impl ChangeRecord {
    /// The entity this record touches, if any.
    pub fn entity_id(&self) -> Option<EntityId> {
        match self {
            ChangeRecord::Created { id, .. }
            | ChangeRecord::Updated { id, .. }
            | ChangeRecord::Deleted { id } => Some(*id),
            ChangeRecord::Boundary { .. } => None,
        }
    }

    /// The committed tick, for boundary records.
    pub fn tick(&self) -> Option<Tick> {
        match self {
            ChangeRecord::Boundary { tick } => Some(*tick),
            _ => None,
        }
    }

    /// True for commit markers.
    pub fn is_boundary(&self) -> bool {
        matches!(self, ChangeRecord::Boundary { .. })
    }
}
