//! Full-state snapshots attributable to a single tick.

use crate::entity::Entity;
use crate::id::{EntityId, Tick};
use indexmap::IndexMap;

/// The complete, self-consistent entity state at one tick.
///
/// Snapshots are independent deep copies: capturing one and then
/// continuing to mutate the live store never changes it. Equality is
/// structural: two snapshots are equal iff they carry the same tick,
/// the same entity set, and every property value matches. `IndexMap`
/// equality ignores order, so snapshots produced by different decode
/// paths compare equal when their state matches, which is exactly the
/// determinism guarantee the engine tests rely on.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    tick: Tick,
    entities: IndexMap<EntityId, Entity>,
}

impl Snapshot {
    /// Build a snapshot from its parts.
    pub fn new(tick: Tick, entities: IndexMap<EntityId, Entity>) -> Self {
        Self { tick, entities }
    }

    /// The empty pre-session state at tick 0.
    pub fn empty() -> Self {
        Self {
            tick: Tick(0),
            entities: IndexMap::new(),
        }
    }

    /// The tick this state belongs to.
    pub fn tick(&self) -> Tick {
        self.tick
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// True when no entities are live.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Look up an entity by id.
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Iterate live entities in capture order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}
