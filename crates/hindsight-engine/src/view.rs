//! Foreground entity view.
//!
//! [`LiveEntityView`] is the read side of a session: a locally owned
//! entity table the caller refreshes at its own pace. Each refresh
//! pulls the latest published snapshot; entities never change between
//! two refreshes, so render code can hold references without fear of
//! a tick landing mid-frame.

use std::sync::Arc;

use indexmap::IndexMap;
use smallvec::SmallVec;

use hindsight_core::{Entity, EntityId, Snapshot, Tick};

use crate::publish::SharedState;

/// What one [`LiveEntityView::refresh`] call changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewDelta {
    /// Entities that appeared since the previous refresh.
    pub created: SmallVec<[EntityId; 4]>,
    /// Entities whose name or properties changed.
    pub updated: SmallVec<[EntityId; 4]>,
    /// Entities that disappeared.
    pub removed: SmallVec<[EntityId; 4]>,
}

impl ViewDelta {
    /// True when the refresh observed no change at all.
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

/// A caller-owned copy of the entity state at one committed tick.
///
/// The view only moves when [`refresh`](Self::refresh) is called, and
/// then moves atomically to the latest committed tick. Between calls
/// it is plain owned data: lookups and iteration take no locks and
/// can never observe a torn tick.
#[derive(Debug)]
pub struct LiveEntityView {
    shared: Arc<SharedState>,
    seen: Arc<Snapshot>,
    tick: Tick,
    entities: IndexMap<EntityId, Entity>,
}

impl LiveEntityView {
    pub(crate) fn new(shared: Arc<SharedState>) -> Self {
        let seen = shared.latest_snapshot();
        let tick = seen.tick();
        let entities = seen.entities().map(|e| (e.id, e.clone())).collect();
        Self {
            shared,
            seen,
            tick,
            entities,
        }
    }

    /// Advance to the latest published snapshot and report what
    /// changed. Cheap when nothing was published since the last call:
    /// a pointer comparison, no entity is touched.
    pub fn refresh(&mut self) -> ViewDelta {
        let latest = self.shared.latest_snapshot();
        if Arc::ptr_eq(&latest, &self.seen) {
            return ViewDelta::default();
        }

        let mut delta = ViewDelta::default();
        self.entities.retain(|id, _| {
            if latest.entity(*id).is_none() {
                delta.removed.push(*id);
                false
            } else {
                true
            }
        });
        for entity in latest.entities() {
            match self.entities.get_mut(&entity.id) {
                Some(existing) => {
                    if existing != entity {
                        *existing = entity.clone();
                        delta.updated.push(entity.id);
                    }
                }
                None => {
                    self.entities.insert(entity.id, entity.clone());
                    delta.created.push(entity.id);
                }
            }
        }
        self.tick = latest.tick();
        self.seen = latest;
        delta
    }

    /// Tick of the state this view currently holds.
    pub fn tick(&self) -> Tick {
        self.tick
    }

    /// Number of live entities in the view.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// True when the view holds no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Look up an entity by id.
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Iterate the live entities.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hindsight_core::PropValue;
    use indexmap::IndexMap;

    fn entity(id: u32, name: &str, hp: i64) -> Entity {
        let mut e = Entity::new(EntityId(id), name);
        e.set_property("hp", PropValue::Int(hp));
        e
    }

    fn snapshot_of(tick: u64, entities: &[Entity]) -> Arc<Snapshot> {
        let map: IndexMap<EntityId, Entity> =
            entities.iter().map(|e| (e.id, e.clone())).collect();
        Arc::new(Snapshot::new(Tick(tick), map))
    }

    #[test]
    fn refresh_reports_creates_updates_removes() {
        let shared = Arc::new(SharedState::new());
        shared.publish_snapshot(
            snapshot_of(1, &[entity(0, "a", 100), entity(1, "b", 100)]),
            Tick(1),
        );
        let mut view = LiveEntityView::new(Arc::clone(&shared));
        assert_eq!(view.tick(), Tick(1));
        assert_eq!(view.len(), 2);

        // Entity 1 vanishes, entity 0 changes, entity 2 appears.
        shared.publish_snapshot(
            snapshot_of(2, &[entity(0, "a", 90), entity(2, "c", 10)]),
            Tick(2),
        );
        let delta = view.refresh();
        assert_eq!(delta.created.as_slice(), &[EntityId(2)]);
        assert_eq!(delta.updated.as_slice(), &[EntityId(0)]);
        assert_eq!(delta.removed.as_slice(), &[EntityId(1)]);

        assert_eq!(view.tick(), Tick(2));
        assert_eq!(
            view.entity(EntityId(0)).unwrap().property("hp"),
            Some(&PropValue::Int(90))
        );
        assert!(view.entity(EntityId(1)).is_none());
    }

    #[test]
    fn refresh_without_publication_is_a_no_op() {
        let shared = Arc::new(SharedState::new());
        shared.publish_snapshot(snapshot_of(1, &[entity(0, "a", 100)]), Tick(1));
        let mut view = LiveEntityView::new(Arc::clone(&shared));

        let delta = view.refresh();
        assert!(delta.is_empty());
        assert_eq!(view.tick(), Tick(1));
    }

    #[test]
    fn unchanged_entities_are_not_reported() {
        let shared = Arc::new(SharedState::new());
        shared.publish_snapshot(
            snapshot_of(1, &[entity(0, "a", 100), entity(1, "b", 50)]),
            Tick(1),
        );
        let mut view = LiveEntityView::new(Arc::clone(&shared));

        // New tick, but entity 1 carries identical state.
        shared.publish_snapshot(
            snapshot_of(2, &[entity(0, "a", 90), entity(1, "b", 50)]),
            Tick(2),
        );
        let delta = view.refresh();
        assert_eq!(delta.updated.as_slice(), &[EntityId(0)]);
        assert!(delta.created.is_empty());
        assert!(delta.removed.is_empty());
        assert_eq!(view.tick(), Tick(2));
    }

    #[test]
    fn view_is_stable_between_refreshes() {
        let shared = Arc::new(SharedState::new());
        shared.publish_snapshot(snapshot_of(1, &[entity(0, "a", 100)]), Tick(1));
        let mut view = LiveEntityView::new(Arc::clone(&shared));

        shared.publish_snapshot(snapshot_of(2, &[entity(0, "a", 7)]), Tick(2));
        // Not refreshed yet: the view still shows tick 1 throughout.
        assert_eq!(view.tick(), Tick(1));
        assert_eq!(
            view.entity(EntityId(0)).unwrap().property("hp"),
            Some(&PropValue::Int(100))
        );

        view.refresh();
        assert_eq!(
            view.entity(EntityId(0)).unwrap().property("hp"),
            Some(&PropValue::Int(7))
        );
    }
}
