//! Mutable entity state, reconstructed by applying change records.

use hindsight_core::record::ChangeRecord;
use hindsight_core::{ApplyError, Entity, EntityId, Snapshot, Tick};
use indexmap::IndexMap;

/// Arena of live entities keyed by id.
///
/// Recorded ids are dense small integers, so the arena addresses slots
/// by id directly. Deleting tombstones the slot (`None`); a later
/// `Created` with the same id refills it with an entirely fresh
/// entity, so no properties leak across a delete/recreate cycle.
///
/// The store holds exactly one materialized state at a time. Callers
/// that need a stable copy take a [`snapshot`](EntityStore::snapshot)
/// before mutating further.
#[derive(Debug, Default)]
pub struct EntityStore {
    slots: Vec<Option<Entity>>,
    live: usize,
}

impl EntityStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether no entities are live.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Look up a live entity.
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.slots.get(id.0 as usize).and_then(Option::as_ref)
    }

    /// Apply one change record.
    ///
    /// A record that contradicts the current state (update or delete
    /// of an entity that is not live, create of one that is) reports
    /// the contradiction instead of guessing; the caller treats it as
    /// evidence of log corruption. `Boundary` records group batches
    /// and are a no-op at store level.
    pub fn apply(&mut self, record: &ChangeRecord) -> Result<(), ApplyError> {
        match record {
            ChangeRecord::Created { id, name, props } => {
                let slot = self.slot_mut(*id);
                if slot.is_some() {
                    return Err(ApplyError::AlreadyLive { id: *id });
                }
                let mut entity = Entity::new(*id, name.clone());
                for (key, value) in props {
                    entity.set_property(key.clone(), value.clone());
                }
                *slot = Some(entity);
                self.live += 1;
                Ok(())
            }
            ChangeRecord::Updated { id, props } => {
                let entity = self
                    .slots
                    .get_mut(id.0 as usize)
                    .and_then(Option::as_mut)
                    .ok_or(ApplyError::UnknownEntity { id: *id })?;
                for (key, value) in props {
                    entity.set_property(key.clone(), value.clone());
                }
                Ok(())
            }
            ChangeRecord::Deleted { id } => {
                let slot = self
                    .slots
                    .get_mut(id.0 as usize)
                    .ok_or(ApplyError::UnknownEntity { id: *id })?;
                if slot.take().is_none() {
                    return Err(ApplyError::UnknownEntity { id: *id });
                }
                self.live -= 1;
                Ok(())
            }
            ChangeRecord::Boundary { .. } => Ok(()),
        }
    }

    /// Deep-copy the live entities into an immutable snapshot stamped
    /// with `tick`. Entities appear in id order, so two stores holding
    /// the same state produce equal snapshots.
    pub fn snapshot(&self, tick: Tick) -> Snapshot {
        let mut entities = IndexMap::with_capacity(self.live);
        for entity in self.slots.iter().flatten() {
            entities.insert(entity.id, entity.clone());
        }
        Snapshot::new(tick, entities)
    }

    /// Replace all live state with the snapshot's contents.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        self.clear();
        for entity in snapshot.entities() {
            *self.slot_mut(entity.id) = Some(entity.clone());
            self.live += 1;
        }
    }

    /// Drop every entity, tombstones included.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.live = 0;
    }

    fn slot_mut(&mut self, id: EntityId) -> &mut Option<Entity> {
        let idx = id.0 as usize;
        if idx >= self.slots.len() {
            self.slots.resize_with(idx + 1, || None);
        }
        &mut self.slots[idx]
    }
}
