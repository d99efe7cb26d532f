//! Reconstructed entity state.

use crate::id::EntityId;
use crate::value::PropValue;
use indexmap::IndexMap;

/// One live entity: stable identity, display name, and its current
/// properties in first-set order.
///
/// `IndexMap` keeps a property's position across later updates, so the
/// property order a caller iterates matches the order the log first
/// introduced each property. That mirrors how recorders lay out their
/// tables and keeps inspection output stable while values change.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    /// Stable identity.
    pub id: EntityId,
    /// Display name from the creation record.
    pub name: String,
    /// Current properties in first-set order.
    pub properties: IndexMap<String, PropValue>,
}

impl Entity {
    /// Create an entity with no properties yet.
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            properties: IndexMap::new(),
        }
    }

    /// Set or overwrite a property. Overwrites keep the property's
    /// original position.
    pub fn set_property(&mut self, name: impl Into<String>, value: PropValue) {
        self.properties.insert(name.into(), value);
    }

    /// Look up a property by name.
    pub fn property(&self, name: &str) -> Option<&PropValue> {
        self.properties.get(name)
    }

    /// Number of properties currently set.
    pub fn property_count(&self) -> usize {
        self.properties.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn overwrite_keeps_position() {
        let mut e = Entity::new(EntityId(1), "hero");
        e.set_property("hp", PropValue::Int(100));
        e.set_property("mana", PropValue::Int(50));
        e.set_property("hp", PropValue::Int(90));

        let keys: Vec<&str> = e.properties.keys().map(String::as_str).collect();
        assert_eq!(keys, ["hp", "mana"]);
        assert_eq!(e.property("hp"), Some(&PropValue::Int(90)));
    }

    /// Write sequences over a four-key alphabet, so overwrites are
    /// frequent.
    fn arb_writes() -> impl Strategy<Value = Vec<(String, PropValue)>> {
        let value = prop_oneof![
            any::<i64>().prop_map(PropValue::Int),
            any::<bool>().prop_map(PropValue::Bool),
        ];
        prop::collection::vec(("[a-d]", value), 0..32)
    }

    proptest! {
        #[test]
        fn last_write_wins(writes in arb_writes()) {
            let mut e = Entity::new(EntityId(0), "unit");
            for (key, value) in &writes {
                e.set_property(key.clone(), value.clone());
            }
            for (key, _) in &writes {
                let last = writes.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v);
                prop_assert_eq!(e.property(key), last);
            }
        }

        #[test]
        fn iteration_order_is_first_set_order(writes in arb_writes()) {
            let mut e = Entity::new(EntityId(0), "unit");
            let mut expected: Vec<&String> = Vec::new();
            for (key, value) in &writes {
                e.set_property(key.clone(), value.clone());
                if !expected.contains(&key) {
                    expected.push(key);
                }
            }
            prop_assert_eq!(e.property_count(), expected.len());
            let keys: Vec<&String> = e.properties.keys().collect();
            prop_assert_eq!(keys, expected);
        }
    }
}
