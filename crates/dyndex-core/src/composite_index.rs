//! A single materialized composite index
//!
//! Groups every item in the store by the tuple of its field values for one ordered
//! combination of field names. Only value tuples that actually occur in the data get
//! an entry.

use crate::item_store::ItemStore;
use crate::registry::FieldBinding;
use ahash::AHashMap;
use dyndex_types::{FieldTuple, FieldValue, PrimaryKey, ValueTuple};
use std::sync::Arc;

/// Lookup table from value tuple to the primary keys sharing it
#[derive(Debug)]
pub struct CompositeIndex<K, V> {
    fields: FieldTuple,
    table: AHashMap<ValueTuple<V>, Arc<[K]>>,
    key_refs: usize,
}

impl<K: PrimaryKey, V: FieldValue> CompositeIndex<K, V> {
    /// Group every item of `store` by the values `bindings` extract from it
    ///
    /// `bindings` must line up with `fields`, one binding per name.
    pub fn build<T, Q>(
        fields: FieldTuple,
        bindings: &[&FieldBinding<T, Q, V>],
        store: &ItemStore<K, T>,
        capacity_hint: usize,
    ) -> Self {
        debug_assert_eq!(fields.len(), bindings.len());

        let mut groups: AHashMap<ValueTuple<V>, Vec<K>> = AHashMap::with_capacity(capacity_hint);

        for (key, item) in store.iter() {
            let values: ValueTuple<V> =
                bindings.iter().map(|binding| binding.item_value(item)).collect();
            groups.entry(values).or_default().push(key.clone());
        }

        let key_refs = store.len();
        let table = groups.into_iter().map(|(values, keys)| (values, Arc::from(keys))).collect();

        Self { fields, table, key_refs }
    }

    /// Keys whose values equal `values`, if any item produced that tuple
    pub fn lookup(&self, values: &ValueTuple<V>) -> Option<&Arc<[K]>> {
        self.table.get(values)
    }

    pub fn fields(&self) -> &FieldTuple {
        &self.fields
    }

    /// Number of distinct value tuples
    pub fn group_count(&self) -> usize {
        self.table.len()
    }

    /// Total keys across all groups; equals the store size at build time
    pub fn key_refs(&self) -> usize {
        self.key_refs
    }

    /// Iterate `(values, keys)` groups in no particular order
    pub fn groups(&self) -> impl Iterator<Item = (&ValueTuple<V>, &[K])> {
        self.table.iter().map(|(values, keys)| (values, keys.as_ref()))
    }

    /// Estimate memory usage of the table (rough calculation)
    pub fn estimate_memory_usage(&self) -> usize {
        let mut size = std::mem::size_of::<Self>();
        size += self.fields.len() * std::mem::size_of::<dyndex_types::FieldName>();
        size += self.table.len()
            * (std::mem::size_of::<ValueTuple<V>>() + std::mem::size_of::<Arc<[K]>>());
        size += self.key_refs * std::mem::size_of::<K>();
        size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FieldRegistry;

    struct Row {
        id: i64,
        colour: i64,
        size: i64,
    }

    struct RowQuery {
        colour: Option<i64>,
        size: Option<i64>,
    }

    fn rows() -> ItemStore<i64, Row> {
        let rows = vec![
            Row { id: 5, colour: 1, size: 10 },
            Row { id: 3, colour: 2, size: 10 },
            Row { id: 9, colour: 1, size: 20 },
            Row { id: 1, colour: 1, size: 10 },
        ];
        ItemStore::new(rows, |r| r.id).unwrap()
    }

    fn registry() -> FieldRegistry<Row, RowQuery, i64> {
        let mut registry = FieldRegistry::new();
        registry.register("colour", |q: &RowQuery| q.colour, |r: &Row| r.colour).unwrap();
        registry.register("size", |q: &RowQuery| q.size, |r: &Row| r.size).unwrap();
        registry
    }

    #[test]
    fn test_single_field_groups_keep_store_order() {
        let store = rows();
        let registry = registry();
        let bindings = vec![registry.get("colour").unwrap()];
        let fields: FieldTuple = ["colour"].into_iter().collect();

        let index = CompositeIndex::build(fields, &bindings, &store, 0);

        assert_eq!(index.group_count(), 2);
        let keys = index.lookup(&[1i64][..].into()).unwrap();
        assert_eq!(keys.as_ref(), &[5, 9, 1]);
        assert!(index.lookup(&[7i64][..].into()).is_none());
        assert_eq!(index.key_refs(), 4);
    }

    #[test]
    fn test_two_field_groups() {
        let store = rows();
        let registry = registry();
        let bindings = vec![registry.get("colour").unwrap(), registry.get("size").unwrap()];
        let fields: FieldTuple = ["colour", "size"].into_iter().collect();

        let index = CompositeIndex::build(fields, &bindings, &store, 0);

        assert_eq!(index.group_count(), 3);
        assert_eq!(index.lookup(&[1i64, 10][..].into()).unwrap().as_ref(), &[5, 1]);
        assert_eq!(index.lookup(&[1i64, 20][..].into()).unwrap().as_ref(), &[9]);
        assert!(index.lookup(&[2i64, 20][..].into()).is_none());

        let total: usize = index.groups().map(|(_, keys)| keys.len()).sum();
        assert_eq!(total, store.len());
        assert!(index.estimate_memory_usage() > 0);
    }
}
