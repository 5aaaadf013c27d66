//! Immutable primary key to item snapshot
//!
//! Items are kept in the order the source collection yielded them. Index builds
//! scan in that order, so keys inside every group come out in insertion order.

use crate::error::{IndexError, IndexResult};
use ahash::AHashMap;
use dyndex_types::PrimaryKey;
use tracing::debug;

/// Immutable store of items keyed by primary key
#[derive(Debug)]
pub struct ItemStore<K, T> {
    entries: Vec<(K, T)>,
    positions: AHashMap<K, usize>,
}

impl<K: PrimaryKey, T> ItemStore<K, T> {
    /// Snapshot `items`, keying each one with `primary_key_of`
    pub fn new<I, F>(items: I, primary_key_of: F) -> IndexResult<Self>
    where
        I: IntoIterator<Item = T>,
        F: Fn(&T) -> K,
    {
        let iter = items.into_iter();
        let (lower, _) = iter.size_hint();
        let mut entries = Vec::with_capacity(lower);
        let mut positions = AHashMap::with_capacity(lower);

        for item in iter {
            let key = primary_key_of(&item);
            if positions.contains_key(&key) {
                return Err(IndexError::DuplicateKey { key: format!("{key:?}") });
            }
            positions.insert(key.clone(), entries.len());
            entries.push((key, item));
        }

        debug!(item_count = entries.len(), "Built item store snapshot");

        Ok(Self { entries, positions })
    }

    /// Look up an item by primary key
    pub fn get(&self, key: &K) -> Option<&T> {
        self.positions.get(key).map(|&pos| &self.entries[pos].1)
    }

    /// Whether the store holds `key`
    pub fn contains_key(&self, key: &K) -> bool {
        self.positions.contains_key(key)
    }

    /// Iterate `(key, item)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&K, &T)> {
        self.entries.iter().map(|(key, item)| (key, item))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
