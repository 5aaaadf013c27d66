//! Lazily populated cache of composite indexes
//!
//! Entries are keyed by the ordered field-name tuple and only ever go from unbuilt to
//! built. A miss builds while holding the entry's shard lock, so concurrent first
//! queries for the same tuple share a single build.

use crate::composite_index::CompositeIndex;
use dashmap::DashMap;
use dyndex_types::{FieldTuple, FieldValue, PrimaryKey};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Cache of built composite indexes, never evicted
#[derive(Debug)]
pub struct IndexCache<K, V> {
    entries: DashMap<FieldTuple, Arc<CompositeIndex<K, V>>, ahash::RandomState>,
    builds: AtomicU64,
    hits: AtomicU64,
}

impl<K: PrimaryKey, V: FieldValue> IndexCache<K, V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::with_hasher(ahash::RandomState::new()),
            builds: AtomicU64::new(0),
            hits: AtomicU64::new(0),
        }
    }

    /// Return the index for `fields`, running `build` only if none exists yet
    ///
    /// The returned flag is `true` when this call performed the build.
    pub fn get_or_build<F>(&self, fields: &FieldTuple, build: F) -> (Arc<CompositeIndex<K, V>>, bool)
    where
        F: FnOnce() -> CompositeIndex<K, V>,
    {
        if let Some(existing) = self.entries.get(fields) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return (Arc::clone(existing.value()), false);
        }

        let mut built = false;
        let entry = self.entries.entry(fields.clone()).or_insert_with(|| {
            built = true;
            Arc::new(build())
        });
        let index = Arc::clone(entry.value());
        drop(entry);

        if built {
            self.builds.fetch_add(1, Ordering::Relaxed);
        } else {
            // Another thread finished the build while we waited on the shard
            self.hits.fetch_add(1, Ordering::Relaxed);
        }

        (index, built)
    }

    pub fn get(&self, fields: &FieldTuple) -> Option<Arc<CompositeIndex<K, V>>> {
        self.entries.get(fields).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, fields: &FieldTuple) -> bool {
        self.entries.contains_key(fields)
    }

    /// Number of built indexes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of builds performed over the cache's lifetime
    pub fn builds(&self) -> u64 {
        self.builds.load(Ordering::Relaxed)
    }

    /// Number of lookups served by an already built index
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Snapshot of every built index
    pub fn snapshot(&self) -> Vec<Arc<CompositeIndex<K, V>>> {
        self.entries.iter().map(|entry| Arc::clone(entry.value())).collect()
    }
}

impl<K: PrimaryKey, V: FieldValue> Default for IndexCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
