//! The dynamic index engine
//!
//! [`DynamicIndex`] answers ad hoc equality queries over a fixed item collection. A
//! query activates every registered field whose query accessor returns `Some`; the
//! active field names, in registration order, select one composite index which is
//! built on first use and kept for the lifetime of the engine.
//!
//! A combination of values that no item carries is reported as
//! [`IndexError::MissingCombination`] rather than an empty result. Tables only hold
//! tuples that occur in the data, so "no match" and "unknown value" are the same
//! condition and callers are expected to handle the error.

use crate::composite_index::CompositeIndex;
use crate::config::IndexConfig;
use crate::error::{IndexError, IndexResult};
use crate::index_cache::IndexCache;
use crate::item_store::ItemStore;
use crate::registry::{FieldBinding, FieldRegistry};
use crate::stats::IndexStats;
use dyndex_types::{FieldTuple, FieldValue, PrimaryKey, ValueTuple};
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};

/// In-memory secondary index over an immutable item snapshot
///
/// Setup (construction and [`setup_query`](Self::setup_query)) needs `&mut self`;
/// queries only need `&self` and may run from many threads at once.
pub struct DynamicIndex<T, Q, K = i64, V = i64> {
    store: ItemStore<K, T>,
    registry: FieldRegistry<T, Q, V>,
    cache: IndexCache<K, V>,
    config: IndexConfig,
}

impl<T, Q, K: PrimaryKey, V: FieldValue> std::fmt::Debug for DynamicIndex<T, Q, K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicIndex")
            .field("item_count", &self.store.len())
            .field("fields", &self.registry)
            .field("cached_indexes", &self.cache.len())
            .field("config", &self.config)
            .finish()
    }
}

impl<T, Q, K: PrimaryKey, V: FieldValue> DynamicIndex<T, Q, K, V> {
    /// Snapshot `items` with the default configuration
    pub fn new<I, F>(items: I, primary_key_of: F) -> IndexResult<Self>
    where
        I: IntoIterator<Item = T>,
        F: Fn(&T) -> K,
    {
        Self::with_config(items, primary_key_of, IndexConfig::default())
    }

    /// Snapshot `items` with an explicit configuration
    #[instrument(skip_all, fields(max_arity = config.max_arity))]
    pub fn with_config<I, F>(items: I, primary_key_of: F, config: IndexConfig) -> IndexResult<Self>
    where
        I: IntoIterator<Item = T>,
        F: Fn(&T) -> K,
    {
        config.validate()?;

        let started = Instant::now();
        let store = ItemStore::new(items, primary_key_of)?;

        debug!(
            item_count = store.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "Created dynamic index"
        );

        Ok(Self { store, registry: FieldRegistry::new(), cache: IndexCache::new(), config })
    }

    /// Register a queryable field
    ///
    /// `query_accessor` reads the optional predicate from a query, `item_accessor`
    /// reads the value to compare against from an item.
    pub fn setup_query<QF, IF>(
        &mut self,
        name: &str,
        query_accessor: QF,
        item_accessor: IF,
    ) -> IndexResult<()>
    where
        QF: Fn(&Q) -> Option<V> + Send + Sync + 'static,
        IF: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.registry.register(name, query_accessor, item_accessor)
    }

    /// Names of the fields `query` activates, in registration order
    pub fn resolve_active_fields(&self, query: &Q) -> FieldTuple {
        self.registry
            .bindings()
            .iter()
            .filter(|binding| binding.query_value(query).is_some())
            .map(|binding| Arc::clone(binding.name()))
            .collect()
    }

    /// Primary keys of every item matching all active predicates of `query`
    ///
    /// Fails with [`IndexError::UnsupportedArity`] when `query` activates no field or
    /// more than `max_arity` fields, and with [`IndexError::MissingCombination`] when
    /// no item matches.
    #[instrument(level = "debug", skip_all)]
    pub fn get_keys(&self, query: &Q) -> IndexResult<Arc<[K]>> {
        let mut bindings = Vec::new();
        let mut values = ValueTuple::new();

        for binding in self.registry.bindings() {
            if let Some(value) = binding.query_value(query) {
                bindings.push(binding);
                values.push(value);
            }
        }

        self.check_arity(bindings.len())?;

        let fields: FieldTuple = bindings.iter().map(|b| Arc::clone(b.name())).collect();
        self.resolve_tuple(&fields, &bindings, &values)
    }

    /// Items matching all active predicates of `query`, in index order
    pub fn query(&self, query: &Q) -> IndexResult<Vec<&T>> {
        let keys = self.get_keys(query)?;

        keys.iter()
            .map(|key| {
                self.store
                    .get(key)
                    .ok_or_else(|| IndexError::ItemNotFound { key: format!("{key:?}") })
            })
            .collect()
    }

    /// Look up `values` in the index for the explicit field order `fields`
    ///
    /// Unlike [`get_keys`](Self::get_keys) the caller picks the order, so `["a", "b"]`
    /// and `["b", "a"]` use two separate cache entries.
    #[instrument(level = "debug", skip(self, values))]
    pub fn resolve(&self, fields: &[&str], values: &[V]) -> IndexResult<Arc<[K]>> {
        if fields.len() != values.len() {
            return Err(IndexError::ValueCountMismatch {
                fields: fields.len(),
                values: values.len(),
            });
        }

        let (fields, bindings) = self.bind_fields(fields)?;
        self.resolve_tuple(&fields, &bindings, &ValueTuple::from(values))
    }

    /// Build the index for `fields` ahead of the first query that needs it
    ///
    /// Returns `true` if this call performed the build.
    pub fn prebuild(&self, fields: &[&str]) -> IndexResult<bool> {
        let (fields, bindings) = self.bind_fields(fields)?;
        let (_, built) = self.index_for(&fields, &bindings);
        Ok(built)
    }

    /// Build several indexes in parallel, returning how many were new
    ///
    /// Every combination is validated before any build starts.
    #[instrument(skip_all, fields(combinations = combinations.len()))]
    pub fn prebuild_all(&self, combinations: &[&[&str]]) -> IndexResult<usize>
    where
        T: Sync,
    {
        let resolved = combinations
            .iter()
            .map(|fields| self.bind_fields(fields))
            .collect::<IndexResult<Vec<_>>>()?;

        let built = resolved
            .par_iter()
            .filter(|(fields, bindings)| self.index_for(fields, bindings).1)
            .count();

        debug!(built, cached = self.cache.len(), "Prebuilt composite indexes");
        Ok(built)
    }

    /// Whether the index for the exact field order `fields` exists
    pub fn is_built(&self, fields: &[&str]) -> bool {
        let fields: FieldTuple = fields.iter().copied().collect();
        self.cache.contains(&fields)
    }

    /// Item stored under `key`
    pub fn get(&self, key: &K) -> Option<&T> {
        self.store.get(key)
    }

    /// Iterate `(key, item)` pairs in store order
    pub fn items(&self) -> impl Iterator<Item = (&K, &T)> {
        self.store.iter()
    }

    pub fn item_count(&self) -> usize {
        self.store.len()
    }

    pub fn cached_index_count(&self) -> usize {
        self.cache.len()
    }

    pub fn registry(&self) -> &FieldRegistry<T, Q, V> {
        &self.registry
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Collect statistics across the store and every built index
    pub fn stats(&self) -> IndexStats {
        let indexes = self.cache.snapshot();

        IndexStats {
            item_count: self.store.len(),
            registered_fields: self.registry.len(),
            cached_indexes: indexes.len(),
            index_builds: self.cache.builds(),
            cache_hits: self.cache.hits(),
            total_groups: indexes.iter().map(|index| index.group_count()).sum(),
            total_key_refs: indexes.iter().map(|index| index.key_refs()).sum(),
            memory_usage_bytes: indexes.iter().map(|index| index.estimate_memory_usage()).sum(),
        }
    }

    fn check_arity(&self, count: usize) -> IndexResult<()> {
        if count == 0 || count > self.config.max_arity {
            return Err(IndexError::UnsupportedArity { count, max: self.config.max_arity });
        }
        Ok(())
    }

    fn bind_fields(
        &self,
        names: &[&str],
    ) -> IndexResult<(FieldTuple, Vec<&FieldBinding<T, Q, V>>)> {
        self.check_arity(names.len())?;

        let bindings = names
            .iter()
            .map(|name| self.registry.require(name))
            .collect::<IndexResult<Vec<_>>>()?;
        let fields = bindings.iter().map(|b| Arc::clone(b.name())).collect();

        Ok((fields, bindings))
    }

    fn resolve_tuple(
        &self,
        fields: &FieldTuple,
        bindings: &[&FieldBinding<T, Q, V>],
        values: &ValueTuple<V>,
    ) -> IndexResult<Arc<[K]>> {
        let (index, _) = self.index_for(fields, bindings);

        let Some(keys) = index.lookup(values) else {
            if self.config.verbose_logging {
                debug!(fields = %fields, values = %values, "No items for value combination");
            }
            return Err(IndexError::MissingCombination {
                fields: fields.to_string(),
                values: values.to_string(),
            });
        };

        if self.config.verbose_logging {
            debug!(fields = %fields, values = %values, matches = keys.len(), "Resolved query");
        }

        Ok(Arc::clone(keys))
    }

    fn index_for(
        &self,
        fields: &FieldTuple,
        bindings: &[&FieldBinding<T, Q, V>],
    ) -> (Arc<CompositeIndex<K, V>>, bool) {
        self.cache.get_or_build(fields, || {
            let started = Instant::now();
            let index = CompositeIndex::build(
                fields.clone(),
                bindings,
                &self.store,
                self.config.initial_group_capacity,
            );
            let elapsed = started.elapsed();

            debug!(
                fields = %fields,
                groups = index.group_count(),
                elapsed_us = elapsed.as_micros() as u64,
                "Built composite index"
            );
            if elapsed > self.config.slow_build_threshold() {
                warn!(
                    fields = %fields,
                    item_count = self.store.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Slow composite index build"
                );
            }

            index
        })
    }
}
