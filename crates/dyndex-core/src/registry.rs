//! Field-accessor registry
//!
//! Maps a logical field name to the pair of accessors that read it from a query and
//! from an item. Registration order is significant: it fixes the order of a query's
//! active-field tuple.

use crate::error::{IndexError, IndexResult};
use ahash::AHashMap;
use dyndex_types::{FieldName, FieldValue};
use std::fmt;
use tracing::debug;

/// Reads an optional predicate value from a query
pub type QueryAccessor<Q, V> = Box<dyn Fn(&Q) -> Option<V> + Send + Sync>;

/// Reads the matching value from an item
pub type ItemAccessor<T, V> = Box<dyn Fn(&T) -> V + Send + Sync>;

/// One registered field and its accessors
pub struct FieldBinding<T, Q, V> {
    name: FieldName,
    query_accessor: QueryAccessor<Q, V>,
    item_accessor: ItemAccessor<T, V>,
}

impl<T, Q, V> FieldBinding<T, Q, V> {
    pub fn name(&self) -> &FieldName {
        &self.name
    }

    /// Predicate value carried by `query`, if the field is active
    pub fn query_value(&self, query: &Q) -> Option<V> {
        (self.query_accessor)(query)
    }

    /// Value of this field on `item`
    pub fn item_value(&self, item: &T) -> V {
        (self.item_accessor)(item)
    }
}

impl<T, Q, V> fmt::Debug for FieldBinding<T, Q, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldBinding").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Append-only set of field bindings
pub struct FieldRegistry<T, Q, V> {
    bindings: Vec<FieldBinding<T, Q, V>>,
    by_name: AHashMap<FieldName, usize>,
}

impl<T, Q, V: FieldValue> FieldRegistry<T, Q, V> {
    pub fn new() -> Self {
        Self { bindings: Vec::new(), by_name: AHashMap::new() }
    }

    /// Register a field under `name`
    ///
    /// The name must be a single top-level member: an identifier made of ASCII
    /// letters, digits and `_` that does not start with a digit. Nested paths like
    /// `account.id` are rejected with [`IndexError::InvalidAccessor`].
    pub fn register<QF, IF>(
        &mut self,
        name: &str,
        query_accessor: QF,
        item_accessor: IF,
    ) -> IndexResult<()>
    where
        QF: Fn(&Q) -> Option<V> + Send + Sync + 'static,
        IF: Fn(&T) -> V + Send + Sync + 'static,
    {
        validate_field_name(name)?;

        if self.by_name.contains_key(name) {
            return Err(IndexError::DuplicateField { field: name.to_string() });
        }

        let name = FieldName::from(name);
        self.by_name.insert(FieldName::clone(&name), self.bindings.len());
        self.bindings.push(FieldBinding {
            name: FieldName::clone(&name),
            query_accessor: Box::new(query_accessor),
            item_accessor: Box::new(item_accessor),
        });

        debug!(field = %name, position = self.bindings.len() - 1, "Registered field");
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&FieldBinding<T, Q, V>> {
        self.by_name.get(name).map(|&idx| &self.bindings[idx])
    }

    /// Like [`get`](Self::get) but reports unregistered names as an error
    pub fn require(&self, name: &str) -> IndexResult<&FieldBinding<T, Q, V>> {
        self.get(name).ok_or_else(|| IndexError::UnknownField { field: name.to_string() })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Bindings in registration order
    pub fn bindings(&self) -> &[FieldBinding<T, Q, V>] {
        &self.bindings
    }

    /// Field names in registration order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|binding| binding.name.as_ref())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl<T, Q, V: FieldValue> Default for FieldRegistry<T, Q, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, Q, V> fmt::Debug for FieldRegistry<T, Q, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.bindings.iter().map(|b| &b.name)).finish()
    }
}

/// Check that `name` denotes a single top-level member
pub fn validate_field_name(name: &str) -> IndexResult<()> {
    let invalid = |reason: &str| IndexError::InvalidAccessor {
        field: name.to_string(),
        reason: reason.to_string(),
    };

    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(invalid("field name is empty"));
    };

    if name.contains('.') {
        return Err(invalid("nested member paths are not supported"));
    }
    if first.is_ascii_digit() {
        return Err(invalid("field name must not start with a digit"));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(invalid("field name must be a single identifier"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Item {
        a: i64,
        b: i64,
    }

    #[derive(Default)]
    struct Query {
        a: Option<i64>,
        b: Option<i64>,
    }

    #[test]
    fn test_registration_order_is_kept() {
        let mut registry: FieldRegistry<Item, Query, i64> = FieldRegistry::new();
        registry.register("b", |q| q.b, |i| i.b).unwrap();
        registry.register("a", |q| q.a, |i| i.a).unwrap();

        let names: Vec<&str> = registry.field_names().collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let mut registry: FieldRegistry<Item, Query, i64> = FieldRegistry::new();
        registry.register("a", |q| q.a, |i| i.a).unwrap();

        let err = registry.register("a", |q| q.b, |i| i.b).unwrap_err();
        assert_eq!(err, IndexError::DuplicateField { field: "a".to_string() });
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_accessors_are_invoked() {
        let mut registry: FieldRegistry<Item, Query, i64> = FieldRegistry::new();
        registry.register("a", |q| q.a, |i| i.a).unwrap();

        let binding = registry.require("a").unwrap();
        assert_eq!(binding.item_value(&Item { a: 7, b: 1 }), 7);
        assert_eq!(binding.query_value(&Query::default()), None);
        assert_eq!(binding.query_value(&Query { a: Some(4), b: None }), Some(4));

        assert!(matches!(registry.require("zzz"), Err(IndexError::UnknownField { .. })));
    }

    #[test]
    fn test_field_name_validation() {
        assert!(validate_field_name("counter_party_id").is_ok());
        assert!(validate_field_name("_private").is_ok());

        for bad in ["", "account.id", "1st", "security id", "get()", "a-b"] {
            let err = validate_field_name(bad).unwrap_err();
            assert!(matches!(err, IndexError::InvalidAccessor { .. }), "accepted {bad:?}");
        }
    }
}
