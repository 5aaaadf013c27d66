use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

/// Number of tuple members stored inline before spilling to the heap.
pub const INLINE_ARITY: usize = 3;

/// Interned name of a registered field.
pub type FieldName = Arc<str>;

/// Ordered tuple of field names identifying one composite index.
///
/// Equality is positional: `(a, b)` and `(b, a)` are different tuples and
/// therefore different cache entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldTuple(SmallVec<[FieldName; INLINE_ARITY]>);

impl FieldTuple {
    /// Create an empty tuple
    pub fn new() -> Self {
        Self(SmallVec::new())
    }

    /// Append a field name
    pub fn push(&mut self, name: FieldName) {
        self.0.push(name);
    }

    /// Number of field names in the tuple
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the tuple has no members
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate the names in order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|name| name.as_ref())
    }

    /// Borrow the names as a slice
    pub fn as_slice(&self) -> &[FieldName] {
        &self.0
    }
}

impl FromIterator<FieldName> for FieldTuple {
    fn from_iter<I: IntoIterator<Item = FieldName>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<&'a str> for FieldTuple {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(FieldName::from).collect())
    }
}

impl fmt::Display for FieldTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, name) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}")?;
        }
        write!(f, ")")
    }
}

/// Ordered tuple of field values used as the lookup key inside a composite index.
///
/// Hashing and equality cover the whole tuple, so two tuples only match when every
/// position matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValueTuple<V>(SmallVec<[V; INLINE_ARITY]>);

impl<V> ValueTuple<V> {
    /// Create an empty tuple
    pub fn new() -> Self {
        Self(SmallVec::new())
    }

    /// Create an empty tuple with room for `capacity` values
    pub fn with_capacity(capacity: usize) -> Self {
        Self(SmallVec::with_capacity(capacity))
    }

    /// Append a value
    pub fn push(&mut self, value: V) {
        self.0.push(value);
    }

    /// Number of values in the tuple
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the tuple has no members
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the values as a slice
    pub fn as_slice(&self) -> &[V] {
        &self.0
    }
}

impl<V> Default for ValueTuple<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> FromIterator<V> for ValueTuple<V> {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<V: Clone> From<&[V]> for ValueTuple<V> {
    fn from(values: &[V]) -> Self {
        Self(values.iter().cloned().collect())
    }
}

impl<V: fmt::Debug> fmt::Display for ValueTuple<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value:?}")?;
        }
        write!(f, ")")
    }
}
