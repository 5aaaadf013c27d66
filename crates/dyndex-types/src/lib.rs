//! Dyndex Types
//!
//! This crate defines the shared types used by the dyndex composite-index engine:
//! the ordered field-name tuple that identifies one materialized index, the value
//! tuple used as that index's lookup key, and the marker traits for primary keys
//! and field values.

#![deny(missing_docs)]

mod tuples;
pub use tuples::{FieldName, FieldTuple, INLINE_ARITY, ValueTuple};

use std::fmt::Debug;
use std::hash::Hash;

/// Unique, totally-ordered identifier of an item in the store.
///
/// Blanket-implemented for every type that satisfies the bounds, so `i64`, `u64`,
/// `String` and friends work out of the box.
pub trait PrimaryKey: Eq + Hash + Ord + Clone + Debug + Send + Sync + 'static {}

impl<T> PrimaryKey for T where T: Eq + Hash + Ord + Clone + Debug + Send + Sync + 'static {}

/// Scalar value extracted from an item or a query for one registered field.
pub trait FieldValue: Eq + Hash + Clone + Debug + Send + Sync + 'static {}

impl<T> FieldValue for T where T: Eq + Hash + Clone + Debug + Send + Sync + 'static {}
