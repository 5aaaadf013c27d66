#![allow(missing_docs)]
//! Core functionality for the dyndex composite-index engine.
//!
//! This crate answers ad hoc multi-field equality queries over a fixed in-memory
//! collection. Instead of declaring every field combination up front, it builds one
//! composite index per combination a query actually uses, on first use, and keeps it
//! for the engine's lifetime.
//!
//! ```
//! use dyndex_core::DynamicIndex;
//!
//! struct Order { id: i64, customer: i64, status: i64 }
//! #[derive(Default)]
//! struct OrderQuery { customer: Option<i64>, status: Option<i64> }
//!
//! let orders = vec![
//!     Order { id: 1, customer: 7, status: 0 },
//!     Order { id: 2, customer: 7, status: 1 },
//! ];
//! let mut index = DynamicIndex::new(orders, |o: &Order| o.id).unwrap();
//! index.setup_query("customer", |q: &OrderQuery| q.customer, |o: &Order| o.customer).unwrap();
//! index.setup_query("status", |q: &OrderQuery| q.status, |o: &Order| o.status).unwrap();
//!
//! let keys = index.get_keys(&OrderQuery { customer: Some(7), ..Default::default() }).unwrap();
//! assert_eq!(keys.as_ref(), &[1, 2]);
//! ```

/// Single materialized composite index and its builder
pub mod composite_index;
/// Engine configuration
pub mod config;
/// Query resolver and public engine surface
pub mod engine;
/// Error taxonomy
pub mod error;
/// Lazily populated composite-index cache
pub mod index_cache;
/// Immutable primary key to item snapshot
pub mod item_store;
/// Field-accessor registry
pub mod registry;
/// Engine statistics
pub mod stats;
/// Sample domain, data generators and tracing setup for tests
pub mod test_utils;

pub use config::IndexConfig;
pub use engine::DynamicIndex;
pub use error::{IndexError, IndexResult};
pub use stats::IndexStats;

pub use dyndex_types::{FieldName, FieldTuple, FieldValue, PrimaryKey, ValueTuple};
