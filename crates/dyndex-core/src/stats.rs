//! Statistics about the engine and its built indexes

use serde::{Deserialize, Serialize};

/// Point-in-time statistics for a [`DynamicIndex`](crate::DynamicIndex)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    pub item_count: usize,
    pub registered_fields: usize,
    pub cached_indexes: usize,
    pub index_builds: u64,
    pub cache_hits: u64,
    pub total_groups: usize,
    pub total_key_refs: usize,
    pub memory_usage_bytes: usize,
}

impl IndexStats {
    /// Get average groups per built index
    pub fn avg_groups_per_index(&self) -> f64 {
        if self.cached_indexes == 0 {
            0.0
        } else {
            self.total_groups as f64 / self.cached_indexes as f64
        }
    }

    /// Get average keys per group
    pub fn avg_keys_per_group(&self) -> f64 {
        if self.total_groups == 0 {
            0.0
        } else {
            self.total_key_refs as f64 / self.total_groups as f64
        }
    }

    /// Fraction of index lookups served without a build
    pub fn hit_rate(&self) -> f64 {
        let total = self.index_builds + self.cache_hits;
        if total == 0 { 0.0 } else { self.cache_hits as f64 / total as f64 }
    }
}
