//! Error handling for the dyndex engine
//!
//! Every failure is synchronous and scoped to the call that triggered it. A failed
//! lookup never leaves the index cache in a partial state, so a later call with
//! valid input succeeds normally.

use thiserror::Error;

/// Error type for dyndex engine operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// A field name was registered twice
    #[error("Field '{field}' is already registered")]
    DuplicateField { field: String },

    /// A field name does not denote a single top-level member
    #[error("Invalid accessor for field '{field}': {reason}")]
    InvalidAccessor { field: String, reason: String },

    /// Two items produced the same primary key at construction
    #[error("Duplicate primary key {key}")]
    DuplicateKey { key: String },

    /// A query activated zero predicates, or more than the configured maximum
    #[error("Count ({count}) of active fields not supported (expected 1..={max})")]
    UnsupportedArity { count: usize, max: usize },

    /// No item in the store produced the requested value tuple
    #[error("Could not find values {values} for fields {fields}")]
    MissingCombination { fields: String, values: String },

    /// An index-resolved key is absent from the item store
    #[error("Item with key {key} not found in the item store")]
    ItemNotFound { key: String },

    /// A field name used for an explicit lookup or prebuild is not registered
    #[error("Field '{field}' is not registered")]
    UnknownField { field: String },

    /// An explicit lookup supplied a different number of values than fields
    #[error("Expected {fields} values, got {values}")]
    ValueCountMismatch { fields: usize, values: usize },

    /// Configuration could not be parsed or failed validation
    #[error("Configuration error: {message}")]
    Configuration { message: String, setting: Option<String> },
}

impl IndexError {
    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            IndexError::DuplicateField { .. }
            | IndexError::InvalidAccessor { .. }
            | IndexError::UnknownField { .. } => "registry",
            IndexError::DuplicateKey { .. } => "item_store",
            IndexError::UnsupportedArity { .. }
            | IndexError::MissingCombination { .. }
            | IndexError::ValueCountMismatch { .. } => "query",
            IndexError::ItemNotFound { .. } => "internal",
            IndexError::Configuration { .. } => "configuration",
        }
    }

    /// Whether the caller can reasonably continue using the engine after this error
    pub fn is_recoverable(&self) -> bool {
        match self {
            IndexError::ItemNotFound { .. } => false, // Store and index disagree
            IndexError::Configuration { .. } => false,
            _ => true,
        }
    }

    /// Create a configuration error for a specific setting
    pub fn configuration(setting: &str, message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into(), setting: Some(setting.to_string()) }
    }
}

/// Result type alias for engine operations
pub type IndexResult<T> = Result<T, IndexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let err = IndexError::UnsupportedArity { count: 0, max: 3 };
        assert_eq!(err.category(), "query");
        assert!(err.is_recoverable());

        let err = IndexError::ItemNotFound { key: "42".to_string() };
        assert_eq!(err.category(), "internal");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let err = IndexError::MissingCombination {
            fields: "(counter_party_id)".to_string(),
            values: "(9)".to_string(),
        };
        assert_eq!(err.to_string(), "Could not find values (9) for fields (counter_party_id)");

        let err = IndexError::UnsupportedArity { count: 4, max: 3 };
        assert_eq!(err.to_string(), "Count (4) of active fields not supported (expected 1..=3)");

        let err = IndexError::configuration("max_arity", "must be at least 1");
        assert_eq!(err.to_string(), "Configuration error: must be at least 1");
    }
}
