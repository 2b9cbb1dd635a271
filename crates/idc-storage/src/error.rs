//! Storage error types.

use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Entity not found.
    #[error("Entity not found: {entity_type} matching {criteria}")]
    NotFound {
        /// Type of entity (e.g., "Organization").
        entity_type: &'static str,
        /// Description of the lookup criteria.
        criteria: String,
    },

    /// Duplicate entity (unique constraint violation).
    #[error("Duplicate {entity_type}: {field} '{value}' already exists")]
    Duplicate {
        /// Type of entity.
        entity_type: &'static str,
        /// Field that caused the conflict.
        field: &'static str,
        /// Conflicting value.
        value: String,
    },

    /// A single-row lookup matched more than one row.
    #[error("Ambiguous lookup: {count} {entity_type} rows match {criteria}")]
    MultipleRows {
        /// Type of entity.
        entity_type: &'static str,
        /// Number of matching rows.
        count: usize,
        /// Description of the lookup criteria.
        criteria: String,
    },

    /// Invalid data.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Internal error.
    #[error("Internal storage error: {0}")]
    Internal(String),
}

impl StorageError {
    /// Creates a not found error.
    #[must_use]
    pub fn not_found(entity_type: &'static str, criteria: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            criteria: criteria.into(),
        }
    }

    /// Creates a duplicate error.
    #[must_use]
    pub fn duplicate(entity_type: &'static str, field: &'static str, value: impl Into<String>) -> Self {
        Self::Duplicate {
            entity_type,
            field,
            value: value.into(),
        }
    }

    /// Returns whether the entity was not found.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns whether a unique constraint was violated.
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
