//! # Error Types
//!
//! Domain-specific error types for tandem-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tandem-core errors (this file)                                        │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tandem-sync errors (separate crate)                                   │
//! │  └── SyncError        - Collaborator failures, classified into         │
//! │                         FailureCategory at the pass boundary           │
//! │                                                                         │
//! │  Flow: ValidationError → SyncError::Validation → caller                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised when constructing domain values (accounts, items) from
/// caller-supplied data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (e.g., path separators in an item name).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with ValidationError.
pub type CoreResult<T> = Result<T, ValidationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "account name".to_string(),
        };
        assert_eq!(err.to_string(), "account name is required");

        let err = ValidationError::TooLong {
            field: "item name".to_string(),
            max: 255,
        };
        assert_eq!(err.to_string(), "item name must be at most 255 characters");
    }
}
