//! # Validation Module
//!
//! Input validation for values handed to the sync core by its callers.
//!
//! ## Usage
//! ```rust
//! use tandem_core::validation::{validate_account_name, validate_item_name};
//!
//! assert!(validate_account_name("alice@example.com").is_ok());
//! assert!(validate_item_name("event-42.ics").is_ok());
//! assert!(validate_item_name("../escape").is_err());
//! ```

use crate::error::{CoreResult, ValidationError};

/// Maximum length of an item (resource) name.
pub const MAX_ITEM_NAME_LEN: usize = 255;

// =============================================================================
// Account Validators
// =============================================================================

/// Validates an account name. Must not be blank.
pub fn validate_account_name(name: &str) -> CoreResult<()> {
    require_non_empty("account name", name)
}

/// Validates an account type (e.g. "org.tandem.caldav"). Must not be blank.
pub fn validate_account_type(account_type: &str) -> CoreResult<()> {
    require_non_empty("account type", account_type)
}

// =============================================================================
// Item Validators
// =============================================================================

/// Validates an item name.
///
/// ## Rules
/// - Must not be empty
/// - At most [`MAX_ITEM_NAME_LEN`] characters
/// - No path separators, no `.`/`..`
pub fn validate_item_name(name: &str) -> CoreResult<()> {
    require_non_empty("item name", name)?;

    if name.chars().count() > MAX_ITEM_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "item name".to_string(),
            max: MAX_ITEM_NAME_LEN,
        });
    }

    if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        return Err(ValidationError::InvalidFormat {
            field: "item name".to_string(),
            reason: "must be a single path segment".to_string(),
        });
    }

    Ok(())
}

fn require_non_empty(field: &str, value: &str) -> CoreResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}
