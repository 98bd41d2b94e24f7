//! # Error Types
//!
//! Domain-specific error types for stockdesk-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockdesk-core errors (this file)                                      │
//! │  ├── CoreError        - General domain errors                           │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  stockdesk-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                     │
//! │                                                                         │
//! │  Tauri API errors (in app)                                              │
//! │  └── ApiError         - What frontend sees (serialized)                 │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Frontend      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// They should be caught and translated to user-facing messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An item id that does not exist in the loaded item set.
    #[error("Item not found: {0}")]
    NonExistentItemId(i64),

    /// An item id that exists but refers to an inactive item.
    ///
    /// Inactive items stay in the database for history but cannot receive
    /// new SKUs or transactions.
    #[error("Item {0} is inactive")]
    InactiveItemId(i64),

    /// A SKU id that does not exist in the loaded SKU set.
    #[error("SKU not found: {0}")]
    NonExistentSkuId(i64),

    /// A SKU id that exists but refers to an inactive SKU.
    #[error("SKU {0} is inactive")]
    InactiveSkuId(i64),

    /// A transaction type name or id outside the known set
    /// (Buy, Sell, AdjustmentPlus, AdjustmentMinus).
    #[error("Invalid transaction type: {0}")]
    InvalidTransactionType(String),

    /// The addressed sheet row does not exist.
    #[error("Row not found in sheet: {0}")]
    UnknownRow(i64),

    /// Editing a row that is flagged deleted.
    ///
    /// The delete flag must be toggled off before the row accepts edits.
    #[error("Row {0} is marked deleted and cannot be edited")]
    DeletedRowEdit(i64),

    /// A cell whose edit level is above the user's privilege.
    #[error("Field '{field}' is not editable at the current privilege level")]
    NotEditable { field: String },

    /// Password hashing failed.
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// A transaction quantity of zero.
    #[error("transaction quantity must not be zero")]
    ZeroQuantity,

    /// A transaction quantity whose sign contradicts the transaction type.
    #[error("quantity for {kind} must be {expected}")]
    WrongSignedQuantity {
        kind: String,
        expected: &'static str,
    },

    /// A root_sku reference that is not usable: the target is missing, is
    /// not itself a root, belongs to another item, or is inactive.
    #[error("root SKU {root_sku} is not a valid root for item {item_id}: {reason}")]
    InvalidRootSku {
        root_sku: i64,
        item_id: i64,
        reason: &'static str,
    },

    /// Invalid format (e.g. an unparseable Y/N value).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InactiveSkuId(7);
        assert_eq!(err.to_string(), "SKU 7 is inactive");

        let err = CoreError::InvalidTransactionType("Refund".to_string());
        assert_eq!(err.to_string(), "Invalid transaction type: Refund");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "item_name".to_string(),
        };
        assert_eq!(err.to_string(), "item_name is required");

        let err = ValidationError::WrongSignedQuantity {
            kind: "Buy".to_string(),
            expected: "positive",
        };
        assert_eq!(err.to_string(), "quantity for Buy must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::ZeroQuantity;
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
