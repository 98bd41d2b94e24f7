//! # Validation Module
//!
//! Business rule validation for StockDesk.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend                                                      │
//! │  ├── Basic format checks (empty, length)                                │
//! │  └── Immediate user feedback                                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Tauri Command (Rust)                                          │
//! │  ├── Type validation (deserialization)                                  │
//! │  └── THIS MODULE: Business rule validation                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                             │
//! │  ├── NOT NULL constraints                                               │
//! │  ├── UNIQUE constraints (category_name, item_name, user_name, tr_type)  │
//! │  └── Foreign key constraints                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The reference checks (item-of-SKU, SKU-of-transaction, root SKU) run
//! against the already-loaded sheets, not the database: a staged-but-unsaved
//! item is a legal parent for a staged SKU.

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{Item, Sku, TransactionKind};
use crate::MAX_TRANSACTION_QTY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a display name (category name, item name, user name).
///
/// ## Rules
/// - Must not be empty after trimming
/// - Must be at most 100 characters
///
/// Uniqueness is the database's job; a duplicate surfaces as a typed
/// constraint error at save time.
pub fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.len() > 100 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 100,
        });
    }

    Ok(())
}

// =============================================================================
// Quantity Validators
// =============================================================================

/// Validates a SKU quantity (current stock level). Zero is a legal level.
pub fn validate_sku_qty(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::OutOfRange {
            field: "sku_qty".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Validates a SKU minimum-quantity threshold.
pub fn validate_min_qty(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::OutOfRange {
            field: "min_qty".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Validates a transaction quantity against its kind.
///
/// ## Rules
/// - Zero is always rejected
/// - Buy / AdjustmentPlus require a positive quantity
/// - Sell / AdjustmentMinus require a negative quantity when the value
///   arrives signed (the sheet convention); entry dialogs that work in
///   positive magnitudes negate before calling
/// - Magnitude is capped at [`MAX_TRANSACTION_QTY`]
pub fn validate_transaction_qty(kind: TransactionKind, qty: i64) -> ValidationResult<()> {
    if qty == 0 {
        return Err(ValidationError::ZeroQuantity);
    }

    if kind.sign() > 0 && qty < 0 {
        return Err(ValidationError::WrongSignedQuantity {
            kind: kind.name().to_string(),
            expected: "positive",
        });
    }
    if kind.sign() < 0 && qty > 0 {
        return Err(ValidationError::WrongSignedQuantity {
            kind: kind.name().to_string(),
            expected: "negative",
        });
    }

    if qty.abs() > MAX_TRANSACTION_QTY {
        return Err(ValidationError::OutOfRange {
            field: "tr_qty".to_string(),
            min: 1,
            max: MAX_TRANSACTION_QTY,
        });
    }

    Ok(())
}

// =============================================================================
// Reference Validators
// =============================================================================

/// Checks that a SKU's parent item exists and is active.
pub fn validate_sku_item(item_id: i64, items: &[Item]) -> CoreResult<()> {
    let item = items
        .iter()
        .find(|i| i.item_id == item_id)
        .ok_or(CoreError::NonExistentItemId(item_id))?;
    if !item.active {
        return Err(CoreError::InactiveItemId(item_id));
    }
    Ok(())
}

/// Checks that a transaction's SKU exists and is active.
pub fn validate_transaction_sku(sku_id: i64, skus: &[Sku]) -> CoreResult<()> {
    let sku = skus
        .iter()
        .find(|s| s.sku_id == sku_id)
        .ok_or(CoreError::NonExistentSkuId(sku_id))?;
    if !sku.active {
        return Err(CoreError::InactiveSkuId(sku_id));
    }
    Ok(())
}

/// Validates a `root_sku` reference for a SKU of `item_id`.
///
/// ## Rules
/// - 0 is always valid (the SKU is itself a root)
/// - Otherwise the target must exist, be a root itself (no chains), belong
///   to the same item, and be active
pub fn validate_root_sku(root_sku: i64, item_id: i64, skus: &[Sku]) -> ValidationResult<()> {
    if root_sku == 0 {
        return Ok(());
    }

    let invalid = |reason| ValidationError::InvalidRootSku {
        root_sku,
        item_id,
        reason,
    };

    let root = skus
        .iter()
        .find(|s| s.sku_id == root_sku)
        .ok_or_else(|| invalid("no such SKU"))?;

    if root.root_sku != 0 {
        return Err(invalid("target is not a root SKU"));
    }
    if root.item_id != item_id {
        return Err(invalid("target belongs to a different item"));
    }
    if !root.active {
        return Err(invalid("target is inactive"));
    }

    Ok(())
}

/// Root-SKU quantity correctness: a root with children must record exactly
/// the sum of its children's quantities.
///
/// A root without children is trivially correct (its quantity is its own).
pub fn is_sku_qty_correct(sku_id: i64, sku_qty: i64, skus: &[Sku]) -> bool {
    let child_sum: i64 = skus
        .iter()
        .filter(|s| s.root_sku == sku_id)
        .map(|s| s.sku_qty)
        .sum();
    let has_children = skus.iter().any(|s| s.root_sku == sku_id);

    !has_children || sku_qty == child_sum
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::no_expiration;

    fn sku(id: i64, item_id: i64, root: i64, qty: i64, active: bool) -> Sku {
        Sku {
            sku_id: id,
            active,
            root_sku: root,
            sub_name: None,
            bit_code: None,
            sku_qty: qty,
            min_qty: 1,
            item_id,
            expiration_date: no_expiration(),
            description: None,
        }
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("item_name", "Surgical gel").is_ok());
        assert!(validate_name("item_name", "").is_err());
        assert!(validate_name("item_name", "   ").is_err());
        assert!(validate_name("item_name", &"a".repeat(200)).is_err());
    }

    #[test]
    fn test_transaction_qty_rejects_zero() {
        for kind in TransactionKind::ALL {
            assert!(matches!(
                validate_transaction_qty(kind, 0),
                Err(ValidationError::ZeroQuantity)
            ));
        }
    }

    #[test]
    fn test_transaction_qty_sign_rules() {
        assert!(validate_transaction_qty(TransactionKind::Buy, 5).is_ok());
        assert!(validate_transaction_qty(TransactionKind::Buy, -5).is_err());
        assert!(validate_transaction_qty(TransactionKind::AdjustmentPlus, 1).is_ok());
        assert!(validate_transaction_qty(TransactionKind::AdjustmentPlus, -1).is_err());

        assert!(validate_transaction_qty(TransactionKind::Sell, -5).is_ok());
        assert!(validate_transaction_qty(TransactionKind::Sell, 5).is_err());
        assert!(validate_transaction_qty(TransactionKind::AdjustmentMinus, -1).is_ok());
        assert!(validate_transaction_qty(TransactionKind::AdjustmentMinus, 1).is_err());
    }

    #[test]
    fn test_transaction_qty_magnitude_cap() {
        assert!(validate_transaction_qty(TransactionKind::Buy, MAX_TRANSACTION_QTY).is_ok());
        assert!(validate_transaction_qty(TransactionKind::Buy, MAX_TRANSACTION_QTY + 1).is_err());
        assert!(
            validate_transaction_qty(TransactionKind::Sell, -(MAX_TRANSACTION_QTY + 1)).is_err()
        );
    }

    #[test]
    fn test_sku_item_reference() {
        let items = vec![
            Item {
                item_id: 1,
                active: true,
                item_name: "Gel".to_string(),
                category_id: 1,
                description: None,
            },
            Item {
                item_id: 2,
                active: false,
                item_name: "Retired".to_string(),
                category_id: 1,
                description: None,
            },
        ];

        assert!(validate_sku_item(1, &items).is_ok());
        assert!(matches!(
            validate_sku_item(2, &items),
            Err(CoreError::InactiveItemId(2))
        ));
        assert!(matches!(
            validate_sku_item(9, &items),
            Err(CoreError::NonExistentItemId(9))
        ));
    }

    #[test]
    fn test_transaction_sku_reference() {
        let skus = vec![sku(1, 1, 0, 5, true), sku(2, 1, 0, 5, false)];

        assert!(validate_transaction_sku(1, &skus).is_ok());
        assert!(matches!(
            validate_transaction_sku(2, &skus),
            Err(CoreError::InactiveSkuId(2))
        ));
        assert!(matches!(
            validate_transaction_sku(3, &skus),
            Err(CoreError::NonExistentSkuId(3))
        ));
    }

    #[test]
    fn test_validate_root_sku() {
        let skus = vec![
            sku(1, 1, 0, 10, true),  // root of item 1
            sku(2, 1, 1, 10, true),  // child of 1
            sku(3, 2, 0, 0, true),   // root of item 2
            sku(4, 1, 0, 0, false),  // inactive root
        ];

        assert!(validate_root_sku(0, 1, &skus).is_ok());
        assert!(validate_root_sku(1, 1, &skus).is_ok());

        // No chains: a child cannot be a root reference
        assert!(validate_root_sku(2, 1, &skus).is_err());
        // Same-item constraint
        assert!(validate_root_sku(3, 1, &skus).is_err());
        // Must exist, must be active
        assert!(validate_root_sku(99, 1, &skus).is_err());
        assert!(validate_root_sku(4, 1, &skus).is_err());
    }

    #[test]
    fn test_sku_qty_correctness() {
        let skus = vec![
            sku(1, 1, 0, 30, true),
            sku(2, 1, 1, 10, true),
            sku(3, 1, 1, 20, true),
            sku(4, 1, 0, 7, true), // childless root
        ];

        assert!(is_sku_qty_correct(1, 30, &skus));
        assert!(!is_sku_qty_correct(1, 25, &skus));
        // A root without children is always consistent
        assert!(is_sku_qty_correct(4, 7, &skus));
    }
}
