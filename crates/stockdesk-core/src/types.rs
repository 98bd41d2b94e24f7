//! # Domain Types
//!
//! Core domain types used throughout StockDesk.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Category ◄── Item ◄── Sku ◄── StockTransaction ──► User                │
//! │                         ▲              │                                │
//! │                         │              ▼                                │
//! │                     root_sku     TransactionKind                        │
//! │                  (same-item FK)  Buy / Sell / Adj+ / Adj-               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every entity is keyed by a serial integer id assigned by the database.
//! Rows staged in a sheet before the first save carry a provisional id
//! (max existing + 1) that the database replaces on insert.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// =============================================================================
// Record Identity
// =============================================================================

/// Uniform access to a record's primary key.
///
/// Required by [`crate::changeset::SheetEditor`], which tracks rows by id
/// and assigns provisional ids to new rows.
pub trait Record: Clone + PartialEq {
    fn id(&self) -> i64;
    fn set_id(&mut self, id: i64);
}

// =============================================================================
// Category
// =============================================================================

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    pub category_id: i64,
    pub category_name: String,
}

impl Record for Category {
    fn id(&self) -> i64 {
        self.category_id
    }

    fn set_id(&mut self, id: i64) {
        self.category_id = id;
    }
}

// =============================================================================
// Item
// =============================================================================

/// An inventory item. SKUs hang off an item; the item itself carries no
/// quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Item {
    pub item_id: i64,
    /// Soft-activity flag. Inactive items are kept for history but refuse
    /// new SKUs and transactions.
    pub active: bool,
    pub item_name: String,
    pub category_id: i64,
    pub description: Option<String>,
}

impl Record for Item {
    fn id(&self) -> i64 {
        self.item_id
    }

    fn set_id(&mut self, id: i64) {
        self.item_id = id;
    }
}

// =============================================================================
// SKU
// =============================================================================

/// A stock-keeping unit of an item, e.g. a package size or lot.
///
/// ## Root SKUs
/// `root_sku == 0` marks a root. A non-zero `root_sku` points at a root SKU
/// of the **same item** whose quantity aggregates its children; see
/// [`crate::validation::is_sku_qty_correct`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sku {
    pub sku_id: i64,
    pub active: bool,
    pub root_sku: i64,
    pub sub_name: Option<String>,
    pub bit_code: Option<String>,
    pub sku_qty: i64,
    /// Reorder threshold; quantities at or below this level are highlighted.
    pub min_qty: i64,
    pub item_id: i64,
    /// 9999-01-01 means "no expiration" (see [`no_expiration`]).
    pub expiration_date: NaiveDate,
    pub description: Option<String>,
}

impl Record for Sku {
    fn id(&self) -> i64 {
        self.sku_id
    }

    fn set_id(&mut self, id: i64) {
        self.sku_id = id;
    }
}

/// The sentinel date stored when a SKU has no expiration.
pub fn no_expiration() -> NaiveDate {
    NaiveDate::from_ymd_opt(9999, 1, 1).expect("valid sentinel date")
}

// =============================================================================
// User
// =============================================================================

/// An application user. `user_password` holds a bcrypt hash, never a
/// plaintext password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub user_id: i64,
    pub user_name: String,
    pub user_password: String,
}

impl Record for User {
    fn id(&self) -> i64 {
        self.user_id
    }

    fn set_id(&mut self, id: i64) {
        self.user_id = id;
    }
}

// =============================================================================
// Transaction Type
// =============================================================================

/// A row of the `transaction_type` reference table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TransactionType {
    pub tr_type_id: i64,
    pub tr_type: String,
}

/// The four stock movement kinds, with their fixed reference-table ids.
///
/// The sign convention: Buy and AdjustmentPlus increase stock, Sell and
/// AdjustmentMinus decrease it. `after_qty = before_qty + sign * |qty|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum TransactionKind {
    Buy,
    Sell,
    AdjustmentPlus,
    AdjustmentMinus,
}

impl TransactionKind {
    pub const ALL: [TransactionKind; 4] = [
        TransactionKind::Buy,
        TransactionKind::Sell,
        TransactionKind::AdjustmentPlus,
        TransactionKind::AdjustmentMinus,
    ];

    /// The id this kind occupies in the `transaction_type` table.
    pub fn type_id(self) -> i64 {
        match self {
            TransactionKind::Buy => 1,
            TransactionKind::Sell => 2,
            TransactionKind::AdjustmentPlus => 3,
            TransactionKind::AdjustmentMinus => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TransactionKind::Buy => "Buy",
            TransactionKind::Sell => "Sell",
            TransactionKind::AdjustmentPlus => "AdjustmentPlus",
            TransactionKind::AdjustmentMinus => "AdjustmentMinus",
        }
    }

    /// +1 for stock-increasing kinds, -1 for stock-decreasing kinds.
    pub fn sign(self) -> i64 {
        match self {
            TransactionKind::Buy | TransactionKind::AdjustmentPlus => 1,
            TransactionKind::Sell | TransactionKind::AdjustmentMinus => -1,
        }
    }

    /// Resulting quantity after applying a transaction of this kind.
    ///
    /// `qty` may arrive signed (the sheet convention) or as a positive
    /// magnitude (the entry-dialog convention); only its magnitude counts,
    /// the direction always comes from the kind.
    pub fn after_qty(self, before_qty: i64, qty: i64) -> i64 {
        before_qty + self.sign() * qty.abs()
    }

    pub fn from_type_id(id: i64) -> Result<Self, CoreError> {
        match id {
            1 => Ok(TransactionKind::Buy),
            2 => Ok(TransactionKind::Sell),
            3 => Ok(TransactionKind::AdjustmentPlus),
            4 => Ok(TransactionKind::AdjustmentMinus),
            other => Err(CoreError::InvalidTransactionType(other.to_string())),
        }
    }

    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "Buy" => Ok(TransactionKind::Buy),
            "Sell" => Ok(TransactionKind::Sell),
            "AdjustmentPlus" => Ok(TransactionKind::AdjustmentPlus),
            "AdjustmentMinus" => Ok(TransactionKind::AdjustmentMinus),
            other => Err(CoreError::InvalidTransactionType(other.to_string())),
        }
    }
}

// =============================================================================
// Stock Transaction
// =============================================================================

/// A stock movement against a SKU.
///
/// ## Quantity Invariant
/// `after_qty == kind.after_qty(before_qty, tr_qty)` for the kind referenced
/// by `tr_type_id`. Both sides of the movement are recorded so the history
/// is auditable even if the SKU row is later edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockTransaction {
    pub tr_id: i64,
    pub user_id: i64,
    pub sku_id: i64,
    pub tr_type_id: i64,
    pub tr_qty: i64,
    pub before_qty: i64,
    pub after_qty: i64,
    pub tr_timestamp: DateTime<Utc>,
    pub description: Option<String>,
}

impl StockTransaction {
    /// The movement kind, resolved from the reference id.
    pub fn kind(&self) -> Result<TransactionKind, CoreError> {
        TransactionKind::from_type_id(self.tr_type_id)
    }
}

impl Record for StockTransaction {
    fn id(&self) -> i64 {
        self.tr_id
    }

    fn set_id(&mut self, id: i64) {
        self.tr_id = id;
    }
}

// =============================================================================
// Active Flag Display Mapping
// =============================================================================

/// Y/N label for the `active` flag, the single mapping point between the
/// stored boolean and the sheet display.
pub fn active_label(active: bool) -> &'static str {
    if active {
        "Y"
    } else {
        "N"
    }
}

/// Parses a Y/N label back to the stored boolean. Case-insensitive.
pub fn parse_active_label(label: &str) -> Result<bool, crate::error::ValidationError> {
    match label.trim() {
        "Y" | "y" => Ok(true),
        "N" | "n" => Ok(false),
        other => Err(crate::error::ValidationError::InvalidFormat {
            field: "active".to_string(),
            reason: format!("expected Y or N, got '{}'", other),
        }),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_kind_ids_round_trip() {
        for kind in TransactionKind::ALL {
            assert_eq!(TransactionKind::from_type_id(kind.type_id()).unwrap(), kind);
            assert_eq!(TransactionKind::from_name(kind.name()).unwrap(), kind);
        }
        assert!(TransactionKind::from_type_id(9).is_err());
        assert!(TransactionKind::from_name("Refund").is_err());
    }

    #[test]
    fn test_after_qty_follows_sign() {
        assert_eq!(TransactionKind::Buy.after_qty(10, 3), 13);
        assert_eq!(TransactionKind::Sell.after_qty(10, 3), 7);
        assert_eq!(TransactionKind::AdjustmentPlus.after_qty(0, 5), 5);
        assert_eq!(TransactionKind::AdjustmentMinus.after_qty(5, 2), 3);
        // Magnitude only: a signed sheet value gives the same result
        assert_eq!(TransactionKind::Sell.after_qty(10, -3), 7);
    }

    #[test]
    fn test_active_label_mapping() {
        assert_eq!(active_label(true), "Y");
        assert_eq!(active_label(false), "N");
        assert!(parse_active_label("Y").unwrap());
        assert!(!parse_active_label("n").unwrap());
        assert!(parse_active_label("yes").is_err());
    }

    #[test]
    fn test_no_expiration_sentinel() {
        assert_eq!(no_expiration().to_string(), "9999-01-01");
    }
}
