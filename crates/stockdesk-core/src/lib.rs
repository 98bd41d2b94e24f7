//! # stockdesk-core: Pure Business Logic for StockDesk
//!
//! This crate is the heart of StockDesk, a desktop inventory manager.
//! It contains all business logic as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       StockDesk Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Frontend (WebView)                           │   │
//! │  │    Category sheet ──► Item sheet ──► SKU sheet ──► Transactions │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ Tauri IPC                              │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    Tauri Commands                               │   │
//! │  │    load_items, update_sku, stage_transaction, save_skus, ...    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ stockdesk-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐   │   │
//! │  │   │   types   │  │ changeset │  │ validation│  │   auth    │   │   │
//! │  │   │  Item,Sku │  │SheetEditor│  │   rules   │  │  bcrypt   │   │   │
//! │  │   │  ...      │  │ RowFlags  │  │  checks   │  │ privilege │   │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 stockdesk-db (Database Layer)                   │   │
//! │  │             SQLite queries, migrations, repositories            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Category, Item, Sku, User, StockTransaction)
//! - [`changeset`] - Row-flag edit tracking and batched change sets
//! - [`validation`] - Business rule validation
//! - [`auth`] - Password hashing and user privilege
//! - [`error`] - Domain error types

// =============================================================================
// Module Declarations
// =============================================================================

pub mod auth;
pub mod changeset;
pub mod error;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use stockdesk_core::Sku` instead of
// `use stockdesk_core::types::Sku`

pub use auth::UserPrivilege;
pub use changeset::{
    is_cell_editable, ChangeBatch, EditLevel, OpStatus, RowFlags, SaveOutcome, SheetEditor,
    SheetRow,
};
pub use error::{CoreError, ValidationError};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum magnitude accepted for a single transaction quantity.
///
/// Mirrors the quantity spinbox range of the entry dialog; a typo like
/// 10000 instead of 100 is rejected before it reaches the database.
pub const MAX_TRANSACTION_QTY: i64 = 1_000;

/// Page size used when browsing transactions.
///
/// `load_more` fetches one page at a time until the configured maximum
/// fetch count (or the total record count) is reached.
pub const TRANSACTION_PAGE_SIZE: i64 = 20;

/// Fallback minimum quantity for a new SKU when the configuration does not
/// supply one.
pub const DEFAULT_MIN_QTY: i64 = 1;
