//! # stockdesk-db: Database Layer for StockDesk
//!
//! This crate provides database access for the StockDesk inventory manager.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       StockDesk Data Flow                               │
//! │                                                                         │
//! │  Tauri Command (save_skus)                                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    stockdesk-db (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐   │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │   │   │
//! │  │   │               │    │ CategoryRepo  │    │              │   │   │
//! │  │   │ SqlitePool    │◄───│ ItemRepo      │    │ 0001_init…   │   │   │
//! │  │   │ Connection    │    │ SkuRepo       │    │              │   │   │
//! │  │   │ Management    │    │ UserRepo      │    └──────────────┘   │   │
//! │  │   └───────────────┘    │ TransactionR. │                       │   │
//! │  │                        └───────────────┘                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   ~/.local/share/stockdesk/stockdesk.db (WAL mode)              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (one per table)
//! - [`seed`] - Drop-and-recreate initialization plus reference data
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockdesk_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/stockdesk.db")).await?;
//! let categories = db.categories().fetch_all().await?;
//! let outcome = db.categories().apply_batch(&batch).await;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod seed;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::DbError;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::category::CategoryRepository;
pub use repository::item::ItemRepository;
pub use repository::sku::SkuRepository;
pub use repository::transaction::{TransactionDetail, TransactionFilter, TransactionRepository};
pub use repository::user::UserRepository;
