//! # Editor State
//!
//! One [`SheetEditor`] per table view, each behind its own mutex.
//!
//! ## Thread Safety
//! Sheets are wrapped in `Mutex` because:
//! 1. Multiple commands may access/modify a sheet
//! 2. Only one command should modify a sheet at a time
//! 3. Tauri commands can run concurrently
//!
//! ## Sheet Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Sheet State Operations                              │
//! │                                                                         │
//! │  Frontend Action          Tauri Command            Sheet State Change   │
//! │  ───────────────          ─────────────            ─────────────────    │
//! │                                                                         │
//! │  Open table ─────────────► load_items() ─────────► editor.load(rows)    │
//! │                                                                         │
//! │  Edit a cell ────────────► update_item() ────────► editor.edit(id, …)   │
//! │                                                                         │
//! │  Add row ────────────────► append_item() ────────► editor.append_with() │
//! │                                                                         │
//! │  Toggle delete ──────────► toggle_item_deleted() ► editor.toggle_delete │
//! │                                                                         │
//! │  Cancel ─────────────────► discard_item_edits() ─► editor.discard()     │
//! │                                                                         │
//! │  Save ───────────────────► save_items() ─────────► batch → DB → reload  │
//! │                                                                         │
//! │  NOTE: All operations acquire the sheet's mutex exclusively.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Mutex;

use stockdesk_core::{Category, Item, SheetEditor, Sku, StockTransaction};
use stockdesk_db::TransactionFilter;

/// Browsing state of the transaction sheet: the active filter plus the
/// pagination bookkeeping behind `load_more`.
#[derive(Debug, Clone, Default)]
pub struct TransactionViewState {
    pub filter: TransactionFilter,
    /// Matching rows in the database (capped display happens elsewhere).
    pub total: i64,
    /// Rows fetched so far across pages.
    pub loaded: i64,
    /// User id → user name, for rendering staged rows.
    pub user_names: std::collections::HashMap<i64, String>,
}

/// Tauri-managed editor state: one sheet per table, plus the selection and
/// paging context the sheets are filtered by.
#[derive(Debug, Default)]
pub struct EditorState {
    categories: Mutex<SheetEditor<Category>>,
    items: Mutex<SheetEditor<Item>>,
    skus: Mutex<SheetEditor<Sku>>,
    transactions: Mutex<SheetEditor<StockTransaction>>,

    /// Item selected in the item sheet; the SKU sheet filters by it.
    sku_item_filter: Mutex<Option<i64>>,
    /// Transaction browsing context.
    tr_view: Mutex<TransactionViewState>,
}

impl EditorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Executes a function with exclusive access to the category sheet.
    pub fn with_categories<R>(&self, f: impl FnOnce(&mut SheetEditor<Category>) -> R) -> R {
        let mut editor = self.categories.lock().expect("category editor mutex poisoned");
        f(&mut editor)
    }

    /// Executes a function with exclusive access to the item sheet.
    pub fn with_items<R>(&self, f: impl FnOnce(&mut SheetEditor<Item>) -> R) -> R {
        let mut editor = self.items.lock().expect("item editor mutex poisoned");
        f(&mut editor)
    }

    /// Executes a function with exclusive access to the SKU sheet.
    pub fn with_skus<R>(&self, f: impl FnOnce(&mut SheetEditor<Sku>) -> R) -> R {
        let mut editor = self.skus.lock().expect("sku editor mutex poisoned");
        f(&mut editor)
    }

    /// Executes a function with exclusive access to the transaction sheet.
    pub fn with_transactions<R>(
        &self,
        f: impl FnOnce(&mut SheetEditor<StockTransaction>) -> R,
    ) -> R {
        let mut editor = self
            .transactions
            .lock()
            .expect("transaction editor mutex poisoned");
        f(&mut editor)
    }

    /// The item id the SKU sheet is filtered by.
    pub fn sku_item_filter(&self) -> Option<i64> {
        *self.sku_item_filter.lock().expect("filter mutex poisoned")
    }

    pub fn set_sku_item_filter(&self, item_id: Option<i64>) {
        *self.sku_item_filter.lock().expect("filter mutex poisoned") = item_id;
    }

    /// Executes a function with exclusive access to the transaction
    /// browsing context.
    pub fn with_tr_view<R>(&self, f: impl FnOnce(&mut TransactionViewState) -> R) -> R {
        let mut view = self.tr_view.lock().expect("transaction view mutex poisoned");
        f(&mut view)
    }
}
