//! # Transaction Commands
//!
//! Tauri commands for the stock transaction sheet.
//!
//! ## Entry Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Single-transaction entry                                               │
//! │                                                                         │
//! │  invoke('stage_transaction', { skuId, trType: 'Buy', qty: 3 })          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SKU must exist and be active                                           │
//! │  qty: positive magnitude, direction comes from the type                 │
//! │  before_qty: after_qty of the newest row staged for this SKU,           │
//! │              falling back to the SKU's recorded quantity                │
//! │  after_qty = before ± qty                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  New row in the sheet; the SKU sheet's quantity mirrors the result      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  save_transactions ──► batch to DB ──► SKU quantities synced from       │
//! │                        the latest transaction per SKU                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tauri::State;
use tracing::debug;

use crate::commands::{require_login, SaveReport};
use crate::error::ApiError;
use crate::state::{ConfigState, DbState, EditorState, SessionState};
use stockdesk_core::{
    is_cell_editable, validation, CoreError, EditLevel, SheetRow, StockTransaction,
    TransactionKind, ValidationError, TRANSACTION_PAGE_SIZE,
};
use stockdesk_db::TransactionFilter;

// Column edit levels: the movement itself is fixed once saved, only the
// description stays user-editable.
const TYPE_LEVEL: EditLevel = EditLevel::Creatable;
const QTY_LEVEL: EditLevel = EditLevel::Creatable;
const DESCRIPTION_LEVEL: EditLevel = EditLevel::UserModifiable;

/// A `transaction_type` reference row for the type combobox.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionTypeDto {
    pub tr_type_id: i64,
    pub tr_type: String,
}

/// Transaction row as the sheet displays it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDto {
    pub tr_id: i64,
    pub sku_id: i64,
    pub tr_type_id: i64,
    pub tr_type: String,
    pub tr_qty: i64,
    pub before_qty: i64,
    pub after_qty: i64,
    pub tr_timestamp: DateTime<Utc>,
    pub description: Option<String>,
    pub user_id: i64,
    pub user_name: String,
    pub is_new: bool,
    pub is_changed: bool,
    pub is_deleted: bool,
}

impl TransactionDto {
    fn new(row: &SheetRow<StockTransaction>, user_names: &std::collections::HashMap<i64, String>) -> Self {
        let tr = &row.record;
        TransactionDto {
            tr_id: tr.tr_id,
            sku_id: tr.sku_id,
            tr_type_id: tr.tr_type_id,
            tr_type: TransactionKind::from_type_id(tr.tr_type_id)
                .map(|k| k.name().to_string())
                .unwrap_or_default(),
            tr_qty: tr.tr_qty,
            before_qty: tr.before_qty,
            after_qty: tr.after_qty,
            tr_timestamp: tr.tr_timestamp,
            description: tr.description.clone(),
            user_id: tr.user_id,
            user_name: user_names.get(&tr.user_id).cloned().unwrap_or_default(),
            is_new: row.flags.is_new(),
            is_changed: row.flags.is_changed(),
            is_deleted: row.flags.is_deleted(),
        }
    }
}

/// One page-load of the transaction view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPageDto {
    pub rows: Vec<TransactionDto>,
    /// Matching rows in the database.
    pub total: i64,
    /// Rows fetched so far (capped by the configured maximum).
    pub loaded: i64,
    pub can_load_more: bool,
}

/// Input for staging a new transaction.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTransactionInput {
    pub sku_id: i64,
    /// Type name: Buy, Sell, AdjustmentPlus, AdjustmentMinus.
    pub tr_type: String,
    /// Positive magnitude; the type supplies the direction.
    pub qty: i64,
    pub description: Option<String>,
}

/// Staged cell edits for a transaction row.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPatch {
    pub tr_type: Option<String>,
    /// Signed quantity (sheet convention); must match the type's sign.
    pub tr_qty: Option<i64>,
    pub description: Option<String>,
}

fn sheet_dtos(editors: &EditorState) -> Vec<TransactionDto> {
    let user_names = editors.with_tr_view(|v| v.user_names.clone());
    editors.with_transactions(|e| {
        e.rows()
            .iter()
            .map(|r| TransactionDto::new(r, &user_names))
            .collect()
    })
}

/// Fetches the next page into the sheet and reports the paging state.
async fn fetch_next_page(
    db: &DbState,
    editors: &EditorState,
    config: &ConfigState,
) -> Result<TransactionPageDto, ApiError> {
    let (filter, total, loaded) = editors.with_tr_view(|v| (v.filter.clone(), v.total, v.loaded));

    // The view never fetches more than the configured cap, no matter how
    // many rows match.
    let cap = total.min(config.max_transaction_count);
    let limit = (cap - loaded).min(TRANSACTION_PAGE_SIZE);

    if limit > 0 {
        let details = db
            .inner()
            .transactions()
            .fetch_page(&filter, loaded, limit)
            .await?;
        let fetched = details.len() as i64;
        let records: Vec<StockTransaction> = details.into_iter().map(|d| d.tr).collect();
        editors.with_transactions(|e| e.extend(records));
        editors.with_tr_view(|v| v.loaded += fetched);
    }

    let loaded = editors.with_tr_view(|v| v.loaded);
    Ok(TransactionPageDto {
        rows: sheet_dtos(editors),
        total,
        loaded,
        can_load_more: loaded < cap,
    })
}

/// Lists the transaction types for the type combobox.
#[tauri::command]
pub async fn list_transaction_types(
    db: State<'_, DbState>,
) -> Result<Vec<TransactionTypeDto>, ApiError> {
    let types = db.inner().transactions().list_types().await?;
    Ok(types
        .into_iter()
        .map(|t| TransactionTypeDto {
            tr_type_id: t.tr_type_id,
            tr_type: t.tr_type,
        })
        .collect())
}

/// Loads the first page of transactions for a SKU and/or date range.
#[tauri::command]
pub async fn load_transactions(
    db: State<'_, DbState>,
    editors: State<'_, EditorState>,
    config: State<'_, ConfigState>,
    sku_id: Option<i64>,
    begin: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<TransactionPageDto, ApiError> {
    debug!(?sku_id, ?begin, ?end, "load_transactions command");

    if let (Some(begin), Some(end)) = (begin, end) {
        if begin > end {
            return Err(ApiError::validation("Start date cannot be after end date"));
        }
    }

    let filter = TransactionFilter {
        sku_id,
        begin,
        end,
        include_inactive: false,
    };
    let total = db.inner().transactions().count(&filter).await?;

    // Staged rows render with user names; fetch the lookup once per load
    let user_names = db
        .inner()
        .users()
        .fetch_all()
        .await?
        .into_iter()
        .map(|u| (u.user_id, u.user_name))
        .collect();

    editors.with_tr_view(|v| {
        v.filter = filter;
        v.total = total;
        v.loaded = 0;
        v.user_names = user_names;
    });
    editors.with_transactions(|e| e.load(Vec::new()));

    fetch_next_page(&db, &editors, &config).await
}

/// Extends the sheet with the next page, until the total record count (or
/// the configured cap) is reached.
#[tauri::command]
pub async fn load_more_transactions(
    db: State<'_, DbState>,
    editors: State<'_, EditorState>,
    config: State<'_, ConfigState>,
) -> Result<TransactionPageDto, ApiError> {
    debug!("load_more_transactions command");
    fetch_next_page(&db, &editors, &config).await
}

/// Stages a new transaction row.
///
/// `before_qty` chains off the newest row already staged for the SKU, so a
/// sequence of entries in one session stays consistent; the first entry
/// starts from the SKU's recorded quantity.
#[tauri::command]
pub async fn stage_transaction(
    db: State<'_, DbState>,
    editors: State<'_, EditorState>,
    session: State<'_, SessionState>,
    input: StageTransactionInput,
) -> Result<TransactionDto, ApiError> {
    debug!(sku_id = input.sku_id, tr_type = %input.tr_type, qty = input.qty, "stage_transaction command");
    let user = require_login(&session)?;

    let kind = TransactionKind::from_name(&input.tr_type)?;
    if input.qty == 0 {
        return Err(CoreError::from(ValidationError::ZeroQuantity).into());
    }
    if input.qty < 0 {
        return Err(CoreError::from(ValidationError::MustBePositive {
            field: "qty".to_string(),
        })
        .into());
    }

    let sku = db
        .inner()
        .skus()
        .get_by_id(input.sku_id)
        .await?
        .ok_or(CoreError::NonExistentSkuId(input.sku_id))?;
    if !sku.active {
        return Err(CoreError::InactiveSkuId(input.sku_id).into());
    }

    // Selling below zero is a wrong entry, not a legal adjustment
    let staged_after = editors.with_transactions(|e| {
        e.rows()
            .iter()
            .filter(|r| r.record.sku_id == input.sku_id && !r.flags.is_deleted())
            .max_by_key(|r| r.record.tr_id)
            .map(|r| r.record.after_qty)
    });
    let before = staged_after.unwrap_or(sku.sku_qty);
    let after = kind.after_qty(before, input.qty);
    if after < 0 {
        return Err(ApiError::validation(format!(
            "Quantity would go negative: {} on hand, {} requested",
            before, input.qty
        )));
    }

    let signed_qty = kind.sign() * input.qty;
    validation::validate_transaction_qty(kind, signed_qty).map_err(CoreError::from)?;

    editors.with_tr_view(|v| {
        v.user_names.insert(user.user_id, user.user_name.clone());
    });

    let user_names = editors.with_tr_view(|v| v.user_names.clone());
    let dto = editors.with_transactions(|e| {
        let row = e.append_with(|id| StockTransaction {
            tr_id: id,
            user_id: user.user_id,
            sku_id: input.sku_id,
            tr_type_id: kind.type_id(),
            tr_qty: signed_qty,
            before_qty: before,
            after_qty: after,
            tr_timestamp: Utc::now(),
            description: input.description.clone(),
        });
        TransactionDto::new(row, &user_names)
    });

    // Mirror the resulting quantity into the SKU sheet if the row is loaded
    editors.with_skus(|e| {
        if e.get(input.sku_id).is_some() {
            let _ = e.edit(input.sku_id, |s| s.sku_qty = after);
        }
    });

    Ok(dto)
}

/// Applies cell edits to a transaction row.
///
/// Type and quantity are only editable while the row is New; recorded
/// movements accept description corrections only.
#[tauri::command]
pub fn update_transaction(
    editors: State<'_, EditorState>,
    session: State<'_, SessionState>,
    tr_id: i64,
    patch: TransactionPatch,
) -> Result<TransactionDto, ApiError> {
    debug!(tr_id, "update_transaction command");
    let user = require_login(&session)?;
    let user_level = user.privilege.edit_level();

    let user_names = editors.with_tr_view(|v| v.user_names.clone());
    let (dto, sku_id) = editors.with_transactions(|e| {
        let row = e.get(tr_id).ok_or(CoreError::UnknownRow(tr_id))?;
        let is_new = row.flags.is_new();
        let (before, current_type, current_qty, current_sku) = (
            row.record.before_qty,
            row.record.tr_type_id,
            row.record.tr_qty,
            row.record.sku_id,
        );

        let gate = |field: &str, level: EditLevel| -> Result<(), CoreError> {
            if is_cell_editable(level, user_level, is_new) {
                Ok(())
            } else {
                Err(CoreError::NotEditable {
                    field: field.to_string(),
                })
            }
        };
        if patch.tr_type.is_some() {
            gate("tr_type", TYPE_LEVEL)?;
        }
        if patch.tr_qty.is_some() {
            gate("tr_qty", QTY_LEVEL)?;
        }
        if patch.description.is_some() {
            gate("description", DESCRIPTION_LEVEL)?;
        }

        // Recompute the movement when type or quantity change
        let movement = if patch.tr_type.is_some() || patch.tr_qty.is_some() {
            let kind = match &patch.tr_type {
                Some(name) => TransactionKind::from_name(name)?,
                None => TransactionKind::from_type_id(current_type)?,
            };
            let qty = patch.tr_qty.unwrap_or(current_qty);
            validation::validate_transaction_qty(kind, qty)?;
            Some((kind, qty, kind.after_qty(before, qty)))
        } else {
            None
        };

        let row = e.edit(tr_id, |tr| {
            if let Some((kind, qty, after)) = movement {
                tr.tr_type_id = kind.type_id();
                tr.tr_qty = qty;
                tr.after_qty = after;
            }
            if let Some(description) = &patch.description {
                tr.description = Some(description.clone());
            }
        })?;
        Ok::<_, CoreError>((TransactionDto::new(row, &user_names), current_sku))
    })?;

    // Keep the SKU sheet's mirrored quantity in step with the edit
    if dto.is_new {
        let after = dto.after_qty;
        editors.with_skus(|e| {
            if e.get(sku_id).is_some() {
                let _ = e.edit(sku_id, |s| s.sku_qty = after);
            }
        });
    }

    Ok(dto)
}

/// Toggles the delete flag on the given rows (New rows are dropped).
#[tauri::command]
pub fn toggle_transaction_deleted(
    editors: State<'_, EditorState>,
    session: State<'_, SessionState>,
    ids: Vec<i64>,
) -> Result<Vec<TransactionDto>, ApiError> {
    debug!(?ids, "toggle_transaction_deleted command");
    require_login(&session)?;

    editors.with_transactions(|e| e.toggle_delete(&ids))?;
    Ok(sheet_dtos(&editors))
}

/// Discards every staged transaction edit.
#[tauri::command]
pub fn discard_transaction_edits(editors: State<'_, EditorState>) -> Vec<TransactionDto> {
    debug!("discard_transaction_edits command");
    editors.with_transactions(|e| e.discard());
    sheet_dtos(&editors)
}

/// Saves the staged transaction batch, then syncs each affected SKU's
/// quantity from its latest transaction.
#[tauri::command]
pub async fn save_transactions(
    db: State<'_, DbState>,
    editors: State<'_, EditorState>,
    session: State<'_, SessionState>,
    config: State<'_, ConfigState>,
) -> Result<SaveReport<TransactionDto>, ApiError> {
    debug!("save_transactions command");
    require_login(&session)?;

    // SKUs touched by any staged operation, collected before the sheet
    // forgets its deleted rows
    let affected: std::collections::BTreeSet<i64> = editors.with_transactions(|e| {
        e.rows()
            .iter()
            .filter(|r| !r.flags.is_original())
            .map(|r| r.record.sku_id)
            .collect()
    });

    let batch = editors.with_transactions(|e| e.batch());
    let outcome = db.inner().transactions().apply_batch(&batch).await;
    editors.with_transactions(|e| e.apply_outcome(&outcome));

    if outcome.fully_applied() {
        // A SKU's recorded quantity follows its newest transaction
        for sku_id in &affected {
            if let Some(latest) = db.inner().transactions().latest_for_sku(*sku_id).await? {
                db.inner().skus().update_qty(*sku_id, latest.after_qty).await?;
            }
        }

        // Refresh the SKU sheet only when it has no staged edits of its own
        let sku_sheet_idle = editors.with_skus(|e| !e.is_editing());
        if sku_sheet_idle {
            let fresh = db
                .inner()
                .skus()
                .fetch_all(editors.sku_item_filter())
                .await?;
            editors.with_skus(|e| e.load(fresh));
        }

        // Reload the first page under the current filter
        let filter = editors.with_tr_view(|v| v.filter.clone());
        let total = db.inner().transactions().count(&filter).await?;
        editors.with_tr_view(|v| {
            v.total = total;
            v.loaded = 0;
        });
        editors.with_transactions(|e| e.load(Vec::new()));
        let page = fetch_next_page(&db, &editors, &config).await?;

        return Ok(SaveReport {
            outcome,
            rows: page.rows,
        });
    }

    Ok(SaveReport {
        outcome,
        rows: sheet_dtos(&editors),
    })
}
