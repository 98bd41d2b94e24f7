//! # SKU Commands
//!
//! Tauri commands for the SKU sheet.
//!
//! The SKU sheet is filtered by the item selected in the item sheet, shows
//! the root-SKU quantity consistency check inline, and highlights rows at
//! or below their reorder threshold.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tauri::State;
use tracing::debug;

use crate::commands::{require_login, SaveReport};
use crate::error::ApiError;
use crate::state::{ConfigState, DbState, EditorState, SessionState};
use stockdesk_core::{
    active_label, is_cell_editable, no_expiration, validation, CoreError, EditLevel, SheetRow,
    Sku,
};

// Column edit levels. Identity columns (root, sub-name, code, expiration)
// are fixed at creation; the stock level itself is admin-only because it is
// normally driven by transactions, not typed in.
const ACTIVE_LEVEL: EditLevel = EditLevel::UserModifiable;
const ROOT_LEVEL: EditLevel = EditLevel::Creatable;
const SUB_NAME_LEVEL: EditLevel = EditLevel::Creatable;
const BIT_CODE_LEVEL: EditLevel = EditLevel::Creatable;
const QTY_LEVEL: EditLevel = EditLevel::AdminModifiable;
const MIN_QTY_LEVEL: EditLevel = EditLevel::UserModifiable;
const EXPIRATION_LEVEL: EditLevel = EditLevel::Creatable;
const DESCRIPTION_LEVEL: EditLevel = EditLevel::UserModifiable;

/// SKU row as the sheet displays it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuDto {
    pub sku_id: i64,
    pub active: bool,
    pub active_label: &'static str,
    pub root_sku: i64,
    pub sub_name: Option<String>,
    pub bit_code: Option<String>,
    pub sku_qty: i64,
    pub min_qty: i64,
    pub item_id: i64,
    pub item_name: String,
    pub expiration_date: NaiveDate,
    pub description: Option<String>,
    /// False when this is a root SKU whose recorded quantity does not equal
    /// the sum of its children's quantities.
    pub qty_consistent: bool,
    /// Stock level at or below the reorder threshold.
    pub low_stock: bool,
    pub is_new: bool,
    pub is_changed: bool,
    pub is_deleted: bool,
}

impl SkuDto {
    fn new(row: &SheetRow<Sku>, all: &[Sku], item_names: &HashMap<i64, String>) -> Self {
        let sku = &row.record;
        SkuDto {
            sku_id: sku.sku_id,
            active: sku.active,
            active_label: active_label(sku.active),
            root_sku: sku.root_sku,
            sub_name: sku.sub_name.clone(),
            bit_code: sku.bit_code.clone(),
            sku_qty: sku.sku_qty,
            min_qty: sku.min_qty,
            item_id: sku.item_id,
            item_name: item_names.get(&sku.item_id).cloned().unwrap_or_default(),
            expiration_date: sku.expiration_date,
            description: sku.description.clone(),
            qty_consistent: validation::is_sku_qty_correct(sku.sku_id, sku.sku_qty, all),
            low_stock: sku.sku_qty < sku.min_qty,
            is_new: row.flags.is_new(),
            is_changed: row.flags.is_changed(),
            is_deleted: row.flags.is_deleted(),
        }
    }
}

/// Fields for a newly created SKU row.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendSkuInput {
    pub item_id: i64,
    #[serde(default)]
    pub root_sku: i64,
    pub sub_name: Option<String>,
    pub bit_code: Option<String>,
    pub min_qty: Option<i64>,
    pub expiration_date: Option<NaiveDate>,
    pub description: Option<String>,
}

/// Staged cell edits for a SKU row.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuPatch {
    pub active: Option<bool>,
    pub root_sku: Option<i64>,
    pub sub_name: Option<String>,
    pub bit_code: Option<String>,
    pub sku_qty: Option<i64>,
    pub min_qty: Option<i64>,
    pub expiration_date: Option<NaiveDate>,
    pub description: Option<String>,
}

async fn item_names(db: &DbState) -> Result<HashMap<i64, String>, ApiError> {
    Ok(db
        .inner()
        .items()
        .fetch_all()
        .await?
        .into_iter()
        .map(|i| (i.item_id, i.item_name))
        .collect())
}

fn sheet_dtos(editors: &EditorState, names: &HashMap<i64, String>) -> Vec<SkuDto> {
    editors.with_skus(|e| {
        let all: Vec<Sku> = e.rows().iter().map(|r| r.record.clone()).collect();
        e.rows().iter().map(|r| SkuDto::new(r, &all, names)).collect()
    })
}

/// Loads the SKU sheet, filtered by the selected item when given.
#[tauri::command]
pub async fn load_skus(
    db: State<'_, DbState>,
    editors: State<'_, EditorState>,
    item_id: Option<i64>,
) -> Result<Vec<SkuDto>, ApiError> {
    debug!(?item_id, "load_skus command");

    editors.set_sku_item_filter(item_id);
    let skus = db.inner().skus().fetch_all(item_id).await?;
    editors.with_skus(|e| e.load(skus));

    let names = item_names(&db).await?;
    Ok(sheet_dtos(&editors, &names))
}

/// Appends a New SKU row to the sheet.
#[tauri::command]
pub async fn append_sku(
    db: State<'_, DbState>,
    editors: State<'_, EditorState>,
    session: State<'_, SessionState>,
    config: State<'_, ConfigState>,
    input: AppendSkuInput,
) -> Result<SkuDto, ApiError> {
    debug!(item_id = input.item_id, "append_sku command");
    require_login(&session)?;

    // The parent item must exist and be active
    let items = db.inner().items().fetch_all().await?;
    validation::validate_sku_item(input.item_id, &items)?;

    if let Some(min_qty) = input.min_qty {
        validation::validate_min_qty(min_qty).map_err(CoreError::from)?;
    }
    let min_qty = input.min_qty.unwrap_or(config.default_min_qty);

    let names = item_names(&db).await?;
    let dto = editors.with_skus(|e| {
        let all: Vec<Sku> = e.rows().iter().map(|r| r.record.clone()).collect();
        validation::validate_root_sku(input.root_sku, input.item_id, &all)
            .map_err(CoreError::from)?;

        e.append_with(|id| Sku {
            sku_id: id,
            active: true,
            root_sku: input.root_sku,
            sub_name: input.sub_name.clone(),
            bit_code: input.bit_code.clone(),
            sku_qty: 0,
            min_qty,
            item_id: input.item_id,
            expiration_date: input.expiration_date.unwrap_or_else(no_expiration),
            description: input.description.clone(),
        });
        let all: Vec<Sku> = e.rows().iter().map(|r| r.record.clone()).collect();
        let row = e.rows().last().expect("row just appended");
        Ok::<_, CoreError>(SkuDto::new(row, &all, &names))
    })?;
    Ok(dto)
}

/// Applies cell edits to a SKU row, honoring per-column edit levels.
#[tauri::command]
pub async fn update_sku(
    db: State<'_, DbState>,
    editors: State<'_, EditorState>,
    session: State<'_, SessionState>,
    sku_id: i64,
    patch: SkuPatch,
) -> Result<SkuDto, ApiError> {
    debug!(sku_id, "update_sku command");
    let user = require_login(&session)?;
    let user_level = user.privilege.edit_level();

    if let Some(qty) = patch.sku_qty {
        validation::validate_sku_qty(qty).map_err(CoreError::from)?;
    }
    if let Some(min_qty) = patch.min_qty {
        validation::validate_min_qty(min_qty).map_err(CoreError::from)?;
    }

    let names = item_names(&db).await?;
    let dto = editors.with_skus(|e| {
        let (is_new, item_id) = e
            .get(sku_id)
            .map(|r| (r.flags.is_new(), r.record.item_id))
            .ok_or(CoreError::UnknownRow(sku_id))?;

        let gate = |field: &str, level: EditLevel| -> Result<(), CoreError> {
            if is_cell_editable(level, user_level, is_new) {
                Ok(())
            } else {
                Err(CoreError::NotEditable {
                    field: field.to_string(),
                })
            }
        };
        if patch.active.is_some() {
            gate("active", ACTIVE_LEVEL)?;
        }
        if patch.root_sku.is_some() {
            gate("root_sku", ROOT_LEVEL)?;
        }
        if patch.sub_name.is_some() {
            gate("sub_name", SUB_NAME_LEVEL)?;
        }
        if patch.bit_code.is_some() {
            gate("bit_code", BIT_CODE_LEVEL)?;
        }
        if patch.sku_qty.is_some() {
            gate("sku_qty", QTY_LEVEL)?;
        }
        if patch.min_qty.is_some() {
            gate("min_qty", MIN_QTY_LEVEL)?;
        }
        if patch.expiration_date.is_some() {
            gate("expiration_date", EXPIRATION_LEVEL)?;
        }
        if patch.description.is_some() {
            gate("description", DESCRIPTION_LEVEL)?;
        }

        if let Some(root_sku) = patch.root_sku {
            let all: Vec<Sku> = e.rows().iter().map(|r| r.record.clone()).collect();
            validation::validate_root_sku(root_sku, item_id, &all)
                .map_err(CoreError::from)?;
        }

        e.edit(sku_id, |sku| {
            if let Some(active) = patch.active {
                sku.active = active;
            }
            if let Some(root_sku) = patch.root_sku {
                sku.root_sku = root_sku;
            }
            if let Some(sub_name) = &patch.sub_name {
                sku.sub_name = Some(sub_name.clone());
            }
            if let Some(bit_code) = &patch.bit_code {
                sku.bit_code = Some(bit_code.clone());
            }
            if let Some(qty) = patch.sku_qty {
                sku.sku_qty = qty;
            }
            if let Some(min_qty) = patch.min_qty {
                sku.min_qty = min_qty;
            }
            if let Some(date) = patch.expiration_date {
                sku.expiration_date = date;
            }
            if let Some(description) = &patch.description {
                sku.description = Some(description.clone());
            }
        })?;

        let all: Vec<Sku> = e.rows().iter().map(|r| r.record.clone()).collect();
        let row = e.get(sku_id).expect("row just edited");
        Ok::<_, CoreError>(SkuDto::new(row, &all, &names))
    })?;
    Ok(dto)
}

/// Toggles the delete flag on the given rows (New rows are dropped).
#[tauri::command]
pub async fn toggle_sku_deleted(
    db: State<'_, DbState>,
    editors: State<'_, EditorState>,
    session: State<'_, SessionState>,
    ids: Vec<i64>,
) -> Result<Vec<SkuDto>, ApiError> {
    debug!(?ids, "toggle_sku_deleted command");
    require_login(&session)?;

    editors.with_skus(|e| e.toggle_delete(&ids))?;
    let names = item_names(&db).await?;
    Ok(sheet_dtos(&editors, &names))
}

/// Discards every staged SKU edit.
#[tauri::command]
pub async fn discard_sku_edits(
    db: State<'_, DbState>,
    editors: State<'_, EditorState>,
) -> Result<Vec<SkuDto>, ApiError> {
    debug!("discard_sku_edits command");
    editors.with_skus(|e| e.discard());
    let names = item_names(&db).await?;
    Ok(sheet_dtos(&editors, &names))
}

/// Saves the staged SKU batch: deletes, then inserts, then updates.
#[tauri::command]
pub async fn save_skus(
    db: State<'_, DbState>,
    editors: State<'_, EditorState>,
    session: State<'_, SessionState>,
) -> Result<SaveReport<SkuDto>, ApiError> {
    debug!("save_skus command");
    require_login(&session)?;

    let batch = editors.with_skus(|e| e.batch());
    let outcome = db.inner().skus().apply_batch(&batch).await;
    editors.with_skus(|e| e.apply_outcome(&outcome));

    if outcome.fully_applied() {
        let fresh = db
            .inner()
            .skus()
            .fetch_all(editors.sku_item_filter())
            .await?;
        editors.with_skus(|e| e.load(fresh));
    }

    let names = item_names(&db).await?;
    Ok(SaveReport {
        outcome,
        rows: sheet_dtos(&editors, &names),
    })
}
