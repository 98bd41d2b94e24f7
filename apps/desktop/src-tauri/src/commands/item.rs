//! # Item Commands
//!
//! Tauri commands for the item sheet.
//!
//! Items reference a category; the sheet displays the category name
//! resolved from the category table, and the `active` flag rendered as Y/N.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tauri::State;
use tracing::debug;

use crate::commands::{require_login, SaveReport};
use crate::error::ApiError;
use crate::state::{DbState, EditorState, SessionState};
use stockdesk_core::{
    active_label, is_cell_editable, validation, CoreError, EditLevel, Item, SheetRow,
};

// Column edit levels. Names and the category reference are admin
// territory; day-to-day users flip activity and maintain descriptions.
const ACTIVE_LEVEL: EditLevel = EditLevel::UserModifiable;
const NAME_LEVEL: EditLevel = EditLevel::AdminModifiable;
const CATEGORY_LEVEL: EditLevel = EditLevel::AdminModifiable;
const DESCRIPTION_LEVEL: EditLevel = EditLevel::UserModifiable;

/// Item row as the sheet displays it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDto {
    pub item_id: i64,
    pub active: bool,
    /// Y/N rendering of `active` for the sheet.
    pub active_label: &'static str,
    pub item_name: String,
    pub category_id: i64,
    /// Resolved category name; empty when the category is unknown (e.g. a
    /// staged row pointing at a staged category).
    pub category_name: String,
    pub description: Option<String>,
    pub is_new: bool,
    pub is_changed: bool,
    pub is_deleted: bool,
}

impl ItemDto {
    fn new(row: &SheetRow<Item>, category_names: &HashMap<i64, String>) -> Self {
        ItemDto {
            item_id: row.record.item_id,
            active: row.record.active,
            active_label: active_label(row.record.active),
            item_name: row.record.item_name.clone(),
            category_id: row.record.category_id,
            category_name: category_names
                .get(&row.record.category_id)
                .cloned()
                .unwrap_or_default(),
            description: row.record.description.clone(),
            is_new: row.flags.is_new(),
            is_changed: row.flags.is_changed(),
            is_deleted: row.flags.is_deleted(),
        }
    }
}

/// Staged cell edits for an item row.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    pub active: Option<bool>,
    pub item_name: Option<String>,
    pub category_id: Option<i64>,
    pub description: Option<String>,
}

async fn category_names(db: &DbState) -> Result<HashMap<i64, String>, ApiError> {
    Ok(db
        .inner()
        .categories()
        .fetch_all()
        .await?
        .into_iter()
        .map(|c| (c.category_id, c.category_name))
        .collect())
}

fn sheet_dtos(editors: &EditorState, names: &HashMap<i64, String>) -> Vec<ItemDto> {
    editors.with_items(|e| e.rows().iter().map(|r| ItemDto::new(r, names)).collect())
}

/// Loads the item sheet from the database, discarding staged edits.
#[tauri::command]
pub async fn load_items(
    db: State<'_, DbState>,
    editors: State<'_, EditorState>,
) -> Result<Vec<ItemDto>, ApiError> {
    debug!("load_items command");

    let items = db.inner().items().fetch_all().await?;
    editors.with_items(|e| e.load(items));

    let names = category_names(&db).await?;
    Ok(sheet_dtos(&editors, &names))
}

/// Appends a New item row to the sheet.
///
/// The category must already exist in the database; referencing a category
/// row that is itself still staged would dangle at save time.
#[tauri::command]
pub async fn append_item(
    db: State<'_, DbState>,
    editors: State<'_, EditorState>,
    session: State<'_, SessionState>,
    item_name: String,
    category_id: i64,
    description: Option<String>,
) -> Result<ItemDto, ApiError> {
    debug!(item_name = %item_name, category_id, "append_item command");
    require_login(&session)?;

    validation::validate_name("item_name", &item_name).map_err(CoreError::from)?;

    let names = category_names(&db).await?;
    if !names.contains_key(&category_id) {
        return Err(ApiError::not_found("Category", category_id));
    }

    let dto = editors.with_items(|e| {
        let row = e.append_with(|id| Item {
            item_id: id,
            active: true,
            item_name: item_name.trim().to_string(),
            category_id,
            description: description.clone(),
        });
        ItemDto::new(row, &names)
    });
    Ok(dto)
}

/// Applies cell edits to an item row, honoring per-column edit levels.
#[tauri::command]
pub async fn update_item(
    db: State<'_, DbState>,
    editors: State<'_, EditorState>,
    session: State<'_, SessionState>,
    item_id: i64,
    patch: ItemPatch,
) -> Result<ItemDto, ApiError> {
    debug!(item_id, "update_item command");
    let user = require_login(&session)?;
    let user_level = user.privilege.edit_level();

    if let Some(name) = &patch.item_name {
        validation::validate_name("item_name", name).map_err(CoreError::from)?;
    }

    let names = category_names(&db).await?;
    if let Some(category_id) = patch.category_id {
        if !names.contains_key(&category_id) {
            return Err(ApiError::not_found("Category", category_id));
        }
    }

    let dto = editors.with_items(|e| {
        let is_new = e
            .get(item_id)
            .map(|r| r.flags.is_new())
            .ok_or(CoreError::UnknownRow(item_id))?;

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
        if patch.item_name.is_some() {
            gate("item_name", NAME_LEVEL)?;
        }
        if patch.category_id.is_some() {
            gate("category_id", CATEGORY_LEVEL)?;
        }
        if patch.description.is_some() {
            gate("description", DESCRIPTION_LEVEL)?;
        }

        let row = e.edit(item_id, |item| {
            if let Some(active) = patch.active {
                item.active = active;
            }
            if let Some(name) = &patch.item_name {
                item.item_name = name.trim().to_string();
            }
            if let Some(category_id) = patch.category_id {
                item.category_id = category_id;
            }
            if let Some(description) = &patch.description {
                item.description = Some(description.clone());
            }
        })?;
        Ok::<_, CoreError>(ItemDto::new(row, &names))
    })?;
    Ok(dto)
}

/// Toggles the delete flag on the given rows (New rows are dropped).
#[tauri::command]
pub async fn toggle_item_deleted(
    db: State<'_, DbState>,
    editors: State<'_, EditorState>,
    session: State<'_, SessionState>,
    ids: Vec<i64>,
) -> Result<Vec<ItemDto>, ApiError> {
    debug!(?ids, "toggle_item_deleted command");
    require_login(&session)?;

    editors.with_items(|e| e.toggle_delete(&ids))?;
    let names = category_names(&db).await?;
    Ok(sheet_dtos(&editors, &names))
}

/// Discards every staged item edit.
#[tauri::command]
pub async fn discard_item_edits(
    db: State<'_, DbState>,
    editors: State<'_, EditorState>,
) -> Result<Vec<ItemDto>, ApiError> {
    debug!("discard_item_edits command");
    editors.with_items(|e| e.discard());
    let names = category_names(&db).await?;
    Ok(sheet_dtos(&editors, &names))
}

/// Saves the staged item batch: deletes, then inserts, then updates.
#[tauri::command]
pub async fn save_items(
    db: State<'_, DbState>,
    editors: State<'_, EditorState>,
    session: State<'_, SessionState>,
) -> Result<SaveReport<ItemDto>, ApiError> {
    debug!("save_items command");
    require_login(&session)?;

    let batch = editors.with_items(|e| e.batch());
    let outcome = db.inner().items().apply_batch(&batch).await;
    editors.with_items(|e| e.apply_outcome(&outcome));

    if outcome.fully_applied() {
        let fresh = db.inner().items().fetch_all().await?;
        editors.with_items(|e| e.load(fresh));
    }

    let names = category_names(&db).await?;
    Ok(SaveReport {
        outcome,
        rows: sheet_dtos(&editors, &names),
    })
}
