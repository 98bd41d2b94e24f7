//! # Category Commands
//!
//! Tauri commands for the category sheet.
//!
//! The simplest of the four sheets: one editable column. The command set is
//! the template the item/SKU/transaction sheets elaborate on:
//! load → append/update/toggle-delete (staged) → save or discard.

use serde::{Deserialize, Serialize};
use tauri::State;
use tracing::debug;

use crate::commands::{require_login, SaveReport};
use crate::error::ApiError;
use crate::state::{DbState, EditorState, SessionState};
use stockdesk_core::{
    is_cell_editable, validation, Category, CoreError, EditLevel, SheetRow,
};

/// Edit level of the single editable column.
const NAME_LEVEL: EditLevel = EditLevel::AdminModifiable;

/// Category row as the sheet displays it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDto {
    pub category_id: i64,
    pub category_name: String,
    pub is_new: bool,
    pub is_changed: bool,
    pub is_deleted: bool,
}

impl From<&SheetRow<Category>> for CategoryDto {
    fn from(row: &SheetRow<Category>) -> Self {
        CategoryDto {
            category_id: row.record.category_id,
            category_name: row.record.category_name.clone(),
            is_new: row.flags.is_new(),
            is_changed: row.flags.is_changed(),
            is_deleted: row.flags.is_deleted(),
        }
    }
}

/// Staged cell edits for a category row.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPatch {
    pub category_name: Option<String>,
}

fn sheet_dtos(editors: &EditorState) -> Vec<CategoryDto> {
    editors.with_categories(|e| e.rows().iter().map(CategoryDto::from).collect())
}

/// Loads the category sheet from the database, discarding staged edits.
#[tauri::command]
pub async fn load_categories(
    db: State<'_, DbState>,
    editors: State<'_, EditorState>,
) -> Result<Vec<CategoryDto>, ApiError> {
    debug!("load_categories command");

    let categories = db.inner().categories().fetch_all().await?;
    editors.with_categories(|e| e.load(categories));
    Ok(sheet_dtos(&editors))
}

/// Appends a New category row to the sheet.
#[tauri::command]
pub fn append_category(
    editors: State<'_, EditorState>,
    session: State<'_, SessionState>,
    category_name: String,
) -> Result<CategoryDto, ApiError> {
    debug!(category_name = %category_name, "append_category command");
    require_login(&session)?;

    validation::validate_name("category_name", &category_name).map_err(CoreError::from)?;

    let dto = editors.with_categories(|e| {
        CategoryDto::from(e.append_with(|id| Category {
            category_id: id,
            category_name: category_name.trim().to_string(),
        }))
    });
    Ok(dto)
}

/// Applies cell edits to a category row.
#[tauri::command]
pub fn update_category(
    editors: State<'_, EditorState>,
    session: State<'_, SessionState>,
    category_id: i64,
    patch: CategoryPatch,
) -> Result<CategoryDto, ApiError> {
    debug!(category_id, "update_category command");
    let user = require_login(&session)?;

    let Some(category_name) = patch.category_name else {
        // Nothing to change; echo the row back
        return editors.with_categories(|e| {
            e.get(category_id)
                .map(CategoryDto::from)
                .ok_or_else(|| ApiError::not_found("Category", category_id))
        });
    };

    validation::validate_name("category_name", &category_name).map_err(CoreError::from)?;

    let dto = editors.with_categories(|e| {
        let is_new = e
            .get(category_id)
            .map(|r| r.flags.is_new())
            .ok_or(CoreError::UnknownRow(category_id))?;
        if !is_cell_editable(NAME_LEVEL, user.privilege.edit_level(), is_new) {
            return Err(CoreError::NotEditable {
                field: "category_name".to_string(),
            });
        }

        let row = e.edit(category_id, |c| {
            c.category_name = category_name.trim().to_string();
        })?;
        Ok(CategoryDto::from(row))
    })?;
    Ok(dto)
}

/// Toggles the delete flag on the given rows (New rows are dropped).
#[tauri::command]
pub fn toggle_category_deleted(
    editors: State<'_, EditorState>,
    session: State<'_, SessionState>,
    ids: Vec<i64>,
) -> Result<Vec<CategoryDto>, ApiError> {
    debug!(?ids, "toggle_category_deleted command");
    require_login(&session)?;

    editors.with_categories(|e| e.toggle_delete(&ids))?;
    Ok(sheet_dtos(&editors))
}

/// Discards every staged category edit.
#[tauri::command]
pub fn discard_category_edits(editors: State<'_, EditorState>) -> Vec<CategoryDto> {
    debug!("discard_category_edits command");
    editors.with_categories(|e| e.discard());
    sheet_dtos(&editors)
}

/// Saves the staged category batch: deletes, then inserts, then updates.
///
/// Operations that committed are cleared from the sheet; a failed operation
/// leaves its rows staged and is reported in the outcome.
#[tauri::command]
pub async fn save_categories(
    db: State<'_, DbState>,
    editors: State<'_, EditorState>,
    session: State<'_, SessionState>,
) -> Result<SaveReport<CategoryDto>, ApiError> {
    debug!("save_categories command");
    require_login(&session)?;

    let batch = editors.with_categories(|e| e.batch());
    let outcome = db.inner().categories().apply_batch(&batch).await;
    editors.with_categories(|e| e.apply_outcome(&outcome));

    if outcome.fully_applied() {
        let fresh = db.inner().categories().fetch_all().await?;
        editors.with_categories(|e| e.load(fresh));
    }

    Ok(SaveReport {
        outcome,
        rows: sheet_dtos(&editors),
    })
}
