//! # Config Commands
//!
//! Read-only configuration access for the frontend.

use serde::Serialize;
use tauri::State;

use crate::state::ConfigState;

/// The configuration values the frontend cares about. The database path is
/// deliberately not exposed; the frontend has no business with it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDto {
    pub admin_group: Vec<String>,
    pub max_transaction_count: i64,
    pub default_min_qty: i64,
}

/// Returns the loaded configuration.
#[tauri::command]
pub fn get_config(config: State<'_, ConfigState>) -> ConfigDto {
    ConfigDto {
        admin_group: config.admin_group.clone(),
        max_transaction_count: config.max_transaction_count,
        default_min_qty: config.default_min_qty,
    }
}
