//! # Commands Module
//!
//! Tauri command handlers, one module per table view plus auth and config.
//!
//! Shared plumbing lives here: the login guard and the save report shape
//! every `save_*` command returns.

pub mod auth;
pub mod category;
pub mod config;
pub mod item;
pub mod sku;
pub mod transaction;

use serde::Serialize;
use stockdesk_core::SaveOutcome;

use crate::error::ApiError;
use crate::state::{CurrentUser, SessionState};

/// Result of a `save_*` command: the per-operation outcome plus the sheet
/// rows as they stand afterwards (reloaded from the database when every
/// operation committed, otherwise still carrying the failed rows' flags).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveReport<T> {
    pub outcome: SaveOutcome,
    pub rows: Vec<T>,
}

/// Fetches the logged-in user or fails with an Unauthorized error.
pub(crate) fn require_login(session: &SessionState) -> Result<CurrentUser, ApiError> {
    session
        .current()
        .ok_or_else(|| ApiError::unauthorized("Not logged in"))
}
