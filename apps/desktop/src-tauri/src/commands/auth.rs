//! # Auth Commands
//!
//! Login, logout and password management.
//!
//! ## Login Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Login dialog                                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  invoke('login', { userName, password })                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  users.get_by_name ──► bcrypt verify ──► privilege from admin group     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SessionState::sign_in ──► sheets unlock at the user's edit level       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tauri::State;
use tracing::{debug, info};

use crate::commands::require_login;
use crate::error::ApiError;
use crate::state::{ConfigState, CurrentUser, DbState, SessionState};
use stockdesk_core::auth::{self, UserPrivilege};

/// Logs a user in.
///
/// Unknown user and wrong password produce the same error so the dialog
/// does not leak which user names exist.
#[tauri::command]
pub async fn login(
    db: State<'_, DbState>,
    session: State<'_, SessionState>,
    config: State<'_, ConfigState>,
    user_name: String,
    password: String,
) -> Result<CurrentUser, ApiError> {
    debug!(user_name = %user_name, "login command");

    let invalid = || ApiError::unauthorized("Invalid user name or password");

    let user = db
        .inner()
        .users()
        .get_by_name(&user_name)
        .await?
        .ok_or_else(invalid)?;

    if !auth::verify_password(&password, &user.user_password)? {
        return Err(invalid());
    }

    let current = CurrentUser {
        user_id: user.user_id,
        user_name: user.user_name.clone(),
        privilege: auth::privilege_for(&user.user_name, &config.admin_group),
    };

    info!(user_name = %user.user_name, privilege = ?current.privilege, "User logged in");
    session.sign_in(current.clone());
    Ok(current)
}

/// Logs the current user out.
#[tauri::command]
pub fn logout(session: State<'_, SessionState>) {
    if let Some(user) = session.current() {
        info!(user_name = %user.user_name, "User logged out");
    }
    session.sign_out();
}

/// Returns the logged-in user, if any.
#[tauri::command]
pub fn current_user(session: State<'_, SessionState>) -> Option<CurrentUser> {
    session.current()
}

/// Creates a new user. Admin only.
///
/// Whether the new user is an admin is decided by the configured admin
/// group, not by a database column; add the name there to grant privilege.
#[tauri::command]
pub async fn add_user(
    db: State<'_, DbState>,
    session: State<'_, SessionState>,
    user_name: String,
    password: String,
) -> Result<i64, ApiError> {
    let current = require_login(&session)?;
    if current.privilege != UserPrivilege::Admin {
        return Err(ApiError::unauthorized("Only admins can add users"));
    }

    stockdesk_core::validation::validate_name("user_name", &user_name)
        .map_err(stockdesk_core::CoreError::from)?;
    if password.is_empty() {
        return Err(ApiError::validation("Password must not be empty"));
    }

    let hash = auth::hash_password(&password)?;
    let id = db.inner().users().insert(user_name.trim(), &hash).await?;
    info!(user_name = %user_name, "User added");
    Ok(id)
}

/// Removes a user. Admin only; self-removal is rejected so the last admin
/// cannot lock everyone out mid-session.
#[tauri::command]
pub async fn remove_user(
    db: State<'_, DbState>,
    session: State<'_, SessionState>,
    user_name: String,
) -> Result<(), ApiError> {
    let current = require_login(&session)?;
    if current.privilege != UserPrivilege::Admin {
        return Err(ApiError::unauthorized("Only admins can remove users"));
    }
    if user_name == current.user_name {
        return Err(ApiError::validation("Cannot remove the logged-in user"));
    }

    let target = db
        .inner()
        .users()
        .get_by_name(&user_name)
        .await?
        .ok_or_else(|| ApiError::not_found("User", &user_name))?;

    db.inner().users().delete(target.user_id).await?;
    info!(user_name = %user_name, "User removed");
    Ok(())
}

/// Changes a password.
///
/// Regular users can only change their own; admins can change anyone's by
/// passing `user_name`.
#[tauri::command]
pub async fn change_password(
    db: State<'_, DbState>,
    session: State<'_, SessionState>,
    user_name: Option<String>,
    new_password: String,
) -> Result<(), ApiError> {
    let current = require_login(&session)?;

    if new_password.is_empty() {
        return Err(ApiError::validation("Password must not be empty"));
    }

    let target_name = user_name.unwrap_or_else(|| current.user_name.clone());
    if target_name != current.user_name && current.privilege != UserPrivilege::Admin {
        return Err(ApiError::unauthorized(
            "Only admins can change another user's password",
        ));
    }

    let target = db
        .inner()
        .users()
        .get_by_name(&target_name)
        .await?
        .ok_or_else(|| ApiError::not_found("User", &target_name))?;

    let hash = auth::hash_password(&new_password)?;
    db.inner()
        .users()
        .update_password(target.user_id, &hash)
        .await?;

    info!(user_name = %target_name, "Password changed");
    Ok(())
}
