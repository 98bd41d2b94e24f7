//! # Session State
//!
//! Tracks the logged-in user for the lifetime of the window.
//!
//! A single-user desktop app has exactly one session; it still lives behind
//! a mutex because Tauri commands can run concurrently.

use std::sync::Mutex;

use serde::Serialize;
use stockdesk_core::auth::UserPrivilege;

/// The logged-in user, as resolved at login time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub user_id: i64,
    pub user_name: String,
    pub privilege: UserPrivilege,
}

/// Tauri-managed session state.
#[derive(Debug, Default)]
pub struct SessionState {
    current: Mutex<Option<CurrentUser>>,
}

impl SessionState {
    pub fn new() -> Self {
        SessionState {
            current: Mutex::new(None),
        }
    }

    /// Replaces the session after a successful login.
    pub fn sign_in(&self, user: CurrentUser) {
        *self.current.lock().expect("session mutex poisoned") = Some(user);
    }

    /// Clears the session.
    pub fn sign_out(&self) {
        *self.current.lock().expect("session mutex poisoned") = None;
    }

    /// The logged-in user, if any.
    pub fn current(&self) -> Option<CurrentUser> {
        self.current.lock().expect("session mutex poisoned").clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_in_out_round_trip() {
        let session = SessionState::new();
        assert!(session.current().is_none());

        session.sign_in(CurrentUser {
            user_id: 1,
            user_name: "admin".to_string(),
            privilege: UserPrivilege::Admin,
        });
        assert_eq!(session.current().unwrap().user_name, "admin");

        session.sign_out();
        assert!(session.current().is_none());
    }
}
