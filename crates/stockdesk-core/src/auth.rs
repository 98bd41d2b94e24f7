//! # Authentication Primitives
//!
//! Password hashing and user privilege resolution.
//!
//! Hashing is bcrypt; stored hashes live in `users.user_password`. Privilege
//! is not a database column: a user is an admin when their name appears in
//! the configured admin group, everyone else is a regular user.

use serde::Serialize;

use crate::changeset::EditLevel;
use crate::error::{CoreError, CoreResult};

/// Privilege level of a logged-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserPrivilege {
    User,
    Admin,
}

impl UserPrivilege {
    /// The edit level this privilege acts at when editing sheet cells.
    pub fn edit_level(self) -> EditLevel {
        match self {
            UserPrivilege::Admin => EditLevel::AdminModifiable,
            UserPrivilege::User => EditLevel::UserModifiable,
        }
    }
}

/// Resolves a user's privilege from the configured admin group.
pub fn privilege_for(user_name: &str, admin_group: &[String]) -> UserPrivilege {
    if admin_group.iter().any(|name| name == user_name) {
        UserPrivilege::Admin
    } else {
        UserPrivilege::User
    }
}

/// Hashes a plaintext password for storage.
pub fn hash_password(password: &str) -> CoreResult<String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| CoreError::PasswordHash(e.to_string()))
}

/// Verifies a plaintext password against a stored hash.
///
/// A malformed stored hash is a hashing error, not a failed login; the two
/// must be distinguishable in the UI.
pub fn verify_password(password: &str, hash: &str) -> CoreResult<bool> {
    bcrypt::verify(password, hash).map_err(|e| CoreError::PasswordHash(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        assert!(verify_password("x", "not-a-bcrypt-hash").is_err());
    }

    #[test]
    fn test_privilege_resolution() {
        let admins = vec!["admin".to_string(), "jay".to_string()];
        assert_eq!(privilege_for("admin", &admins), UserPrivilege::Admin);
        assert_eq!(privilege_for("guest", &admins), UserPrivilege::User);
    }

    #[test]
    fn test_privilege_edit_levels() {
        assert_eq!(
            UserPrivilege::Admin.edit_level(),
            EditLevel::AdminModifiable
        );
        assert_eq!(UserPrivilege::User.edit_level(), EditLevel::UserModifiable);
    }
}
