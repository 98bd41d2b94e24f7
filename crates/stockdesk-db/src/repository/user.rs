//! # User Repository
//!
//! Database operations for the `users` table.
//!
//! Passwords are stored as bcrypt hashes; hashing and verification live in
//! `stockdesk_core::auth`, this repository only moves the hash strings.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use stockdesk_core::User;

const USER_COLUMNS: &str = "user_id, user_name, user_password";

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Fetches all users ordered by id.
    pub async fn fetch_all(&self) -> DbResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY user_id");
        let users = sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?;
        Ok(users)
    }

    /// Gets a user by id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Gets a user by name (the login lookup).
    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE user_name = ?1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Inserts a new user with an already-hashed password.
    pub async fn insert(&self, name: &str, password_hash: &str) -> DbResult<i64> {
        debug!(name = %name, "Inserting user");

        let result = sqlx::query("INSERT INTO users (user_name, user_password) VALUES (?1, ?2)")
            .bind(name)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;

        Ok(result.last_insert_rowid())
    }

    /// Replaces a user's password hash.
    pub async fn update_password(&self, id: i64, password_hash: &str) -> DbResult<()> {
        debug!(id = id, "Updating user password");

        let result = sqlx::query("UPDATE users SET user_password = ?2 WHERE user_id = ?1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    /// Deletes a user by id.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id = id, "Deleting user");

        let result = sqlx::query("DELETE FROM users WHERE user_id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use stockdesk_core::auth;

    #[tokio::test]
    async fn test_insert_and_login_lookup() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();

        let hash = auth::hash_password("secret").unwrap();
        repo.insert("admin", &hash).await.unwrap();

        let user = repo.get_by_name("admin").await.unwrap().unwrap();
        assert!(auth::verify_password("secret", &user.user_password).unwrap());
        assert!(repo.get_by_name("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_user_name_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();

        repo.insert("admin", "h1").await.unwrap();
        let err = repo.insert("admin", "h2").await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_update_password() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();

        let id = repo.insert("admin", "old").await.unwrap();
        repo.update_password(id, "new").await.unwrap();
        assert_eq!(
            repo.get_by_id(id).await.unwrap().unwrap().user_password,
            "new"
        );
    }
}
