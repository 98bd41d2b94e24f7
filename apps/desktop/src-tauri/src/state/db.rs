//! # Database State
//!
//! Wraps the `Database` connection for use in Tauri commands.
//!
//! ## Thread Safety
//! The `Database` struct from `stockdesk-db` contains a `SqlitePool` which
//! is inherently thread-safe. Multiple commands can execute queries
//! concurrently without explicit locking.

use stockdesk_db::Database;

/// Wrapper around `Database` for Tauri state management.
///
/// The wrapper makes the intent explicit and provides a clean API for
/// accessing the database in commands.
#[derive(Debug)]
pub struct DbState {
    db: Database,
}

impl DbState {
    /// Creates a new DbState wrapping the database connection.
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// Returns a reference to the inner Database.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let categories = db_state.inner().categories().fetch_all().await?;
    /// ```
    pub fn inner(&self) -> &Database {
        &self.db
    }
}
