//! # Category Repository
//!
//! Database operations for the `category` table.
//!
//! The smallest repository; its `apply_batch` is the reference
//! implementation of the delete → insert → update save pipeline the other
//! repositories follow.

use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use stockdesk_core::{Category, ChangeBatch, OpStatus, SaveOutcome};

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Fetches all categories ordered by id.
    pub async fn fetch_all(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT category_id, category_name FROM category ORDER BY category_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Gets a category by its id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT category_id, category_name FROM category WHERE category_id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Inserts a new category; the database assigns the id.
    ///
    /// ## Returns
    /// * `Ok(id)` - The assigned category id
    /// * `Err(DbError::UniqueViolation)` - Name already exists
    pub async fn insert(&self, name: &str) -> DbResult<i64> {
        debug!(name = %name, "Inserting category");

        let result = sqlx::query("INSERT INTO category (category_name) VALUES (?1)")
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(result.last_insert_rowid())
    }

    /// Updates an existing category.
    pub async fn update(&self, category: &Category) -> DbResult<()> {
        debug!(id = category.category_id, "Updating category");

        let result =
            sqlx::query("UPDATE category SET category_name = ?2 WHERE category_id = ?1")
                .bind(category.category_id)
                .bind(&category.category_name)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", category.category_id));
        }

        Ok(())
    }

    /// Deletes a category by id.
    ///
    /// ## Returns
    /// * `Err(DbError::ForeignKeyViolation)` - Items still reference it
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id = id, "Deleting category");

        let result = sqlx::query("DELETE FROM category WHERE category_id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        Ok(())
    }

    /// Applies a staged change batch: deletes, then inserts, then updates.
    ///
    /// Each operation runs in its own transaction; a failed operation rolls
    /// back and is reported in the outcome without aborting the others, so
    /// the sheet can keep the failed rows staged for a re-attempt.
    pub async fn apply_batch(&self, batch: &ChangeBatch<Category>) -> SaveOutcome {
        let mut outcome = SaveOutcome::skipped();

        if !batch.delete_ids.is_empty() {
            outcome.deletes = match self.delete_many(&batch.delete_ids).await {
                Ok(n) => OpStatus::Applied(n),
                Err(e) => {
                    warn!(error = %e, "Category delete batch failed");
                    OpStatus::Failed(e.to_string())
                }
            };
        }

        if !batch.inserts.is_empty() {
            outcome.inserts = match self.insert_many(&batch.inserts).await {
                Ok(n) => OpStatus::Applied(n),
                Err(e) => {
                    warn!(error = %e, "Category insert batch failed");
                    OpStatus::Failed(e.to_string())
                }
            };
        }

        if !batch.updates.is_empty() {
            outcome.updates = match self.update_many(&batch.updates).await {
                Ok(n) => OpStatus::Applied(n),
                Err(e) => {
                    warn!(error = %e, "Category update batch failed");
                    OpStatus::Failed(e.to_string())
                }
            };
        }

        outcome
    }

    async fn delete_many(&self, ids: &[i64]) -> DbResult<u64> {
        let mut tx = self.pool.begin().await?;
        let mut affected = 0;
        for id in ids {
            let result = sqlx::query("DELETE FROM category WHERE category_id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            affected += result.rows_affected();
        }
        tx.commit().await?;
        Ok(affected)
    }

    async fn insert_many(&self, categories: &[Category]) -> DbResult<u64> {
        let mut tx = self.pool.begin().await?;
        let mut affected = 0;
        for category in categories {
            // Provisional sheet ids are dropped; the database assigns real ids
            let result = sqlx::query("INSERT INTO category (category_name) VALUES (?1)")
                .bind(&category.category_name)
                .execute(&mut *tx)
                .await?;
            affected += result.rows_affected();
        }
        tx.commit().await?;
        Ok(affected)
    }

    async fn update_many(&self, categories: &[Category]) -> DbResult<u64> {
        let mut tx = self.pool.begin().await?;
        let mut affected = 0;
        for category in categories {
            let result =
                sqlx::query("UPDATE category SET category_name = ?2 WHERE category_id = ?1")
                    .bind(category.category_id)
                    .bind(&category.category_name)
                    .execute(&mut *tx)
                    .await?;
            affected += result.rows_affected();
        }
        tx.commit().await?;
        Ok(affected)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use stockdesk_core::SheetEditor;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_then_fetch_by_id() {
        let db = test_db().await;
        let repo = db.categories();

        let id = repo.insert("Topical").await.unwrap();
        let fetched = repo.get_by_id(id).await.unwrap().unwrap();

        assert_eq!(fetched.category_id, id);
        assert_eq!(fetched.category_name, "Topical");
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let db = test_db().await;
        let repo = db.categories();

        repo.insert("Topical").await.unwrap();
        let err = repo.insert("Topical").await.unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_delete_removes_from_fetch_all() {
        let db = test_db().await;
        let repo = db.categories();

        let id = repo.insert("Topical").await.unwrap();
        repo.insert("Infusion").await.unwrap();

        repo.delete(id).await.unwrap();

        let remaining = repo.fetch_all().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(remaining.iter().all(|c| c.category_id != id));
    }

    #[tokio::test]
    async fn test_apply_batch_full_pipeline() {
        let db = test_db().await;
        let repo = db.categories();

        repo.insert("Topical").await.unwrap();
        repo.insert("Infusion").await.unwrap();

        // Stage: delete "Topical", rename "Infusion", add "Support"
        let mut editor = SheetEditor::new();
        editor.load(repo.fetch_all().await.unwrap());
        editor.toggle_delete(&[1]).unwrap();
        editor
            .edit(2, |c| c.category_name = "Fluids".to_string())
            .unwrap();
        editor.append_with(|id| Category {
            category_id: id,
            category_name: "Support".to_string(),
        });

        let outcome = repo.apply_batch(&editor.batch()).await;
        assert!(outcome.fully_applied());
        assert!(matches!(outcome.deletes, OpStatus::Applied(1)));
        assert!(matches!(outcome.inserts, OpStatus::Applied(1)));
        assert!(matches!(outcome.updates, OpStatus::Applied(1)));

        let names: Vec<String> = repo
            .fetch_all()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.category_name)
            .collect();
        assert_eq!(names, vec!["Fluids".to_string(), "Support".to_string()]);
    }

    #[tokio::test]
    async fn test_apply_batch_reports_failed_insert() {
        let db = test_db().await;
        let repo = db.categories();

        repo.insert("Topical").await.unwrap();

        let batch = ChangeBatch {
            delete_ids: vec![],
            inserts: vec![Category {
                category_id: 2,
                category_name: "Topical".to_string(), // duplicate
            }],
            updates: vec![],
        };

        let outcome = repo.apply_batch(&batch).await;
        assert!(outcome.inserts.is_failed());
        assert!(!outcome.fully_applied());

        // Nothing was inserted
        assert_eq!(repo.fetch_all().await.unwrap().len(), 1);
    }
}
