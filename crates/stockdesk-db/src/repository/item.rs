//! # Item Repository
//!
//! Database operations for the `items` table.
//!
//! Items reference a category; deleting a category that still has items
//! fails with a foreign-key violation, which the UI reports as "in use".

use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use stockdesk_core::{ChangeBatch, Item, OpStatus, SaveOutcome};

const ITEM_COLUMNS: &str = "item_id, active, item_name, category_id, description";

/// Repository for item database operations.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Fetches all items ordered by id.
    ///
    /// Inactive items are included; the sheet renders them grayed out
    /// rather than hiding them.
    pub async fn fetch_all(&self) -> DbResult<Vec<Item>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items ORDER BY item_id");
        let items = sqlx::query_as::<_, Item>(&sql).fetch_all(&self.pool).await?;
        Ok(items)
    }

    /// Gets an item by its id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Item>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE item_id = ?1");
        let item = sqlx::query_as::<_, Item>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    /// Inserts a new item; the database assigns the id.
    pub async fn insert(&self, item: &Item) -> DbResult<i64> {
        debug!(name = %item.item_name, "Inserting item");

        let result = sqlx::query(
            "INSERT INTO items (active, item_name, category_id, description)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(item.active)
        .bind(&item.item_name)
        .bind(item.category_id)
        .bind(&item.description)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Updates an existing item.
    pub async fn update(&self, item: &Item) -> DbResult<()> {
        debug!(id = item.item_id, "Updating item");

        let result = sqlx::query(
            "UPDATE items SET active = ?2, item_name = ?3, category_id = ?4, description = ?5
             WHERE item_id = ?1",
        )
        .bind(item.item_id)
        .bind(item.active)
        .bind(&item.item_name)
        .bind(item.category_id)
        .bind(&item.description)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", item.item_id));
        }

        Ok(())
    }

    /// Deletes an item by id.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id = id, "Deleting item");

        let result = sqlx::query("DELETE FROM items WHERE item_id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }

        Ok(())
    }

    /// Applies a staged change batch: deletes, then inserts, then updates.
    /// See [`crate::repository::category::CategoryRepository::apply_batch`].
    pub async fn apply_batch(&self, batch: &ChangeBatch<Item>) -> SaveOutcome {
        let mut outcome = SaveOutcome::skipped();

        if !batch.delete_ids.is_empty() {
            outcome.deletes = match self.delete_many(&batch.delete_ids).await {
                Ok(n) => OpStatus::Applied(n),
                Err(e) => {
                    warn!(error = %e, "Item delete batch failed");
                    OpStatus::Failed(e.to_string())
                }
            };
        }

        if !batch.inserts.is_empty() {
            outcome.inserts = match self.insert_many(&batch.inserts).await {
                Ok(n) => OpStatus::Applied(n),
                Err(e) => {
                    warn!(error = %e, "Item insert batch failed");
                    OpStatus::Failed(e.to_string())
                }
            };
        }

        if !batch.updates.is_empty() {
            outcome.updates = match self.update_many(&batch.updates).await {
                Ok(n) => OpStatus::Applied(n),
                Err(e) => {
                    warn!(error = %e, "Item update batch failed");
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
            let result = sqlx::query("DELETE FROM items WHERE item_id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            affected += result.rows_affected();
        }
        tx.commit().await?;
        Ok(affected)
    }

    async fn insert_many(&self, items: &[Item]) -> DbResult<u64> {
        let mut tx = self.pool.begin().await?;
        let mut affected = 0;
        for item in items {
            let result = sqlx::query(
                "INSERT INTO items (active, item_name, category_id, description)
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(item.active)
            .bind(&item.item_name)
            .bind(item.category_id)
            .bind(&item.description)
            .execute(&mut *tx)
            .await?;
            affected += result.rows_affected();
        }
        tx.commit().await?;
        Ok(affected)
    }

    async fn update_many(&self, items: &[Item]) -> DbResult<u64> {
        let mut tx = self.pool.begin().await?;
        let mut affected = 0;
        for item in items {
            let result = sqlx::query(
                "UPDATE items SET active = ?2, item_name = ?3, category_id = ?4, description = ?5
                 WHERE item_id = ?1",
            )
            .bind(item.item_id)
            .bind(item.active)
            .bind(&item.item_name)
            .bind(item.category_id)
            .bind(&item.description)
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

    async fn test_db() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.categories().insert("Topical").await.unwrap();
        db
    }

    fn item(name: &str, category_id: i64) -> Item {
        Item {
            item_id: 0,
            active: true,
            item_name: name.to_string(),
            category_id,
            description: None,
        }
    }

    #[tokio::test]
    async fn test_insert_then_fetch_matches() {
        let db = test_db().await;
        let repo = db.items();

        let id = repo.insert(&item("Surgical gel", 1)).await.unwrap();
        let fetched = repo.get_by_id(id).await.unwrap().unwrap();

        assert_eq!(fetched.item_name, "Surgical gel");
        assert_eq!(fetched.category_id, 1);
        assert!(fetched.active);
    }

    #[tokio::test]
    async fn test_duplicate_item_name_rejected() {
        let db = test_db().await;
        let repo = db.items();

        repo.insert(&item("Surgical gel", 1)).await.unwrap();
        let err = repo.insert(&item("Surgical gel", 1)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_insert_with_missing_category_rejected() {
        let db = test_db().await;
        let err = db.items().insert(&item("Orphan", 99)).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_delete_category_in_use_rejected() {
        let db = test_db().await;
        db.items().insert(&item("Surgical gel", 1)).await.unwrap();

        let err = db.categories().delete(1).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_update_round_trip() {
        let db = test_db().await;
        let repo = db.items();

        let id = repo.insert(&item("Surgical gel", 1)).await.unwrap();
        let mut fetched = repo.get_by_id(id).await.unwrap().unwrap();
        fetched.active = false;
        fetched.description = Some("discontinued".to_string());
        repo.update(&fetched).await.unwrap();

        let again = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(again, fetched);
    }
}
