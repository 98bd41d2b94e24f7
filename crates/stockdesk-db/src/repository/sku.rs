//! # SKU Repository
//!
//! Database operations for the `skus` table.
//!
//! SKUs are listed per item (the SKU sheet filters by the item selected in
//! the sheet above it), and their quantity is refreshed from the latest
//! transaction after a transaction save.

use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use stockdesk_core::{ChangeBatch, OpStatus, SaveOutcome, Sku};

const SKU_COLUMNS: &str = "sku_id, active, root_sku, sub_name, bit_code, sku_qty, min_qty, \
                           item_id, expiration_date, description";

/// Repository for SKU database operations.
#[derive(Debug, Clone)]
pub struct SkuRepository {
    pool: SqlitePool,
}

impl SkuRepository {
    /// Creates a new SkuRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SkuRepository { pool }
    }

    /// Fetches SKUs, optionally restricted to one item.
    pub async fn fetch_all(&self, item_id: Option<i64>) -> DbResult<Vec<Sku>> {
        let skus = match item_id {
            Some(item_id) => {
                let sql =
                    format!("SELECT {SKU_COLUMNS} FROM skus WHERE item_id = ?1 ORDER BY sku_id");
                sqlx::query_as::<_, Sku>(&sql)
                    .bind(item_id)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!("SELECT {SKU_COLUMNS} FROM skus ORDER BY sku_id");
                sqlx::query_as::<_, Sku>(&sql).fetch_all(&self.pool).await?
            }
        };
        Ok(skus)
    }

    /// Gets a SKU by its id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Sku>> {
        let sql = format!("SELECT {SKU_COLUMNS} FROM skus WHERE sku_id = ?1");
        let sku = sqlx::query_as::<_, Sku>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(sku)
    }

    /// Inserts a new SKU; the database assigns the id.
    pub async fn insert(&self, sku: &Sku) -> DbResult<i64> {
        debug!(item_id = sku.item_id, sub_name = ?sku.sub_name, "Inserting SKU");

        let result = sqlx::query(
            "INSERT INTO skus (active, root_sku, sub_name, bit_code, sku_qty, min_qty, item_id,
                               expiration_date, description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(sku.active)
        .bind(sku.root_sku)
        .bind(&sku.sub_name)
        .bind(&sku.bit_code)
        .bind(sku.sku_qty)
        .bind(sku.min_qty)
        .bind(sku.item_id)
        .bind(sku.expiration_date)
        .bind(&sku.description)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Updates an existing SKU.
    pub async fn update(&self, sku: &Sku) -> DbResult<()> {
        debug!(id = sku.sku_id, "Updating SKU");

        let result = sqlx::query(
            "UPDATE skus SET active = ?2, root_sku = ?3, sub_name = ?4, bit_code = ?5,
                             sku_qty = ?6, min_qty = ?7, item_id = ?8, expiration_date = ?9,
                             description = ?10
             WHERE sku_id = ?1",
        )
        .bind(sku.sku_id)
        .bind(sku.active)
        .bind(sku.root_sku)
        .bind(&sku.sub_name)
        .bind(&sku.bit_code)
        .bind(sku.sku_qty)
        .bind(sku.min_qty)
        .bind(sku.item_id)
        .bind(sku.expiration_date)
        .bind(&sku.description)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("SKU", sku.sku_id));
        }

        Ok(())
    }

    /// Sets a SKU's quantity directly.
    ///
    /// Used after a transaction save to bring the SKU in line with the
    /// latest transaction's `after_qty`.
    pub async fn update_qty(&self, id: i64, qty: i64) -> DbResult<()> {
        debug!(id = id, qty = qty, "Updating SKU quantity");

        let result = sqlx::query("UPDATE skus SET sku_qty = ?2 WHERE sku_id = ?1")
            .bind(id)
            .bind(qty)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("SKU", id));
        }

        Ok(())
    }

    /// Deletes a SKU by id.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id = id, "Deleting SKU");

        let result = sqlx::query("DELETE FROM skus WHERE sku_id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("SKU", id));
        }

        Ok(())
    }

    /// Applies a staged change batch: deletes, then inserts, then updates.
    /// See [`crate::repository::category::CategoryRepository::apply_batch`].
    pub async fn apply_batch(&self, batch: &ChangeBatch<Sku>) -> SaveOutcome {
        let mut outcome = SaveOutcome::skipped();

        if !batch.delete_ids.is_empty() {
            outcome.deletes = match self.delete_many(&batch.delete_ids).await {
                Ok(n) => OpStatus::Applied(n),
                Err(e) => {
                    warn!(error = %e, "SKU delete batch failed");
                    OpStatus::Failed(e.to_string())
                }
            };
        }

        if !batch.inserts.is_empty() {
            outcome.inserts = match self.insert_many(&batch.inserts).await {
                Ok(n) => OpStatus::Applied(n),
                Err(e) => {
                    warn!(error = %e, "SKU insert batch failed");
                    OpStatus::Failed(e.to_string())
                }
            };
        }

        if !batch.updates.is_empty() {
            outcome.updates = match self.update_many(&batch.updates).await {
                Ok(n) => OpStatus::Applied(n),
                Err(e) => {
                    warn!(error = %e, "SKU update batch failed");
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
            let result = sqlx::query("DELETE FROM skus WHERE sku_id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            affected += result.rows_affected();
        }
        tx.commit().await?;
        Ok(affected)
    }

    async fn insert_many(&self, skus: &[Sku]) -> DbResult<u64> {
        let mut tx = self.pool.begin().await?;
        let mut affected = 0;
        for sku in skus {
            let result = sqlx::query(
                "INSERT INTO skus (active, root_sku, sub_name, bit_code, sku_qty, min_qty,
                                   item_id, expiration_date, description)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )
            .bind(sku.active)
            .bind(sku.root_sku)
            .bind(&sku.sub_name)
            .bind(&sku.bit_code)
            .bind(sku.sku_qty)
            .bind(sku.min_qty)
            .bind(sku.item_id)
            .bind(sku.expiration_date)
            .bind(&sku.description)
            .execute(&mut *tx)
            .await?;
            affected += result.rows_affected();
        }
        tx.commit().await?;
        Ok(affected)
    }

    async fn update_many(&self, skus: &[Sku]) -> DbResult<u64> {
        let mut tx = self.pool.begin().await?;
        let mut affected = 0;
        for sku in skus {
            let result = sqlx::query(
                "UPDATE skus SET active = ?2, root_sku = ?3, sub_name = ?4, bit_code = ?5,
                                 sku_qty = ?6, min_qty = ?7, item_id = ?8, expiration_date = ?9,
                                 description = ?10
                 WHERE sku_id = ?1",
            )
            .bind(sku.sku_id)
            .bind(sku.active)
            .bind(sku.root_sku)
            .bind(&sku.sub_name)
            .bind(&sku.bit_code)
            .bind(sku.sku_qty)
            .bind(sku.min_qty)
            .bind(sku.item_id)
            .bind(sku.expiration_date)
            .bind(&sku.description)
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
    use stockdesk_core::{no_expiration, Item};

    async fn test_db() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.categories().insert("Topical").await.unwrap();
        db.items()
            .insert(&Item {
                item_id: 0,
                active: true,
                item_name: "Surgical gel".to_string(),
                category_id: 1,
                description: None,
            })
            .await
            .unwrap();
        db
    }

    fn sku(item_id: i64, sub_name: &str, qty: i64) -> Sku {
        Sku {
            sku_id: 0,
            active: true,
            root_sku: 0,
            sub_name: Some(sub_name.to_string()),
            bit_code: None,
            sku_qty: qty,
            min_qty: 1,
            item_id,
            expiration_date: no_expiration(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_insert_then_fetch_matches() {
        let db = test_db().await;
        let repo = db.skus();

        let id = repo.insert(&sku(1, "40ml", 5)).await.unwrap();
        let fetched = repo.get_by_id(id).await.unwrap().unwrap();

        assert_eq!(fetched.sub_name.as_deref(), Some("40ml"));
        assert_eq!(fetched.sku_qty, 5);
        assert_eq!(fetched.expiration_date, no_expiration());
    }

    #[tokio::test]
    async fn test_fetch_filtered_by_item() {
        let db = test_db().await;
        db.items()
            .insert(&Item {
                item_id: 0,
                active: true,
                item_name: "Other".to_string(),
                category_id: 1,
                description: None,
            })
            .await
            .unwrap();

        let repo = db.skus();
        repo.insert(&sku(1, "40ml", 0)).await.unwrap();
        repo.insert(&sku(1, "120ml", 0)).await.unwrap();
        repo.insert(&sku(2, "unit", 0)).await.unwrap();

        assert_eq!(repo.fetch_all(Some(1)).await.unwrap().len(), 2);
        assert_eq!(repo.fetch_all(Some(2)).await.unwrap().len(), 1);
        assert_eq!(repo.fetch_all(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_triplet_rejected() {
        let db = test_db().await;
        let repo = db.skus();

        repo.insert(&sku(1, "40ml", 0)).await.unwrap();
        // Same (item_id, sub_name, expiration_date)
        let err = repo.insert(&sku(1, "40ml", 3)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_update_qty() {
        let db = test_db().await;
        let repo = db.skus();

        let id = repo.insert(&sku(1, "40ml", 0)).await.unwrap();
        repo.update_qty(id, 12).await.unwrap();

        assert_eq!(repo.get_by_id(id).await.unwrap().unwrap().sku_qty, 12);
        assert!(matches!(
            repo.update_qty(99, 1).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_delete_removes_row() {
        let db = test_db().await;
        let repo = db.skus();

        let id = repo.insert(&sku(1, "40ml", 0)).await.unwrap();
        repo.delete(id).await.unwrap();
        assert!(repo.get_by_id(id).await.unwrap().is_none());
    }
}
