//! # Transaction Repository
//!
//! Database operations for `transactions` and the `transaction_type`
//! reference table.
//!
//! ## Browsing Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Transaction Browsing                                   │
//! │                                                                         │
//! │  load_transactions(sku, date range)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  count(filter) ──► total_records                                        │
//! │  fetch_page(filter, page 0) ──► first page, newest first                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  load_more ──► fetch_page(page 1) ──► extend in-memory rows             │
//! │       │          (repeat until loaded == min(total, configured max))    │
//! │       ▼                                                                 │
//! │  rows joined with user_name and tr_type for display                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use stockdesk_core::{ChangeBatch, OpStatus, SaveOutcome, StockTransaction, TransactionType};

/// Filter for transaction queries.
///
/// All fields combine with AND. `include_inactive` controls whether
/// transactions of inactive SKUs/items appear at all.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilter {
    pub sku_id: Option<i64>,
    pub begin: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub include_inactive: bool,
}

/// A transaction row joined with the names a sheet displays.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TransactionDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub tr: StockTransaction,
    pub user_name: String,
    pub tr_type: String,
}

const DETAIL_SELECT: &str = "SELECT t.tr_id, t.user_id, t.sku_id, t.tr_type_id, t.tr_qty, \
     t.before_qty, t.after_qty, t.tr_timestamp, t.description, u.user_name, tt.tr_type \
     FROM transactions t \
     JOIN users u ON u.user_id = t.user_id \
     JOIN transaction_type tt ON tt.tr_type_id = t.tr_type_id \
     JOIN skus s ON s.sku_id = t.sku_id \
     JOIN items i ON i.item_id = s.item_id";

/// Repository for stock transaction database operations.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    // =========================================================================
    // Reference Data
    // =========================================================================

    /// Lists the transaction types (Buy, Sell, AdjustmentPlus,
    /// AdjustmentMinus), for the type combobox.
    pub async fn list_types(&self) -> DbResult<Vec<TransactionType>> {
        let types = sqlx::query_as::<_, TransactionType>(
            "SELECT tr_type_id, tr_type FROM transaction_type ORDER BY tr_type_id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(types)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Gets a transaction by id (without the display joins).
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<StockTransaction>> {
        let tr = sqlx::query_as::<_, StockTransaction>(
            "SELECT tr_id, user_id, sku_id, tr_type_id, tr_qty, before_qty, after_qty,
                    tr_timestamp, description
             FROM transactions WHERE tr_id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(tr)
    }

    /// Fetches one page of transactions matching the filter, newest first,
    /// joined with user and type names.
    pub async fn fetch_page(
        &self,
        filter: &TransactionFilter,
        offset: i64,
        limit: i64,
    ) -> DbResult<Vec<TransactionDetail>> {
        debug!(?filter, offset, limit, "Fetching transaction page");

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(DETAIL_SELECT);
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY t.tr_id DESC LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let rows = qb
            .build_query_as::<TransactionDetail>()
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Transaction page fetched");
        Ok(rows)
    }

    /// Counts transactions matching the filter; backs `load_more`.
    pub async fn count(&self, filter: &TransactionFilter) -> DbResult<i64> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT COUNT(*) FROM transactions t \
             JOIN skus s ON s.sku_id = t.sku_id \
             JOIN items i ON i.item_id = s.item_id",
        );
        push_filter(&mut qb, filter);

        let count: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count)
    }

    /// The most recent transaction of a SKU, if any.
    ///
    /// Its `after_qty` is the authoritative quantity the SKU row is synced
    /// to after a save.
    pub async fn latest_for_sku(&self, sku_id: i64) -> DbResult<Option<StockTransaction>> {
        let tr = sqlx::query_as::<_, StockTransaction>(
            "SELECT tr_id, user_id, sku_id, tr_type_id, tr_qty, before_qty, after_qty,
                    tr_timestamp, description
             FROM transactions WHERE sku_id = ?1 ORDER BY tr_id DESC LIMIT 1",
        )
        .bind(sku_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(tr)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Inserts a transaction; the database assigns the id.
    pub async fn insert(&self, tr: &StockTransaction) -> DbResult<i64> {
        debug!(sku_id = tr.sku_id, tr_qty = tr.tr_qty, "Inserting transaction");

        let result = sqlx::query(
            "INSERT INTO transactions (user_id, sku_id, tr_type_id, tr_qty, before_qty,
                                       after_qty, tr_timestamp, description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(tr.user_id)
        .bind(tr.sku_id)
        .bind(tr.tr_type_id)
        .bind(tr.tr_qty)
        .bind(tr.before_qty)
        .bind(tr.after_qty)
        .bind(tr.tr_timestamp)
        .bind(&tr.description)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Updates the mutable columns of a transaction.
    ///
    /// User, SKU and timestamp are frozen once recorded; only the movement
    /// itself (type, quantities) and the description can be corrected.
    pub async fn update(&self, tr: &StockTransaction) -> DbResult<()> {
        debug!(id = tr.tr_id, "Updating transaction");

        let result = sqlx::query(
            "UPDATE transactions SET tr_type_id = ?2, tr_qty = ?3, before_qty = ?4,
                                     after_qty = ?5, description = ?6
             WHERE tr_id = ?1",
        )
        .bind(tr.tr_id)
        .bind(tr.tr_type_id)
        .bind(tr.tr_qty)
        .bind(tr.before_qty)
        .bind(tr.after_qty)
        .bind(&tr.description)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Transaction", tr.tr_id));
        }

        Ok(())
    }

    /// Deletes a transaction by id.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id = id, "Deleting transaction");

        let result = sqlx::query("DELETE FROM transactions WHERE tr_id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Transaction", id));
        }

        Ok(())
    }

    /// Applies a staged change batch: deletes, then inserts, then updates.
    /// See [`crate::repository::category::CategoryRepository::apply_batch`].
    pub async fn apply_batch(&self, batch: &ChangeBatch<StockTransaction>) -> SaveOutcome {
        let mut outcome = SaveOutcome::skipped();

        if !batch.delete_ids.is_empty() {
            outcome.deletes = match self.delete_many(&batch.delete_ids).await {
                Ok(n) => OpStatus::Applied(n),
                Err(e) => {
                    warn!(error = %e, "Transaction delete batch failed");
                    OpStatus::Failed(e.to_string())
                }
            };
        }

        if !batch.inserts.is_empty() {
            outcome.inserts = match self.insert_many(&batch.inserts).await {
                Ok(n) => OpStatus::Applied(n),
                Err(e) => {
                    warn!(error = %e, "Transaction insert batch failed");
                    OpStatus::Failed(e.to_string())
                }
            };
        }

        if !batch.updates.is_empty() {
            outcome.updates = match self.update_many(&batch.updates).await {
                Ok(n) => OpStatus::Applied(n),
                Err(e) => {
                    warn!(error = %e, "Transaction update batch failed");
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
            let result = sqlx::query("DELETE FROM transactions WHERE tr_id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            affected += result.rows_affected();
        }
        tx.commit().await?;
        Ok(affected)
    }

    async fn insert_many(&self, trs: &[StockTransaction]) -> DbResult<u64> {
        let mut tx = self.pool.begin().await?;
        let mut affected = 0;
        for tr in trs {
            let result = sqlx::query(
                "INSERT INTO transactions (user_id, sku_id, tr_type_id, tr_qty, before_qty,
                                           after_qty, tr_timestamp, description)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .bind(tr.user_id)
            .bind(tr.sku_id)
            .bind(tr.tr_type_id)
            .bind(tr.tr_qty)
            .bind(tr.before_qty)
            .bind(tr.after_qty)
            .bind(tr.tr_timestamp)
            .bind(&tr.description)
            .execute(&mut *tx)
            .await?;
            affected += result.rows_affected();
        }
        tx.commit().await?;
        Ok(affected)
    }

    async fn update_many(&self, trs: &[StockTransaction]) -> DbResult<u64> {
        let mut tx = self.pool.begin().await?;
        let mut affected = 0;
        for tr in trs {
            let result = sqlx::query(
                "UPDATE transactions SET tr_type_id = ?2, tr_qty = ?3, before_qty = ?4,
                                         after_qty = ?5, description = ?6
                 WHERE tr_id = ?1",
            )
            .bind(tr.tr_id)
            .bind(tr.tr_type_id)
            .bind(tr.tr_qty)
            .bind(tr.before_qty)
            .bind(tr.after_qty)
            .bind(&tr.description)
            .execute(&mut *tx)
            .await?;
            affected += result.rows_affected();
        }
        tx.commit().await?;
        Ok(affected)
    }
}

/// Appends the WHERE clause shared by `fetch_page` and `count`.
fn push_filter(qb: &mut QueryBuilder<Sqlite>, filter: &TransactionFilter) {
    qb.push(" WHERE 1=1");

    if !filter.include_inactive {
        qb.push(" AND s.active = 1 AND i.active = 1");
    }
    if let Some(sku_id) = filter.sku_id {
        qb.push(" AND t.sku_id = ");
        qb.push_bind(sku_id);
    }
    if let Some(begin) = filter.begin {
        qb.push(" AND t.tr_timestamp >= ");
        qb.push_bind(begin);
    }
    if let Some(end) = filter.end {
        qb.push(" AND t.tr_timestamp <= ");
        qb.push_bind(end);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::seed;
    use stockdesk_core::TransactionKind;

    async fn seeded_db() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed::seed_reference_data(&db).await.unwrap();
        db
    }

    fn buy(sku_id: i64, qty: i64, before: i64) -> StockTransaction {
        StockTransaction {
            tr_id: 0,
            user_id: 1,
            sku_id,
            tr_type_id: TransactionKind::Buy.type_id(),
            tr_qty: qty,
            before_qty: before,
            after_qty: before + qty,
            tr_timestamp: Utc::now(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_list_types_matches_reference_data() {
        let db = seeded_db().await;
        let types = db.transactions().list_types().await.unwrap();
        let names: Vec<&str> = types.iter().map(|t| t.tr_type.as_str()).collect();
        assert_eq!(names, ["Buy", "Sell", "AdjustmentPlus", "AdjustmentMinus"]);
    }

    #[tokio::test]
    async fn test_insert_then_fetch_matches() {
        let db = seeded_db().await;
        let repo = db.transactions();

        let id = repo.insert(&buy(1, 5, 0)).await.unwrap();
        let fetched = repo.get_by_id(id).await.unwrap().unwrap();

        assert_eq!(fetched.tr_qty, 5);
        assert_eq!(fetched.before_qty, 0);
        assert_eq!(fetched.after_qty, 5);
        assert_eq!(fetched.kind().unwrap(), TransactionKind::Buy);
    }

    #[tokio::test]
    async fn test_insert_with_unknown_sku_rejected() {
        let db = seeded_db().await;
        let err = db.transactions().insert(&buy(999, 5, 0)).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_pagination_extends_until_total() {
        let db = seeded_db().await;
        let repo = db.transactions();

        // Seed data already carries one bootstrap transaction on SKU 1
        let mut before = 0;
        for _ in 0..7 {
            repo.insert(&buy(2, 3, before)).await.unwrap();
            before += 3;
        }

        let filter = TransactionFilter {
            sku_id: Some(2),
            ..Default::default()
        };
        let total = repo.count(&filter).await.unwrap();
        assert_eq!(total, 7);

        // Page through with a small page size, accumulating like load_more
        let mut loaded: Vec<TransactionDetail> = Vec::new();
        let mut page = 0;
        while (loaded.len() as i64) < total {
            let rows = repo.fetch_page(&filter, page * 3, 3).await.unwrap();
            assert!(!rows.is_empty());
            loaded.extend(rows);
            page += 1;
        }
        assert_eq!(loaded.len() as i64, total);

        // Newest first across page boundaries
        let ids: Vec<i64> = loaded.iter().map(|d| d.tr.tr_id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        assert_eq!(ids, sorted);
    }

    #[tokio::test]
    async fn test_filter_by_time_range() {
        let db = seeded_db().await;
        let repo = db.transactions();

        let early = Utc::now();
        repo.insert(&buy(2, 1, 0)).await.unwrap();
        let mid = Utc::now();
        repo.insert(&buy(2, 2, 1)).await.unwrap();

        let filter = TransactionFilter {
            sku_id: Some(2),
            begin: Some(mid),
            ..Default::default()
        };
        let rows = repo.fetch_page(&filter, 0, 10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].tr.tr_qty, 2);

        let filter = TransactionFilter {
            sku_id: Some(2),
            begin: Some(early),
            end: Some(Utc::now()),
            ..Default::default()
        };
        assert_eq!(repo.count(&filter).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_latest_for_sku_and_detail_names() {
        let db = seeded_db().await;
        let repo = db.transactions();

        repo.insert(&buy(2, 4, 0)).await.unwrap();
        repo.insert(&buy(2, 6, 4)).await.unwrap();

        let latest = repo.latest_for_sku(2).await.unwrap().unwrap();
        assert_eq!(latest.after_qty, 10);

        let filter = TransactionFilter {
            sku_id: Some(2),
            ..Default::default()
        };
        let rows = repo.fetch_page(&filter, 0, 1).await.unwrap();
        assert_eq!(rows[0].user_name, "admin");
        assert_eq!(rows[0].tr_type, "Buy");
    }

    #[tokio::test]
    async fn test_apply_batch_delete_and_update() {
        let db = seeded_db().await;
        let repo = db.transactions();

        let keep = repo.insert(&buy(2, 4, 0)).await.unwrap();
        let removed = repo.insert(&buy(2, 6, 4)).await.unwrap();

        let mut updated = repo.get_by_id(keep).await.unwrap().unwrap();
        updated.description = Some("corrected".to_string());

        let batch = ChangeBatch {
            delete_ids: vec![removed],
            inserts: vec![],
            updates: vec![updated],
        };
        let outcome = repo.apply_batch(&batch).await;
        assert!(outcome.fully_applied());

        assert!(repo.get_by_id(removed).await.unwrap().is_none());
        assert_eq!(
            repo.get_by_id(keep)
                .await
                .unwrap()
                .unwrap()
                .description
                .as_deref(),
            Some("corrected")
        );
    }
}
