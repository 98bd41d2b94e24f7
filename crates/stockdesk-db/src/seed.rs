//! # Database Initialization and Seeding
//!
//! Drop-and-recreate initialization plus the reference data a fresh
//! installation needs: categories, the four transaction types, an admin
//! user, and a couple of sample items/SKUs to explore with.
//!
//! Used by the `init-db` binary and by tests that need a populated
//! database.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;
use crate::pool::Database;
use stockdesk_core::{auth, no_expiration, Item, Sku, StockTransaction, TransactionKind};

/// Default password for the seeded users. Meant to be changed on first
/// login of a real installation.
pub const SEED_PASSWORD: &str = "admin";

/// Drops every table (including the migration ledger) and recreates the
/// schema from scratch.
///
/// Destructive by design: this is the `init-db` reset path, not something
/// the application ever calls on its own.
pub async fn reset(db: &Database) -> DbResult<()> {
    info!("Dropping all tables");
    drop_all_tables(db.pool()).await?;
    db.run_migrations().await?;
    Ok(())
}

async fn drop_all_tables(pool: &SqlitePool) -> DbResult<()> {
    // Children before parents so foreign keys don't object
    for table in [
        "transactions",
        "skus",
        "items",
        "category",
        "users",
        "transaction_type",
        "_sqlx_migrations",
    ] {
        sqlx::query(&format!("DROP TABLE IF EXISTS {table}"))
            .execute(pool)
            .await?;
    }
    Ok(())
}

/// Inserts the reference data set into an empty schema.
///
/// Reference rows (categories, transaction types, users) get fixed ids —
/// [`TransactionKind::type_id`] relies on the type ids — while the sample
/// items and SKUs take whatever the database assigns.
pub async fn seed_reference_data(db: &Database) -> DbResult<()> {
    info!("Seeding reference data");
    let pool = db.pool();

    for (id, name) in [(1, "Topical"), (2, "Infusion"), (3, "Support"), (4, "Misc")] {
        sqlx::query("INSERT INTO category (category_id, category_name) VALUES (?1, ?2)")
            .bind(id)
            .bind(name)
            .execute(pool)
            .await?;
    }

    for kind in TransactionKind::ALL {
        sqlx::query("INSERT INTO transaction_type (tr_type_id, tr_type) VALUES (?1, ?2)")
            .bind(kind.type_id())
            .bind(kind.name())
            .execute(pool)
            .await?;
    }

    let hash = auth::hash_password(SEED_PASSWORD)
        .map_err(|e| crate::error::DbError::Internal(e.to_string()))?;
    for (id, name) in [(1, "admin"), (2, "test")] {
        sqlx::query("INSERT INTO users (user_id, user_name, user_password) VALUES (?1, ?2, ?3)")
            .bind(id)
            .bind(name)
            .bind(&hash)
            .execute(pool)
            .await?;
    }

    let items = [
        Item {
            item_id: 0,
            active: true,
            item_name: "Nociceptol".to_string(),
            category_id: 1,
            description: Some("".to_string()),
        },
        Item {
            item_id: 0,
            active: true,
            item_name: "Surgigel".to_string(),
            category_id: 1,
            description: Some("".to_string()),
        },
    ];
    for item in &items {
        db.items().insert(item).await?;
    }

    let skus = [
        sample_sku(1, "40ml", "noci40"),
        sample_sku(1, "120ml", "noci120"),
        sample_sku(2, "standard", "surgigel"),
    ];
    for sku in &skus {
        db.skus().insert(sku).await?;
    }

    // Bootstrap transaction so the history view is never empty
    db.transactions()
        .insert(&StockTransaction {
            tr_id: 0,
            user_id: 1,
            sku_id: 1,
            tr_type_id: TransactionKind::Buy.type_id(),
            tr_qty: 0,
            before_qty: 0,
            after_qty: 0,
            tr_timestamp: Utc::now(),
            description: Some("initial".to_string()),
        })
        .await?;

    info!("Reference data seeded");
    Ok(())
}

fn sample_sku(item_id: i64, sub_name: &str, bit_code: &str) -> Sku {
    Sku {
        sku_id: 0,
        active: true,
        root_sku: 0,
        sub_name: Some(sub_name.to_string()),
        bit_code: Some(bit_code.to_string()),
        sku_qty: 0,
        min_qty: 1,
        item_id,
        expiration_date: no_expiration(),
        description: Some("".to_string()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DbConfig;

    #[tokio::test]
    async fn test_seed_smoke() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_reference_data(&db).await.unwrap();

        assert_eq!(db.categories().fetch_all().await.unwrap().len(), 4);
        assert_eq!(db.transactions().list_types().await.unwrap().len(), 4);
        assert_eq!(db.items().fetch_all().await.unwrap().len(), 2);
        assert_eq!(db.skus().fetch_all(None).await.unwrap().len(), 3);

        let admin = db.users().get_by_name("admin").await.unwrap().unwrap();
        assert!(auth::verify_password(SEED_PASSWORD, &admin.user_password).unwrap());
    }
}
