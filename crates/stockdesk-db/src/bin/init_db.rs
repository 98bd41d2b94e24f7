//! # Database Initializer
//!
//! Drops and recreates every table, then seeds the reference data a fresh
//! installation needs (categories, transaction types, an admin user, sample
//! items and SKUs).
//!
//! ## Usage
//! ```bash
//! # Reset the default development database
//! cargo run -p stockdesk-db --bin init-db
//!
//! # Specify a database path
//! cargo run -p stockdesk-db --bin init-db -- --db ./data/stockdesk.db
//! ```
//!
//! DESTRUCTIVE: all existing data is lost. This is the installer/reset
//! path, not something to run against a live database.

use std::env;

use stockdesk_db::{migrations, seed, Database, DbConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Log uncaught panics before the process dies
    std::panic::set_hook(Box::new(|info| {
        tracing::error!(%info, "Uncaught panic");
    }));

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = env::var("STOCKDESK_DB_PATH").unwrap_or_else(|_| "./stockdesk_dev.db".to_string());

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("StockDesk Database Initializer");
                println!();
                println!("Usage: init-db [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./stockdesk_dev.db,");
                println!("                     or STOCKDESK_DB_PATH if set)");
                println!("  -h, --help         Show this help message");
                println!();
                println!("Drops ALL tables and reseeds reference data.");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("StockDesk Database Initializer");
    println!("==============================");
    println!("Database: {}", db_path);
    println!();

    // Connect without auto-migrating; reset() drops and re-runs migrations
    let config = DbConfig::new(&db_path).run_migrations(false);
    let db = Database::new(config).await?;
    println!("✓ Connected to database");

    seed::reset(&db).await?;
    let (total, applied) = migrations::migration_status(db.pool()).await?;
    println!("✓ Schema recreated ({applied}/{total} migrations applied)");

    seed::seed_reference_data(&db).await?;
    println!("✓ Reference data seeded");
    println!();

    println!("Seeded:");
    println!("  Categories:        {}", db.categories().fetch_all().await?.len());
    println!("  Transaction types: {}", db.transactions().list_types().await?.len());
    println!("  Users:             {}", db.users().fetch_all().await?.len());
    println!("  Items:             {}", db.items().fetch_all().await?.len());
    println!("  SKUs:              {}", db.skus().fetch_all(None).await?.len());
    println!();
    println!(
        "Login as 'admin' with the default password '{}' and change it.",
        seed::SEED_PASSWORD
    );
    println!();
    println!("✓ Initialization complete!");

    Ok(())
}
