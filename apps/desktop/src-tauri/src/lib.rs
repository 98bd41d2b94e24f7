//! # StockDesk Desktop Library
//!
//! Core library for the StockDesk desktop application.
//! This is the main entry point that configures and runs the Tauri app.
//!
//! ## Module Organization
//! ```text
//! stockdesk_desktop_lib/
//! ├── lib.rs              ◄─── You are here (Tauri setup & run)
//! ├── state/
//! │   ├── mod.rs          ◄─── State type exports
//! │   ├── db.rs           ◄─── Database state wrapper
//! │   ├── editor.rs       ◄─── Sheet editors (edit tracking per table)
//! │   ├── session.rs      ◄─── Logged-in user state
//! │   └── config.rs       ◄─── Configuration state
//! ├── commands/
//! │   ├── mod.rs          ◄─── Command exports, save report shape
//! │   ├── auth.rs         ◄─── Login/logout/password commands
//! │   ├── category.rs     ◄─── Category sheet commands
//! │   ├── item.rs         ◄─── Item sheet commands
//! │   ├── sku.rs          ◄─── SKU sheet commands
//! │   ├── transaction.rs  ◄─── Transaction sheet commands
//! │   └── config.rs       ◄─── Config access
//! └── error.rs            ◄─── API error type for commands
//! ```

pub mod commands;
pub mod error;
pub mod state;

use directories::ProjectDirs;
use std::path::PathBuf;
use tauri::Manager;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use state::{ConfigState, DbState, EditorState, SessionState};
use stockdesk_db::{Database, DbConfig};

/// Runs the Tauri application.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Application Startup                               │
/// │                                                                         │
/// │  1. Initialize Logging ───────────────────────────────────────────────► │
/// │     • tracing-subscriber with env filter                                │
/// │     • Panic hook so uncaught panics land in the log                     │
/// │                                                                         │
/// │  2. Load Configuration ───────────────────────────────────────────────► │
/// │     • stockdesk.conf (key=value), then STOCKDESK_* env vars             │
/// │                                                                         │
/// │  3. Determine Database Path ──────────────────────────────────────────► │
/// │     • Config override, else the platform data directory                 │
/// │                                                                         │
/// │  4. Connect to Database ──────────────────────────────────────────────► │
/// │     • SQLite with WAL mode, run pending migrations                      │
/// │                                                                         │
/// │  5. Initialize State Objects ─────────────────────────────────────────► │
/// │     • DbState, EditorState, SessionState, ConfigState                   │
/// │                                                                         │
/// │  6. Build & Run Tauri App ────────────────────────────────────────────► │
/// │     • Register all commands, manage state, launch window                │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn run() {
    init_tracing();
    init_panic_hook();

    info!("Starting StockDesk Desktop Application");

    tauri::Builder::default()
        // Setup hook runs before the app starts
        .setup(|app| {
            let config = ConfigState::load()?;
            info!(?config, "Configuration loaded");

            let db_path = get_database_path(&config)?;
            info!(?db_path, "Database path determined");

            // Initialize database (blocking in setup, async in runtime)
            let db = tauri::async_runtime::block_on(async {
                Database::new(DbConfig::new(db_path)).await
            })?;

            info!("Database connected and migrations applied");

            app.manage(DbState::new(db));
            app.manage(EditorState::new());
            app.manage(SessionState::new());
            app.manage(config);

            info!("State initialized");
            Ok(())
        })
        // Register all commands
        .invoke_handler(tauri::generate_handler![
            // Auth commands
            commands::auth::login,
            commands::auth::logout,
            commands::auth::current_user,
            commands::auth::change_password,
            commands::auth::add_user,
            commands::auth::remove_user,
            // Category sheet
            commands::category::load_categories,
            commands::category::append_category,
            commands::category::update_category,
            commands::category::toggle_category_deleted,
            commands::category::discard_category_edits,
            commands::category::save_categories,
            // Item sheet
            commands::item::load_items,
            commands::item::append_item,
            commands::item::update_item,
            commands::item::toggle_item_deleted,
            commands::item::discard_item_edits,
            commands::item::save_items,
            // SKU sheet
            commands::sku::load_skus,
            commands::sku::append_sku,
            commands::sku::update_sku,
            commands::sku::toggle_sku_deleted,
            commands::sku::discard_sku_edits,
            commands::sku::save_skus,
            // Transaction sheet
            commands::transaction::list_transaction_types,
            commands::transaction::load_transactions,
            commands::transaction::load_more_transactions,
            commands::transaction::stage_transaction,
            commands::transaction::update_transaction,
            commands::transaction::toggle_transaction_deleted,
            commands::transaction::discard_transaction_edits,
            commands::transaction::save_transactions,
            // Config
            commands::config::get_config,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=stockdesk=trace` - Trace for stockdesk crates only
/// - Default: INFO level, debug for stockdesk crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,stockdesk=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Routes uncaught panics into the log before the process dies.
fn init_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        error!(%info, "Uncaught panic");
        default_hook(info);
    }));
}

/// Determines the database file path.
///
/// ## Resolution Order
/// 1. `db_path` from configuration (file or `STOCKDESK_DB_PATH`)
/// 2. Platform data directory:
///    - **macOS**: `~/Library/Application Support/com.stockdesk.app/stockdesk.db`
///    - **Windows**: `%APPDATA%\stockdesk\stockdesk\data\stockdesk.db`
///    - **Linux**: `~/.local/share/stockdesk/stockdesk.db`
fn get_database_path(config: &ConfigState) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(path) = &config.db_path {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        return Ok(path.clone());
    }

    let proj_dirs = ProjectDirs::from("com", "stockdesk", "stockdesk")
        .ok_or("Could not determine app data directory")?;

    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)?;

    Ok(data_dir.join("stockdesk.db"))
}
