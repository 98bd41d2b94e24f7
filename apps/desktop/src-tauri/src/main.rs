//! # StockDesk Desktop Application Entry Point
//!
//! This is the main entry point for the Tauri desktop application.
//!
//! ## Application Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         StockDesk Desktop                               │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      Tauri WebView                               │  │
//! │  │  ┌────────────────────────────────────────────────────────────┐  │  │
//! │  │  │                      Frontend                              │  │  │
//! │  │  │  • Login          • Category / Item / SKU sheets           │  │  │
//! │  │  │  • Transaction history + single-transaction entry          │  │  │
//! │  │  └────────────────────────────────────────────────────────────┘  │  │
//! │  │                              │                                   │  │
//! │  │                     invoke('command')                            │  │
//! │  │                              │                                   │  │
//! │  └──────────────────────────────┼───────────────────────────────────┘  │
//! │                                 ▼                                       │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                    Rust Backend (this crate)                     │  │
//! │  │                                                                  │  │
//! │  │  main.rs ────► Calls into lib.rs                                 │  │
//! │  │  lib.rs ─────► Logging, config, database, state, commands        │  │
//! │  │  commands/ ──► load_items, update_sku, stage_transaction, ...    │  │
//! │  │  state/ ─────► DbState, EditorState, SessionState, ConfigState   │  │
//! │  │                                                                  │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                 │                                       │
//! │                                 ▼                                       │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                         SQLite Database                          │  │
//! │  │  stockdesk.db (local file, WAL mode)                             │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

// Prevents an additional console window on Windows in release
#![cfg_attr(
    all(not(debug_assertions), target_os = "windows"),
    windows_subsystem = "windows"
)]

fn main() {
    // The actual setup is in lib.rs for better testability
    stockdesk_desktop_lib::run();
}
