//! # State Module
//!
//! Manages application state for the Tauri desktop app.
//!
//! ## Why Multiple State Types?
//! Instead of a single `AppState` struct containing everything,
//! we use separate state types. This approach:
//!
//! 1. **Better Separation of Concerns**: Each state type has a single responsibility
//! 2. **Easier Testing**: Can mock/inject individual states
//! 3. **Clearer Command Signatures**: Commands declare exactly what state they need
//! 4. **Reduced Contention**: Independent states don't block each other
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                      Tauri Runtime                              │   │
//! │  │  app.manage(db_state);                                          │   │
//! │  │  app.manage(editor_state);                                      │   │
//! │  │  app.manage(session_state);                                     │   │
//! │  │  app.manage(config_state);                                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                              │                                          │
//! │      ┌───────────────┬──────┴────────┬─────────────────┐               │
//! │      ▼               ▼               ▼                 ▼               │
//! │  ┌──────────┐  ┌─────────────┐  ┌──────────────┐  ┌────────────┐       │
//! │  │ DbState  │  │ EditorState │  │ SessionState │  │ConfigState │       │
//! │  │          │  │             │  │              │  │            │       │
//! │  │ SQLite   │  │ SheetEditor │  │ logged-in    │  │ admin group│       │
//! │  │ pool     │  │ per table,  │  │ user +       │  │ fetch caps │       │
//! │  │          │  │ Mutex-ed    │  │ privilege    │  │ db path    │       │
//! │  └──────────┘  └─────────────┘  └──────────────┘  └────────────┘       │
//! │                                                                         │
//! │  THREAD SAFETY:                                                         │
//! │  • DbState: pool is internally thread-safe                              │
//! │  • EditorState/SessionState: Mutex-protected, commands take turns       │
//! │  • ConfigState: read-only after initialization                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;
mod editor;
mod session;

pub use config::{ConfigError, ConfigState};
pub use db::DbState;
pub use editor::{EditorState, TransactionViewState};
pub use session::{CurrentUser, SessionState};
