//! # Configuration State
//!
//! Application configuration loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`STOCKDESK_*`), with `.env` honored
//! 2. Key=value config file (`stockdesk.conf`)
//! 3. Defaults (this file)
//!
//! The config file format is deliberately simple: one `key=value` per line,
//! `#` starts a comment, blank lines are ignored.
//!
//! ## Thread Safety
//! Configuration is read-only after initialization, so no mutex needed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Name of the optional config file looked up in the working directory.
pub const CONFIG_FILE: &str = "stockdesk.conf";

/// Application configuration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigState {
    /// Database file path override. When unset, the platform data
    /// directory is used.
    pub db_path: Option<PathBuf>,

    /// User names granted admin privilege.
    pub admin_group: Vec<String>,

    /// Cap on how many transactions the history view will fetch in total
    /// (across `load_more` pages).
    pub max_transaction_count: i64,

    /// Default minimum quantity for newly created SKUs.
    pub default_min_qty: i64,
}

impl Default for ConfigState {
    fn default() -> Self {
        ConfigState {
            db_path: None,
            admin_group: vec!["admin".to_string()],
            max_transaction_count: 100,
            default_min_qty: stockdesk_core::DEFAULT_MIN_QTY,
        }
    }
}

impl ConfigState {
    /// Loads configuration: defaults, then the config file (if present),
    /// then environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        // A .env next to the binary is a development convenience; a missing
        // file is not an error.
        dotenvy::dotenv().ok();

        let mut config = ConfigState::default();

        if Path::new(CONFIG_FILE).exists() {
            let text = std::fs::read_to_string(CONFIG_FILE)
                .map_err(|e| ConfigError::Io(format!("{CONFIG_FILE}: {e}")))?;
            config.apply_options(&parse_key_values(&text))?;
        }

        config.apply_env()?;
        Ok(config)
    }

    fn apply_options(&mut self, options: &HashMap<String, String>) -> Result<(), ConfigError> {
        if let Some(path) = options.get("db_path") {
            self.db_path = Some(PathBuf::from(path));
        }
        if let Some(group) = options.get("admin_group") {
            self.admin_group = split_group(group);
        }
        if let Some(count) = options.get("max_transaction_count") {
            self.max_transaction_count = count
                .parse()
                .map_err(|_| ConfigError::InvalidValue("max_transaction_count".to_string()))?;
        }
        if let Some(qty) = options.get("default_min_qty") {
            self.default_min_qty = qty
                .parse()
                .map_err(|_| ConfigError::InvalidValue("default_min_qty".to_string()))?;
        }
        Ok(())
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(path) = std::env::var("STOCKDESK_DB_PATH") {
            self.db_path = Some(PathBuf::from(path));
        }
        if let Ok(group) = std::env::var("STOCKDESK_ADMIN_GROUP") {
            self.admin_group = split_group(&group);
        }
        if let Ok(count) = std::env::var("STOCKDESK_MAX_TRANSACTION_COUNT") {
            self.max_transaction_count = count
                .parse()
                .map_err(|_| ConfigError::InvalidValue("STOCKDESK_MAX_TRANSACTION_COUNT".to_string()))?;
        }
        if let Ok(qty) = std::env::var("STOCKDESK_DEFAULT_MIN_QTY") {
            self.default_min_qty = qty
                .parse()
                .map_err(|_| ConfigError::InvalidValue("STOCKDESK_DEFAULT_MIN_QTY".to_string()))?;
        }
        Ok(())
    }
}

/// Parses `key=value` lines, skipping comments and blanks.
fn parse_key_values(text: &str) -> HashMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            line.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        })
        .collect()
}

fn split_group(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Could not read config file: {0}")]
    Io(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_values_skips_comments_and_blanks() {
        let text = "\
# StockDesk config
admin_group = admin, jay

max_transaction_count=50
  # trailing comment line
db_path=./data/stockdesk.db
";
        let options = parse_key_values(text);
        assert_eq!(options.get("admin_group").unwrap(), "admin, jay");
        assert_eq!(options.get("max_transaction_count").unwrap(), "50");
        assert_eq!(options.get("db_path").unwrap(), "./data/stockdesk.db");
        assert_eq!(options.len(), 3);
    }

    #[test]
    fn test_apply_options() {
        let mut config = ConfigState::default();
        let options = parse_key_values("admin_group=root,ops\nmax_transaction_count=25");
        config.apply_options(&options).unwrap();

        assert_eq!(config.admin_group, vec!["root", "ops"]);
        assert_eq!(config.max_transaction_count, 25);
        // Untouched keys keep their defaults
        assert_eq!(config.default_min_qty, stockdesk_core::DEFAULT_MIN_QTY);
    }

    #[test]
    fn test_invalid_numeric_value_is_an_error() {
        let mut config = ConfigState::default();
        let options = parse_key_values("max_transaction_count=lots");
        assert!(matches!(
            config.apply_options(&options),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_defaults() {
        let config = ConfigState::default();
        assert_eq!(config.admin_group, vec!["admin"]);
        assert_eq!(config.max_transaction_count, 100);
        assert!(config.db_path.is_none());
    }
}
