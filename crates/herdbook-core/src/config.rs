//! Runtime configuration.
//!
//! Values come from environment variables (see the constants below) or a
//! JSON document; anything absent falls back to the defaults.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Path of the SQLite database file.
pub const HERDBOOK_DB_PATH: &str = "HERDBOOK_DB_PATH";
/// `tracing` filter directive (e.g. `info`, `herdbook_core=debug`).
pub const HERDBOOK_LOG: &str = "HERDBOOK_LOG";
/// Days ahead the dashboard lists health repeats.
pub const HERDBOOK_HEALTH_WINDOW_DAYS: &str = "HERDBOOK_HEALTH_WINDOW_DAYS";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HerdbookConfig {
    pub database_path: String,
    pub log_filter: String,
    pub health_reminder_window_days: u32,
}

impl Default for HerdbookConfig {
    fn default() -> Self {
        Self {
            database_path: "herdbook.sqlite3".to_string(),
            log_filter: "info".to_string(),
            health_reminder_window_days: 7,
        }
    }
}

impl HerdbookConfig {
    /// Load from the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any key lookup (used by `from_env` and tests).
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = non_blank(lookup(HERDBOOK_DB_PATH)) {
            config.database_path = path;
        }
        if let Some(filter) = non_blank(lookup(HERDBOOK_LOG)) {
            config.log_filter = filter;
        }
        if let Some(raw) = non_blank(lookup(HERDBOOK_HEALTH_WINDOW_DAYS)) {
            config.health_reminder_window_days =
                raw.parse().map_err(|_| ConfigError::InvalidValue {
                    key: HERDBOOK_HEALTH_WINDOW_DAYS,
                    value: raw.clone(),
                })?;
        }
        Ok(config)
    }

    /// Parse a JSON document; missing keys take their defaults.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = HerdbookConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, HerdbookConfig::default());
        assert_eq!(config.health_reminder_window_days, 7);
    }

    #[test]
    fn test_env_overrides() {
        let config = HerdbookConfig::from_lookup(lookup_from(&[
            (HERDBOOK_DB_PATH, "/var/lib/herd.db"),
            (HERDBOOK_LOG, "herdbook_core=debug"),
            (HERDBOOK_HEALTH_WINDOW_DAYS, "14"),
        ]))
        .unwrap();
        assert_eq!(config.database_path, "/var/lib/herd.db");
        assert_eq!(config.log_filter, "herdbook_core=debug");
        assert_eq!(config.health_reminder_window_days, 14);
    }

    #[test]
    fn test_blank_values_ignored() {
        let config =
            HerdbookConfig::from_lookup(lookup_from(&[(HERDBOOK_DB_PATH, "  ")])).unwrap();
        assert_eq!(config.database_path, "herdbook.sqlite3");
    }

    #[test]
    fn test_invalid_window() {
        let result =
            HerdbookConfig::from_lookup(lookup_from(&[(HERDBOOK_HEALTH_WINDOW_DAYS, "soon")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { key: HERDBOOK_HEALTH_WINDOW_DAYS, .. })
        ));
    }

    #[test]
    fn test_json_partial() {
        let config = HerdbookConfig::from_json_str(r#"{"database_path": "farm.db"}"#).unwrap();
        assert_eq!(config.database_path, "farm.db");
        assert_eq!(config.log_filter, "info");
    }
}
