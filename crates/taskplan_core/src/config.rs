//! Process configuration loaded from environment variables.
//!
//! # Responsibility
//! - Resolve database path, logging options and list limit.
//! - Reject malformed values with a descriptive error instead of guessing.
//!
//! # Invariants
//! - `list_limit` is always within `1..=MAX_LIST_LIMIT`.
//! - `log_dir`, when set, is an absolute path.

use crate::logging::default_log_level;
use crate::repo::task_repo::DEFAULT_LIST_LIMIT;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DB_FILE_VAR: &str = "TASKPLAN_DB_FILE";
/// Older variable name still honored when the prefixed one is unset.
pub const LEGACY_DB_FILE_VAR: &str = "DB_FILE";
pub const LOG_DIR_VAR: &str = "TASKPLAN_LOG_DIR";
pub const LOG_LEVEL_VAR: &str = "TASKPLAN_LOG_LEVEL";
pub const LIST_LIMIT_VAR: &str = "TASKPLAN_LIST_LIMIT";

pub const DEFAULT_DB_FILE: &str = "scheduler.db";
pub const MAX_LIST_LIMIT: u32 = 500;

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub var: &'static str,
    pub message: String,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {}: {}", self.var, self.message)
    }
}

impl Error for ConfigError {}

/// Resolved process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_file: PathBuf,
    pub log_dir: Option<PathBuf>,
    pub log_level: String,
    pub list_limit: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_file: PathBuf::from(DEFAULT_DB_FILE),
            log_dir: None,
            log_level: default_log_level().to_string(),
            list_limit: DEFAULT_LIST_LIMIT,
        }
    }
}

impl AppConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(db_file) = get(DB_FILE_VAR).or_else(|| get(LEGACY_DB_FILE_VAR)) {
            config.db_file = PathBuf::from(db_file);
        }

        if let Some(log_dir) = get(LOG_DIR_VAR) {
            if !Path::new(&log_dir).is_absolute() {
                return Err(ConfigError {
                    var: LOG_DIR_VAR,
                    message: format!("must be an absolute path, got `{log_dir}`"),
                });
            }
            config.log_dir = Some(PathBuf::from(log_dir));
        }

        if let Some(level) = get(LOG_LEVEL_VAR) {
            config.log_level = level;
        }

        if let Some(raw) = get(LIST_LIMIT_VAR) {
            config.list_limit = parse_list_limit(&raw)?;
        }

        Ok(config)
    }
}

fn parse_list_limit(raw: &str) -> Result<u32, ConfigError> {
    let error = || ConfigError {
        var: LIST_LIMIT_VAR,
        message: format!("expected an integer in 1..={MAX_LIST_LIMIT}, got `{raw}`"),
    };
    let value = raw.parse::<u32>().map_err(|_| error())?;
    if value == 0 || value > MAX_LIST_LIMIT {
        return Err(error());
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, DEFAULT_DB_FILE, LIST_LIMIT_VAR, LOG_DIR_VAR};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, super::ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = load(&[]).unwrap();
        assert_eq!(config.db_file, PathBuf::from(DEFAULT_DB_FILE));
        assert_eq!(config.log_dir, None);
        assert_eq!(config.list_limit, 50);
    }

    #[test]
    fn prefixed_db_file_wins_over_legacy_name() {
        let config = load(&[("DB_FILE", "old.db"), ("TASKPLAN_DB_FILE", "new.db")]).unwrap();
        assert_eq!(config.db_file, PathBuf::from("new.db"));

        let legacy = load(&[("DB_FILE", "old.db"), ("TASKPLAN_DB_FILE", "  ")]).unwrap();
        assert_eq!(legacy.db_file, PathBuf::from("old.db"));
    }

    #[test]
    fn relative_log_dir_is_rejected() {
        let err = load(&[("TASKPLAN_LOG_DIR", "logs")]).unwrap_err();
        assert_eq!(err.var, LOG_DIR_VAR);
    }

    #[test]
    fn list_limit_must_be_in_range() {
        assert_eq!(
            load(&[("TASKPLAN_LIST_LIMIT", "20")]).unwrap().list_limit,
            20
        );
        for bad in ["0", "501", "ten"] {
            let err = load(&[("TASKPLAN_LIST_LIMIT", bad)]).unwrap_err();
            assert_eq!(err.var, LIST_LIMIT_VAR);
        }
    }
}
