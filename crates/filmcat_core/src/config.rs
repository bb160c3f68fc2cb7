//! Runtime configuration resolved from `FILMCAT_*` environment variables.
//!
//! | variable            | values               | default                      |
//! |---------------------|----------------------|------------------------------|
//! | `FILMCAT_BACKEND`   | `memory` \| `sqlite` | `sqlite`                     |
//! | `FILMCAT_DB_PATH`   | file path            | `<temp dir>/filmcat.sqlite3` |
//! | `FILMCAT_LOG_LEVEL` | log level name       | per build mode               |
//! | `FILMCAT_LOG_DIR`   | absolute directory   | unset: log to stderr         |

use crate::logging::{default_log_level, LoggingConfig};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

pub const BACKEND_VAR: &str = "FILMCAT_BACKEND";
pub const DB_PATH_VAR: &str = "FILMCAT_DB_PATH";
pub const LOG_LEVEL_VAR: &str = "FILMCAT_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "FILMCAT_LOG_DIR";

const DEFAULT_DB_FILE: &str = "filmcat.sqlite3";

/// Storage backend selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    Memory,
    #[default]
    Sqlite,
}

impl StorageBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Sqlite => "sqlite",
        }
    }
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "in_memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            _ => Err(ConfigError::InvalidValue {
                var: BACKEND_VAR,
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { var: &'static str, value: String },
    Empty(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { var, value } => write!(f, "invalid value `{value}` for {var}"),
            Self::Empty(var) => write!(f, "{var} is set but empty"),
        }
    }
}

impl Error for ConfigError {}

/// Resolved catalog settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub backend: StorageBackend,
    pub db_path: PathBuf,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CatalogConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves settings through `lookup`, falling back to defaults for unset names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(BACKEND_VAR) {
            config.backend = value.parse()?;
        }
        if let Some(value) = lookup(DB_PATH_VAR) {
            config.db_path = PathBuf::from(non_empty(DB_PATH_VAR, &value)?);
        }
        if let Some(value) = lookup(LOG_LEVEL_VAR) {
            config.log_level = non_empty(LOG_LEVEL_VAR, &value)?.to_string();
        }
        if let Some(value) = lookup(LOG_DIR_VAR) {
            let dir = PathBuf::from(non_empty(LOG_DIR_VAR, &value)?);
            if !dir.is_absolute() {
                return Err(ConfigError::InvalidValue {
                    var: LOG_DIR_VAR,
                    value,
                });
            }
            config.log_dir = Some(dir);
        }

        Ok(config)
    }

    pub fn logging(&self) -> LoggingConfig {
        match &self.log_dir {
            Some(dir) => LoggingConfig::directory(self.log_level.clone(), dir.clone()),
            None => LoggingConfig::stderr(self.log_level.clone()),
        }
    }
}

fn non_empty<'a>(var: &'static str, value: &'a str) -> Result<&'a str, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Empty(var));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::{CatalogConfig, ConfigError, StorageBackend, BACKEND_VAR, LOG_DIR_VAR};
    use crate::logging::LogTarget;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn unset_variables_fall_back_to_defaults() {
        let config = CatalogConfig::from_lookup(lookup_from(&[])).expect("defaults resolve");
        assert_eq!(config.backend, StorageBackend::Sqlite);
        assert!(config.db_path.ends_with("filmcat.sqlite3"));
        assert_eq!(config.log_dir, None);
        assert_eq!(config.logging().target, LogTarget::Stderr);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = CatalogConfig::from_lookup(lookup_from(&[
            ("FILMCAT_BACKEND", " Memory "),
            ("FILMCAT_DB_PATH", "/var/lib/filmcat/db.sqlite3"),
            ("FILMCAT_LOG_LEVEL", "warn"),
            ("FILMCAT_LOG_DIR", "/var/log/filmcat"),
        ]))
        .expect("valid config");

        assert_eq!(config.backend, StorageBackend::Memory);
        assert_eq!(config.db_path, PathBuf::from("/var/lib/filmcat/db.sqlite3"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(
            config.logging().target,
            LogTarget::Directory(PathBuf::from("/var/log/filmcat"))
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        let backend = CatalogConfig::from_lookup(lookup_from(&[(BACKEND_VAR, "postgres")]))
            .expect_err("unknown backend");
        assert_eq!(
            backend,
            ConfigError::InvalidValue {
                var: BACKEND_VAR,
                value: "postgres".to_string()
            }
        );

        let dir = CatalogConfig::from_lookup(lookup_from(&[(LOG_DIR_VAR, "logs")]))
            .expect_err("relative log dir");
        assert!(matches!(dir, ConfigError::InvalidValue { var: LOG_DIR_VAR, .. }));

        let empty = CatalogConfig::from_lookup(lookup_from(&[("FILMCAT_DB_PATH", "  ")]))
            .expect_err("empty path");
        assert_eq!(empty, ConfigError::Empty("FILMCAT_DB_PATH"));
    }
}
