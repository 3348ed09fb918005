//! Configuration file handling.
//!
//! Settings are read from a `.schemagen.json` file. Every field is optional;
//! command-line flags override what the file says, and a missing file means
//! defaults.
//!
//! ```json
//! {
//!   "dialect": "prisma",
//!   "sql_flavor": "mysql",
//!   "version": "2024_06_01",
//!   "log_level": "debug"
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::{Dialect, DialectOptions, SqlFlavor};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".schemagen.json";

const DEFAULT_VERSION: &str = "v1";
const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Contents of `.schemagen.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub dialect: Option<Dialect>,
    #[serde(default)]
    pub sql_flavor: Option<SqlFlavor>,
    /// Migration version used when `migrate` is run without `--version`
    #[serde(default)]
    pub version: Option<String>,
    /// Log filter used when neither `SCHEMAGEN_LOG` nor `RUST_LOG` is set
    #[serde(default)]
    pub log_level: Option<String>,
}

impl Config {
    /// Load an explicitly named configuration file. The file must exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `.schemagen.json` from `dir`, or defaults if there is none.
    pub fn discover(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolve the configuration for a run: the explicit file when given,
    /// otherwise the one in the working directory.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
                Self::discover(&cwd)
            }
        }
    }

    pub fn dialect_or(&self, flag: Option<Dialect>) -> Dialect {
        flag.or(self.dialect).unwrap_or_default()
    }

    pub fn options_or(&self, flag: Option<SqlFlavor>) -> DialectOptions {
        DialectOptions::with_flavor(flag.or(self.sql_flavor).unwrap_or_default())
    }

    pub fn version_or(&self, flag: Option<String>) -> String {
        flag.or_else(|| self.version.clone())
            .unwrap_or_else(|| DEFAULT_VERSION.to_string())
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_full_deserialization() {
        let json = r#"
        {
            "dialect": "seaorm",
            "sql_flavor": "mysql",
            "version": "2024_06_01",
            "log_level": "debug"
        }
        "#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.dialect, Some(Dialect::SeaOrm));
        assert_eq!(config.sql_flavor, Some(SqlFlavor::MySql));
        assert_eq!(config.version.as_deref(), Some("2024_06_01"));
        assert_eq!(config.log_level(), "debug");
    }

    #[rstest]
    fn test_empty_object_means_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.dialect_or(None), Dialect::Sql);
        assert_eq!(config.options_or(None).sql_flavor, SqlFlavor::Postgres);
        assert_eq!(config.version_or(None), "v1");
        assert_eq!(config.log_level(), "warn");
    }

    #[rstest]
    fn test_flags_override_file() {
        let config = Config {
            dialect: Some(Dialect::Prisma),
            sql_flavor: Some(SqlFlavor::MySql),
            version: Some("from_file".to_string()),
            log_level: None,
        };
        assert_eq!(config.dialect_or(Some(Dialect::Document)), Dialect::Document);
        assert_eq!(config.dialect_or(None), Dialect::Prisma);
        assert_eq!(
            config.options_or(Some(SqlFlavor::Postgres)).sql_flavor,
            SqlFlavor::Postgres
        );
        assert_eq!(config.version_or(Some("cli".to_string())), "cli");
        assert_eq!(config.version_or(None), "from_file");
    }

    #[rstest]
    fn test_unknown_dialect_is_rejected() {
        let err = serde_json::from_str::<Config>(r#"{"dialect": "mongo"}"#).unwrap_err();
        assert!(err.to_string().contains("Unknown dialect 'mongo'"));
    }

    #[rstest]
    fn test_unknown_field_is_rejected() {
        assert!(serde_json::from_str::<Config>(r#"{"dialects": "sql"}"#).is_err());
    }

    #[rstest]
    fn test_discover_without_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[rstest]
    fn test_discover_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), r#"{"dialect": "document"}"#).unwrap();
        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.dialect, Some(Dialect::Document));
    }

    #[rstest]
    fn test_load_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
        assert!(err.to_string().contains("not found"));
    }

    #[rstest]
    fn test_load_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "{ invalid json }").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
