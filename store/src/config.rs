//! Store configuration.
//!
//! Read from the `[store]` table of `~/.grantstate/config.toml`:
//!
//! ```toml
//! [store]
//! backend = "sqlite"
//! path = "~/.grantstate/authorizations.db"
//! max_initialized = 100
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::AuthorizationStore;
use crate::memory::{DEFAULT_MAX_INITIALIZED, InMemoryAuthorizationStore};
use crate::sqlite::SqliteAuthorizationStore;

const fn default_max_initialized() -> usize {
    DEFAULT_MAX_INITIALIZED
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Sqlite,
}

/// `[store]` section of the grantstate configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Database file for the SQLite backend. `~` expands to the home directory.
    pub path: Option<PathBuf>,
    /// Bound on pending authorizations held by the in-memory backend.
    #[serde(default = "default_max_initialized")]
    pub max_initialized: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: None,
            max_initialized: DEFAULT_MAX_INITIALIZED,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    store: StoreConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

impl StoreConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        let file: ConfigFile = toml::from_str(content)?;
        Ok(file.store)
    }

    /// Load the `[store]` section from `path`. A missing file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read { path, source: err });
            }
        };

        match Self::from_toml_str(&content) {
            Ok(config) => Ok(config),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse { path, source: err })
            }
        }
    }

    /// Database location for the SQLite backend, with `~` expanded.
    #[must_use]
    pub fn database_path(&self) -> Option<PathBuf> {
        match &self.path {
            Some(path) => expand_home(path),
            None => default_database_path(),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Memory => f.write_str("memory"),
            StoreBackend::Sqlite => f.write_str("sqlite"),
        }
    }
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".grantstate").join("config.toml"))
}

#[must_use]
pub fn default_database_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".grantstate").join("authorizations.db"))
}

fn expand_home(path: &Path) -> Option<PathBuf> {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir().map(|home| home.join(rest)),
        Err(_) => Some(path.to_path_buf()),
    }
}

/// Open the store selected by `config`.
pub fn open_store(config: &StoreConfig) -> Result<Box<dyn AuthorizationStore>> {
    tracing::debug!(backend = %config.backend, "Opening authorization store");
    match config.backend {
        StoreBackend::Memory => Ok(Box::new(InMemoryAuthorizationStore::new(
            config.max_initialized,
        ))),
        StoreBackend::Sqlite => {
            let path = config
                .database_path()
                .context("Could not determine authorization database path")?;
            Ok(Box::new(SqliteAuthorizationStore::open(path)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::{
        ConfigError, StoreBackend, StoreConfig, config_path, default_database_path, open_store,
    };

    #[test]
    fn parses_sqlite_backend() {
        let config = StoreConfig::from_toml_str(
            r#"
            [store]
            backend = "sqlite"
            path = "/var/lib/grantstate/auth.db"
            max_initialized = 7
            "#,
        )
        .unwrap();
        assert_eq!(config.backend, StoreBackend::Sqlite);
        assert_eq!(
            config.database_path(),
            Some(PathBuf::from("/var/lib/grantstate/auth.db"))
        );
        assert_eq!(config.max_initialized, 7);
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config = StoreConfig::from_toml_str("").unwrap();
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.backend, StoreBackend::Memory);
        assert_eq!(config.max_initialized, 100);
    }

    #[test]
    fn unknown_backend_is_rejected() {
        assert!(StoreConfig::from_toml_str("[store]\nbackend = \"redis\"").is_err());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, StoreConfig::default());
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[store\nbackend = ").unwrap();

        let err = StoreConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert_eq!(err.path(), path.as_path());
    }

    #[test]
    fn tilde_expands_to_home() {
        let config = StoreConfig {
            path: Some(PathBuf::from("~/state/auth.db")),
            ..StoreConfig::default()
        };
        if let Some(home) = dirs::home_dir() {
            assert_eq!(config.database_path(), Some(home.join("state/auth.db")));
            assert_eq!(StoreConfig::default().database_path(), default_database_path());
            assert!(config_path().unwrap().starts_with(&home));
        }
    }

    #[test]
    fn opens_configured_backend() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            backend: StoreBackend::Sqlite,
            path: Some(dir.path().join("auth.db")),
            max_initialized: 5,
        };
        let store = open_store(&config).unwrap();
        assert!(store.find_by_id("nothing").unwrap().is_none());
        assert!(dir.path().join("auth.db").exists());

        let memory = open_store(&StoreConfig::default()).unwrap();
        assert!(memory.find_by_id("nothing").unwrap().is_none());
    }
}
