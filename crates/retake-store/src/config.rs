//! Repository configuration, loaded from RON.
//!
//! Lookup order for the file: explicit path, then `RETAKE_CONFIG`, then
//! `<config dir>/retake/retake.ron`. A missing file means defaults. After
//! loading, `RETAKE_DB` overrides the database path.
//!
//! ```ron
//! (
//!     database_path: "/var/lib/retake/retake.db",
//!     keep_history: true,
//!     limits: (name_max: 100, description_max: 1000, project_name_max: 32),
//! )
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::input::FieldLimits;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "RETAKE_CONFIG";

/// Environment variable overriding the database path.
pub const DATABASE_ENV: &str = "RETAKE_DB";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database file.
    pub database_path: PathBuf,
    /// Append a snapshot row per write instead of overwriting the current one.
    pub keep_history: bool,
    pub limits: FieldLimits,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            keep_history: false,
            limits: FieldLimits::default(),
        }
    }
}

impl StoreConfig {
    pub fn from_ron(content: &str) -> Result<Self> {
        Ok(ron::from_str(content)?)
    }

    pub fn to_ron(&self) -> Result<String> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    /// Read a config file. The file must exist.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_ron(&content)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Read a config file if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Resolve the config file location and environment overrides.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let config = match config_file_path(explicit, env_path) {
            Some(path) => Self::load_or_default(&path)?,
            None => Self::default(),
        };
        let env_db = std::env::var_os(DATABASE_ENV).map(PathBuf::from);
        Ok(config.with_database_override(env_db))
    }

    /// Replace the database path when an override is given.
    pub fn with_database_override(mut self, database_path: Option<PathBuf>) -> Self {
        if let Some(path) = database_path {
            self.database_path = path;
        }
        self
    }
}

/// Which config file to read: explicit, then environment, then platform default.
fn config_file_path(explicit: Option<&Path>, env_path: Option<PathBuf>) -> Option<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or(env_path)
        .or_else(default_config_path)
}

/// `<config dir>/retake/retake.ron`, when the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("retake").join("retake.ron"))
}

/// `<data dir>/retake/retake.db`, falling back to the working directory.
pub fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("retake")
        .join("retake.db")
}
