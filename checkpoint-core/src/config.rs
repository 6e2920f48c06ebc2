//! Runtime configuration resolved from the environment.

use std::path::PathBuf;

use directories::ProjectDirs;

/// Environment variable that overrides the database location.
pub const DB_PATH_ENV: &str = "CHECKPOINT_DB_PATH";

const DB_FILE_NAME: &str = "checkpoints.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
}

impl Config {
    /// Resolve configuration from `CHECKPOINT_DB_PATH`, falling back to the
    /// per-user data directory.
    pub fn from_env() -> Self {
        Self::from_override(std::env::var(DB_PATH_ENV).ok())
    }

    fn from_override(db_path: Option<String>) -> Self {
        let db_path = db_path
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_db_path);
        Self { db_path }
    }

    pub fn with_db_path(mut self, db_path: impl Into<PathBuf>) -> Self {
        self.db_path = db_path.into();
        self
    }
}

/// Default database path: `<data dir>/checkpoint-manager/checkpoints.db`.
pub fn default_db_path() -> PathBuf {
    ProjectDirs::from("", "", "checkpoint-manager")
        .map(|dirs| dirs.data_dir().join(DB_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(DB_FILE_NAME))
}
