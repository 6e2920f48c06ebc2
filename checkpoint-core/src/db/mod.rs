//! SQLite-backed storage for checkpoint aggregates.

mod checkpoints;
mod schema;

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;

use crate::config::Config;
use crate::error::{CheckpointError, Result};

pub use schema::SCHEMA;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the checkpoint database.
///
/// Cloning is cheap; clones share one connection. Every operation runs inside
/// its own transaction, so concurrent callers are serialized by SQLite's
/// locking and never observe a half-written aggregate.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database file at `path`, creating its parent
    /// directory if needed. Call [`Database::migrate`] before use.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        tracing::debug!("Opening checkpoint database at {}", path.display());
        Self::from_connection(Connection::open(path)?)
    }

    /// Open the database configured by the environment.
    pub fn open_default() -> Result<Self> {
        Self::open(Config::from_env().db_path)
    }

    /// Open a private in-memory database (for testing).
    pub fn open_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create every table and index that does not exist yet. Safe to call
    /// repeatedly.
    pub fn migrate(&self) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })?;
        tracing::debug!("Checkpoint schema is up to date");
        Ok(())
    }

    /// Run `f` with exclusive access to the connection.
    pub fn with_connection<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        // A panic mid-operation drops its transaction, which rolls back.
        let mut conn = self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut conn)
    }
}

/// Fixed-width UTC timestamp, so text order equals time order.
pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CheckpointError::Timestamp(format!("{s}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrate_is_idempotent() {
        let db = Database::open_memory().unwrap();
        db.migrate().unwrap();
        db.migrate().unwrap();

        let tables: i64 = db
            .with_connection(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN
                     ('checkpoints', 'todos', 'file_modifications', 'key_decisions', 'artifacts')",
                    [],
                    |row| row.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(tables, 5);
    }

    #[test]
    fn foreign_keys_are_enforced() {
        let db = Database::open_memory().unwrap();
        db.migrate().unwrap();

        let enabled: bool = db
            .with_connection(|conn| Ok(conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))?))
            .unwrap();
        assert!(enabled);

        let orphan = db.with_connection(|conn| {
            conn.execute(
                "INSERT INTO todos (checkpoint_id, content, active_form, status, order_index)
                 VALUES (999, 'x', 'x', 'pending', 0)",
                [],
            )?;
            Ok(())
        });
        assert!(matches!(orphan, Err(CheckpointError::Backend(_))));
    }

    #[test]
    fn open_creates_parent_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("checkpoints.db");

        let db = Database::open(&path).unwrap();
        db.migrate().unwrap();

        assert!(path.exists());
    }

    #[test]
    fn timestamps_round_trip_and_sort_as_text() {
        let earlier = parse_timestamp("2026-01-02T03:04:05.000001Z").unwrap();
        let later = parse_timestamp("2026-01-02T03:04:05.100000Z").unwrap();

        assert!(format_timestamp(earlier) < format_timestamp(later));
        assert_eq!(format_timestamp(earlier), "2026-01-02T03:04:05.000001Z");
        assert!(parse_timestamp("yesterday").is_err());
    }
}
