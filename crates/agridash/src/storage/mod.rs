//! Storage layer for agridash.
//!
//! This module provides `SQLite`-based persistent storage for observations.
//! [`Storage`] is the synchronous engine; [`SqliteStore`] shares it with the
//! async HTTP layer through the [`RecordStore`] trait.

pub mod migrations;
pub mod schema;
mod store;

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::observation::{NewObservation, Observation};

pub use store::{RecordStore, SqliteStore};

const SELECT_COLUMNS: &str =
    "SELECT id, soil_type, irrigation_method, seed_type, fertilizer_used, created_at FROM observations";

/// Storage engine for observations.
///
/// Records are append-only. Ids come from `SQLite`'s `AUTOINCREMENT`, so they
/// are never reused, and `created_at` never goes backwards across inserts.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        // WAL lets the listing endpoint read while an insert is in flight
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist a new observation and return it with its id and timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if a field is empty, or a storage error
    /// if the database operation fails.
    pub fn insert(&self, new: &NewObservation) -> Result<Observation> {
        new.validate()?;

        let now = truncate_to_millis(Utc::now());
        let created_at = match self.latest_created_at()? {
            Some(latest) if latest > now => latest,
            _ => now,
        };

        self.conn.execute(
            r"
            INSERT INTO observations (soil_type, irrigation_method, seed_type, fertilizer_used, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
            params![
                new.soil_type,
                new.irrigation_method,
                new.seed_type,
                new.fertilizer_used,
                format_timestamp(created_at),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!(id, "Inserted observation");
        Ok(Observation::from_new(id, new.clone(), created_at))
    }

    /// Get every observation in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_all(&self) -> Result<Vec<Observation>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_COLUMNS} ORDER BY id ASC"))?;
        let observations = stmt
            .query_map([], Self::row_to_observation)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(observations)
    }

    /// Get an observation by its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get(&self, id: i64) -> Result<Option<Observation>> {
        let result = self
            .conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                [id],
                Self::row_to_observation,
            )
            .optional()?;
        Ok(result)
    }

    /// Count stored observations.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM observations", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let total_observations = self.count()?;

        let oldest: Option<String> = self.conn.query_row(
            "SELECT MIN(created_at) FROM observations",
            [],
            |row| row.get(0),
        )?;
        let newest: Option<String> = self.conn.query_row(
            "SELECT MAX(created_at) FROM observations",
            [],
            |row| row.get(0),
        )?;

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            total_observations,
            oldest_observation: oldest.as_deref().and_then(parse_timestamp),
            newest_observation: newest.as_deref().and_then(parse_timestamp),
            db_size_bytes,
        })
    }

    fn latest_created_at(&self) -> Result<Option<DateTime<Utc>>> {
        let latest: Option<String> = self.conn.query_row(
            "SELECT MAX(created_at) FROM observations",
            [],
            |row| row.get(0),
        )?;
        Ok(latest.as_deref().and_then(parse_timestamp))
    }

    fn row_to_observation(row: &rusqlite::Row) -> rusqlite::Result<Observation> {
        let created_at_str: String = row.get(5)?;
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    5,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;

        Ok(Observation {
            id: row.get(0)?,
            soil_type: row.get(1)?,
            irrigation_method: row.get(2)?,
            seed_type: row.get(3)?,
            fertilizer_used: row.get(4)?,
            created_at,
        })
    }
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Total number of observations stored.
    pub total_observations: i64,
    /// Creation time of the oldest observation.
    pub oldest_observation: Option<DateTime<Utc>>,
    /// Creation time of the newest observation.
    pub newest_observation: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

// Fixed-width millisecond timestamps sort lexicographically in the same
// order as chronologically, which `MAX(created_at)` relies on.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn truncate_to_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ts.timestamp_millis()).unwrap_or(ts)
}
