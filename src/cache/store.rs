//! SQLite-backed persistence for hash records.
//!
//! One table, keyed by fingerprint. Records are serialized as JSON so that
//! a damaged row degrades to a cache miss instead of an error; SQLite's
//! transactional upsert makes concurrent duplicate computation benign (both
//! writers store the same content-addressed value).

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension};

use super::record::HashRecord;

/// Errors from the persistent store itself.
///
/// Only [`HashStore::open`] failures should be treated as fatal; read and
/// write errors at runtime degrade to recomputation.
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    /// The cache directory could not be created.
    #[error("failed to create cache directory {path}: {source}")]
    CreateDir {
        /// Directory that failed to create
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The database could not be opened or queried.
    #[error("cache database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A record failed to serialize.
    #[error("cache serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Durable fingerprint-to-record store.
pub struct HashStore {
    conn: Mutex<Connection>,
}

impl HashStore {
    /// Open (or create) the store at `path`, creating parent directories.
    ///
    /// This is the one cache operation whose failure is fatal: a process
    /// that cannot create its store should not start.
    pub fn open(path: &Path) -> Result<Self, CacheError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| CacheError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS hash_records (
                fingerprint TEXT PRIMARY KEY,
                record      TEXT NOT NULL,
                created_at  INTEGER NOT NULL
            )",
            [],
        )?;
        log::debug!("hash cache store opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// An in-memory store, for tests and cache-less operation.
    pub fn open_in_memory() -> Result<Self, CacheError> {
        let conn = Connection::open_in_memory()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS hash_records (
                fingerprint TEXT PRIMARY KEY,
                record      TEXT NOT NULL,
                created_at  INTEGER NOT NULL
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Fetch a record by fingerprint.
    ///
    /// Any unreadable or unparseable row is reported as a miss; corruption
    /// is recovered by recomputation, never surfaced.
    pub fn get(&self, fingerprint: &str) -> Option<HashRecord> {
        let conn = match self.conn.lock() {
            Ok(c) => c,
            Err(poisoned) => poisoned.into_inner(),
        };

        let row: Option<String> = match conn
            .query_row(
                "SELECT record FROM hash_records WHERE fingerprint = ?1",
                [fingerprint],
                |row| row.get(0),
            )
            .optional()
        {
            Ok(r) => r,
            Err(e) => {
                log::warn!("cache read failed for {fingerprint}: {e}");
                return None;
            }
        };

        let raw = row?;
        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                log::warn!("corrupt cache record for {fingerprint}, recomputing: {e}");
                None
            }
        }
    }

    /// Insert or overwrite a record under its fingerprint.
    pub fn put(&self, fingerprint: &str, record: &HashRecord) -> Result<(), CacheError> {
        let json = serde_json::to_string(record)?;
        let conn = match self.conn.lock() {
            Ok(c) => c,
            Err(poisoned) => poisoned.into_inner(),
        };
        conn.execute(
            "INSERT OR REPLACE INTO hash_records (fingerprint, record, created_at)
             VALUES (?1, ?2, strftime('%s', 'now'))",
            rusqlite::params![fingerprint, json],
        )?;
        Ok(())
    }

    /// Number of persisted records. Old fingerprints are never pruned, so
    /// this grows with every distinct file identity ever hashed.
    pub fn record_count(&self) -> Result<u64, CacheError> {
        let conn = match self.conn.lock() {
            Ok(c) => c,
            Err(poisoned) => poisoned.into_inner(),
        };
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM hash_records", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
