//! Content-hash caching keyed by file identity.
//!
//! The cache avoids recomputing the CRC32/MD5/SHA-1 triple for unchanged
//! files. A record's key is a fingerprint over the file's absolute path and
//! modification time, so the cache self-invalidates: touching a file changes
//! its fingerprint and the next request recomputes under a fresh key. Stale
//! records under old fingerprints are never pruned (accepted tradeoff).
//!
//! # Architecture
//!
//! * [`record`]: the persisted [`HashRecord`] and fingerprint construction.
//! * [`store`]: SQLite persistence; corruption degrades to a miss.
//!
//! # Concurrency
//!
//! Two requests racing on the same fingerprint may both compute and both
//! write. The values are identical (content-addressed by fingerprint) and
//! the store upserts transactionally, so the race is duplicate work, not a
//! correctness problem. No cross-request lock is taken.

pub mod record;
pub mod store;

pub use record::{fingerprint, HashRecord};
pub use store::{CacheError, HashStore};

use std::fs;
use std::path::Path;
use std::time::UNIX_EPOCH;

use crate::digest::{digest_file, HashError};

/// The hash cache: fingerprint lookup backed by on-demand computation.
pub struct HashCache {
    store: HashStore,
}

impl HashCache {
    /// Wrap an opened store.
    #[must_use]
    pub fn new(store: HashStore) -> Self {
        Self { store }
    }

    /// Return the digest triple for `file`, computing and persisting it on
    /// first request.
    ///
    /// A cache hit never re-reads the file. A failed cache write is logged
    /// and the freshly computed record still returned; the next request
    /// simply recomputes.
    pub fn get_or_compute(&self, file: &Path) -> Result<HashRecord, HashError> {
        let meta = fs::metadata(file).map_err(|source| HashError::Open {
            path: file.to_path_buf(),
            source,
        })?;
        let mtime_secs = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map_or(0, |d| d.as_secs() as i64);

        let key = fingerprint(file, mtime_secs);
        if let Some(record) = self.store.get(&key) {
            log::debug!("cache hit for {}", file.display());
            return Ok(record);
        }

        log::debug!("cache miss for {}, hashing", file.display());
        let record = HashRecord::from(digest_file(file)?);
        if let Err(e) = self.store.put(&key, &record) {
            log::warn!("failed to persist hash record for {}: {}", file.display(), e);
        }
        Ok(record)
    }

    /// Number of persisted records.
    pub fn record_count(&self) -> Result<u64, CacheError> {
        self.store.record_count()
    }

    /// Access to the underlying store.
    #[must_use]
    pub fn store(&self) -> &HashStore {
        &self.store
    }
}
