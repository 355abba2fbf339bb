//! The browse facade external consumers call.
//!
//! [`BrowseService`] composes the resolver, lister, and cache, and maps
//! their errors onto the external taxonomy: traversal attempts and genuine
//! misses both surface as not-found (no existence leak), malformed input is
//! a client error, and filesystem failures during hashing or listing are
//! server errors.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::HashCache;
use crate::config::BrowseConfig;
use crate::digest::HashError;
use crate::listing::{DirectoryLister, DirEntryMeta, ListError, SortKey, SortOrder};
use crate::resolver::{sanitize, PathError, PathResolver, ResolveMode};

/// Errors surfaced to the consumer, aligned with the external taxonomy.
#[derive(thiserror::Error, Debug)]
pub enum BrowseError {
    /// Malformed request path (client error).
    #[error("invalid request path")]
    InvalidInput,

    /// Target missing, wrong type, or outside the base directory.
    #[error("not found")]
    NotFound,

    /// The resolved directory could not be listed (server error).
    #[error(transparent)]
    List(#[from] ListError),

    /// The resolved file could not be hashed (server error).
    #[error(transparent)]
    Hash(#[from] HashError),

    /// Unexpected I/O during resolution (server error).
    #[error("resolution failed: {0}")]
    Resolve(#[source] std::io::Error),
}

impl From<PathError> for BrowseError {
    fn from(e: PathError) -> Self {
        match e {
            PathError::InvalidInput => Self::InvalidInput,
            // Traversal deliberately collapses into NotFound so a rejected
            // path is indistinguishable from a missing one.
            PathError::Traversal | PathError::NotFound(_) => Self::NotFound,
            PathError::Io { source, .. } => Self::Resolve(source),
        }
    }
}

/// A rendered-ready directory listing.
#[derive(Debug, Clone, Serialize)]
pub struct BrowsePage {
    /// Display path of the browsed directory, always `/`-prefixed.
    pub display_path: String,
    /// Ordered entries.
    pub entries: Vec<DirEntryMeta>,
    /// File count (directories excluded).
    pub total_files: usize,
    /// Combined file size in bytes.
    pub total_size_bytes: u64,
    /// Modification time of the browsed directory itself.
    pub dir_modified_at: Option<DateTime<Utc>>,
    /// Creation time of the browsed directory (modified-time fallback).
    pub dir_created_at: Option<DateTime<Utc>>,
}

/// The hash-check result for one file.
#[derive(Debug, Clone, Serialize)]
pub struct HashCheck {
    /// Base name of the hashed file.
    pub file_name: String,
    /// File size in bytes.
    pub file_size_bytes: u64,
    /// CRC-32, 8 hex digits.
    pub crc32: String,
    /// MD5, 32 hex digits.
    pub md5: String,
    /// SHA-1, 40 hex digits.
    pub sha1: String,
}

/// Thin orchestrator over resolver, lister, and cache.
pub struct BrowseService {
    resolver: PathResolver,
    lister: DirectoryLister,
    cache: HashCache,
}

impl BrowseService {
    /// Assemble the service from the process configuration and an opened
    /// cache.
    #[must_use]
    pub fn new(config: &BrowseConfig, cache: HashCache) -> Self {
        Self {
            resolver: PathResolver::new(config),
            lister: DirectoryLister::new(config),
            cache,
        }
    }

    /// Browse a directory. `None` or empty means the base directory root.
    pub fn browse(
        &self,
        folder: Option<&str>,
        sort: SortKey,
        order: SortOrder,
    ) -> Result<BrowsePage, BrowseError> {
        let raw = folder.unwrap_or("");
        let resolved = self.resolver.resolve(raw, ResolveMode::Directory)?;
        let listing = self.lister.list(&resolved.path, sort, order)?;

        let (dir_modified_at, dir_created_at) = dir_times(&resolved.path);

        Ok(BrowsePage {
            display_path: format!("/{}", sanitize(raw)),
            entries: listing.entries,
            total_files: listing.total_files,
            total_size_bytes: listing.total_size_bytes,
            dir_modified_at,
            dir_created_at,
        })
    }

    /// Hash-check a file, serving cached digests when the file is unchanged.
    pub fn check_hash(&self, file: &str) -> Result<HashCheck, BrowseError> {
        let resolved = self.resolver.resolve(file, ResolveMode::File)?;
        let record = self.cache.get_or_compute(&resolved.path)?;

        let file_size_bytes = fs::metadata(&resolved.path).map(|m| m.len()).unwrap_or(0);
        let file_name = resolved
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(HashCheck {
            file_name,
            file_size_bytes,
            crc32: record.crc32,
            md5: record.md5,
            sha1: record.sha1,
        })
    }

    /// The underlying cache (stats, tests).
    #[must_use]
    pub fn cache(&self) -> &HashCache {
        &self.cache
    }
}

/// Best-effort modified/created times for the browsed directory header.
fn dir_times(path: &Path) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    let Ok(meta) = fs::metadata(path) else {
        return (None, None);
    };
    let modified = meta.modified().ok().map(DateTime::<Utc>::from);
    let created = meta.created().ok().map(DateTime::<Utc>::from).or(modified);
    (modified, created)
}
