//! Directory listing: metadata-enriched, filtered, ordered children.
//!
//! The lister enumerates the direct children of an already-resolved
//! directory. It applies the configured hide-rules (exact names, dotfiles,
//! blocked extensions) and a stable three-key sort. Entries that disappear
//! or fail to stat mid-listing are skipped rather than failing the whole
//! request; the tree is not synchronized against concurrent mutation.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::Serialize;

use crate::config::BrowseConfig;

/// Sort key for directory listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Case-insensitive lexical order on the entry name.
    #[default]
    Name,
    /// Modification timestamp.
    Modified,
    /// Size in bytes.
    Size,
}

/// Sort direction for directory listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending (default).
    #[default]
    Asc,
    /// Descending.
    Desc,
}

/// Metadata for one directory entry, recomputed fresh on every listing.
#[derive(Debug, Clone, Serialize)]
pub struct DirEntryMeta {
    /// Entry name (no path components).
    pub name: String,
    /// Whether the entry is a directory.
    pub is_dir: bool,
    /// Whether the entry is a symbolic link.
    pub is_symlink: bool,
    /// Size in bytes; always 0 for directories.
    pub size_bytes: u64,
    /// Last modification time.
    pub modified_at: DateTime<Utc>,
    /// Creation time; falls back to the modification time on filesystems
    /// that do not expose a birth time.
    pub created_at: DateTime<Utc>,
}

/// A complete listing with aggregates over the surviving entries.
///
/// Directories are excluded from both aggregates.
#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    /// Ordered entries.
    pub entries: Vec<DirEntryMeta>,
    /// Number of files (directories excluded).
    pub total_files: usize,
    /// Combined size of the files in bytes.
    pub total_size_bytes: u64,
}

/// Errors that can fail an entire listing request.
#[derive(thiserror::Error, Debug)]
pub enum ListError {
    /// The directory itself could not be read.
    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        /// Directory that failed to open
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// Enumerates and orders the direct children of a resolved directory.
#[derive(Debug, Clone)]
pub struct DirectoryLister {
    show_hidden: bool,
    directories_first: bool,
    hidden_names: std::collections::HashSet<String>,
    blocked_extensions: std::collections::HashSet<String>,
}

impl DirectoryLister {
    /// Create a lister from the process configuration.
    #[must_use]
    pub fn new(config: &BrowseConfig) -> Self {
        Self {
            show_hidden: config.show_hidden,
            directories_first: config.directories_first,
            hidden_names: config.hidden_names.clone(),
            blocked_extensions: config.blocked_extensions.clone(),
        }
    }

    /// List the direct children of `dir`, filtered and sorted.
    ///
    /// Per-entry stat failures are logged and the entry skipped; only a
    /// failure to open the directory itself is an error.
    pub fn list(&self, dir: &Path, sort: SortKey, order: SortOrder) -> Result<Listing, ListError> {
        let read_dir = fs::read_dir(dir).map_err(|e| ListError::ReadDir {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    log::debug!("skipping unreadable entry in {}: {}", dir.display(), e);
                    continue;
                }
            };
            let name = entry.file_name().to_string_lossy().into_owned();

            if self.hidden_names.contains(&name) {
                continue;
            }
            if !self.show_hidden && name.starts_with('.') {
                continue;
            }

            match self.stat_entry(&entry.path(), name) {
                Some(meta) => entries.push(meta),
                None => continue,
            }
        }

        self.sort_entries(&mut entries, sort, order);

        let total_files = entries.iter().filter(|e| !e.is_dir).count();
        let total_size_bytes = entries
            .iter()
            .filter(|e| !e.is_dir)
            .map(|e| e.size_bytes)
            .sum();

        Ok(Listing {
            entries,
            total_files,
            total_size_bytes,
        })
    }

    /// Stat one child, applying the extension blocklist to non-directories.
    ///
    /// Returns `None` for filtered or vanished entries.
    fn stat_entry(&self, path: &Path, name: String) -> Option<DirEntryMeta> {
        let is_symlink = fs::symlink_metadata(path)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false);

        // Follows symlinks so a linked directory counts as a directory.
        let meta = match fs::metadata(path) {
            Ok(m) => m,
            Err(e) => {
                log::debug!("skipping {}: {}", path.display(), e);
                return None;
            }
        };

        let is_dir = meta.is_dir();
        if !is_dir && self.extension_blocked(&name) {
            return None;
        }

        let modified_at = meta
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| DateTime::<Utc>::UNIX_EPOCH);
        let created_at = meta
            .created()
            .map(DateTime::<Utc>::from)
            .unwrap_or(modified_at);

        Some(DirEntryMeta {
            name,
            is_dir,
            is_symlink,
            size_bytes: if is_dir { 0 } else { meta.len() },
            modified_at,
            created_at,
        })
    }

    fn extension_blocked(&self, name: &str) -> bool {
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.blocked_extensions.contains(&ext.to_lowercase()))
    }

    /// Stable three-key sort: directories-first (when enabled, unaffected by
    /// the requested order), then the selected key, ties in scan order.
    fn sort_entries(&self, entries: &mut [DirEntryMeta], sort: SortKey, order: SortOrder) {
        entries.sort_by(|a, b| {
            if self.directories_first {
                match (a.is_dir, b.is_dir) {
                    (true, false) => return std::cmp::Ordering::Less,
                    (false, true) => return std::cmp::Ordering::Greater,
                    _ => {}
                }
            }
            let key = match sort {
                SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
                SortKey::Modified => a.modified_at.cmp(&b.modified_at),
                SortKey::Size => a.size_bytes.cmp(&b.size_bytes),
            };
            match order {
                SortOrder::Asc => key,
                SortOrder::Desc => key.reverse(),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn lister_with(dir: &TempDir, settings: Settings) -> DirectoryLister {
        DirectoryLister::new(&BrowseConfig::new(dir.path(), settings).unwrap())
    }

    fn write_file(dir: &TempDir, name: &str, bytes: usize) {
        let mut f = File::create(dir.path().join(name)).unwrap();
        f.write_all(&vec![b'x'; bytes]).unwrap();
    }

    #[test]
    fn test_list_directories_first_then_name() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "a.txt", 10);
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        File::create(dir.path().join("sub").join("b.txt")).unwrap();

        let lister = lister_with(&dir, Settings::default());
        let listing = lister
            .list(dir.path(), SortKey::Name, SortOrder::Asc)
            .unwrap();

        let names: Vec<_> = listing.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["sub", "a.txt"]);
        assert_eq!(listing.total_files, 1);
        assert_eq!(listing.total_size_bytes, 10);
    }

    #[test]
    fn test_list_excludes_hidden_names_and_dotfiles() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "robots.txt", 5);
        write_file(&dir, ".secret", 5);
        write_file(&dir, "visible.txt", 5);

        let lister = lister_with(&dir, Settings::default());
        let listing = lister
            .list(dir.path(), SortKey::Name, SortOrder::Asc)
            .unwrap();

        let names: Vec<_> = listing.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["visible.txt"]);
    }

    #[test]
    fn test_list_shows_dotfiles_when_enabled() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, ".secret", 5);

        let settings = Settings {
            show_hidden: true,
            ..Default::default()
        };
        let lister = lister_with(&dir, settings);
        let listing = lister
            .list(dir.path(), SortKey::Name, SortOrder::Asc)
            .unwrap();
        assert_eq!(listing.entries.len(), 1);
        assert_eq!(listing.entries[0].name, ".secret");
    }

    #[test]
    fn test_list_blocked_extensions_filter_files_not_dirs() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "index.PHP", 5);
        write_file(&dir, "notes.txt", 5);
        // A directory named like a blocked extension stays visible.
        std::fs::create_dir(dir.path().join("archive.php")).unwrap();

        let lister = lister_with(&dir, Settings::default());
        let listing = lister
            .list(dir.path(), SortKey::Name, SortOrder::Asc)
            .unwrap();

        let names: Vec<_> = listing.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["archive.php", "notes.txt"]);
    }

    #[test]
    fn test_list_sort_by_size() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "big.txt", 300);
        write_file(&dir, "small.txt", 10);
        write_file(&dir, "mid.txt", 50);

        let lister = lister_with(&dir, Settings::default());

        let asc = lister
            .list(dir.path(), SortKey::Size, SortOrder::Asc)
            .unwrap();
        let names: Vec<_> = asc.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["small.txt", "mid.txt", "big.txt"]);

        let desc = lister
            .list(dir.path(), SortKey::Size, SortOrder::Desc)
            .unwrap();
        let names: Vec<_> = desc.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["big.txt", "mid.txt", "small.txt"]);
    }

    #[test]
    fn test_list_sort_by_modified() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "old.txt", 5);
        write_file(&dir, "new.txt", 5);

        let old_time = filetime::FileTime::from_unix_time(1_500_000_000, 0);
        let new_time = filetime::FileTime::from_unix_time(1_700_000_000, 0);
        filetime::set_file_mtime(dir.path().join("old.txt"), old_time).unwrap();
        filetime::set_file_mtime(dir.path().join("new.txt"), new_time).unwrap();

        let lister = lister_with(&dir, Settings::default());
        let listing = lister
            .list(dir.path(), SortKey::Modified, SortOrder::Asc)
            .unwrap();
        let names: Vec<_> = listing.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["old.txt", "new.txt"]);
    }

    #[test]
    fn test_list_directories_first_survives_desc() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "zzz.txt", 5);
        std::fs::create_dir(dir.path().join("aaa")).unwrap();

        let lister = lister_with(&dir, Settings::default());
        let listing = lister
            .list(dir.path(), SortKey::Name, SortOrder::Desc)
            .unwrap();
        assert!(listing.entries[0].is_dir, "directory must sort first even descending");
    }

    #[test]
    fn test_list_directories_first_disabled() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "aaa.txt", 5);
        std::fs::create_dir(dir.path().join("zzz")).unwrap();

        let settings = Settings {
            directories_first: false,
            ..Default::default()
        };
        let lister = lister_with(&dir, settings);
        let listing = lister
            .list(dir.path(), SortKey::Name, SortOrder::Asc)
            .unwrap();
        let names: Vec<_> = listing.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["aaa.txt", "zzz"]);
    }

    #[test]
    fn test_list_directory_size_is_zero() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        write_file(&dir, "a.txt", 42);

        let lister = lister_with(&dir, Settings::default());
        let listing = lister
            .list(dir.path(), SortKey::Name, SortOrder::Asc)
            .unwrap();

        let sub = listing.entries.iter().find(|e| e.is_dir).unwrap();
        assert_eq!(sub.size_bytes, 0);
        // Aggregates exclude directories.
        assert_eq!(listing.total_files, 1);
        assert_eq!(listing.total_size_bytes, 42);
    }

    #[test]
    fn test_list_missing_directory_errors() {
        let dir = TempDir::new().unwrap();
        let lister = lister_with(&dir, Settings::default());
        let err = lister
            .list(&dir.path().join("gone"), SortKey::Name, SortOrder::Asc)
            .unwrap_err();
        assert!(matches!(err, ListError::ReadDir { .. }));
    }

    #[test]
    #[cfg(unix)]
    fn test_list_marks_symlinks() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "target.txt", 5);
        std::os::unix::fs::symlink(
            dir.path().join("target.txt"),
            dir.path().join("link.txt"),
        )
        .unwrap();

        let lister = lister_with(&dir, Settings::default());
        let listing = lister
            .list(dir.path(), SortKey::Name, SortOrder::Asc)
            .unwrap();
        let link = listing.entries.iter().find(|e| e.name == "link.txt").unwrap();
        assert!(link.is_symlink);
        assert!(!link.is_dir);
    }
}
