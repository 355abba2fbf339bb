//! Path sanitization and traversal-safe resolution.
//!
//! This module turns a raw, attacker-controlled relative path into a
//! validated absolute filesystem location confined to the configured base
//! directory. Two rules apply:
//!
//! * Relative-path tricks (`..` in any run length) are neutralized before
//!   the path ever touches the filesystem, and the canonicalized result must
//!   stay inside the base directory.
//! * A first path segment that is itself a symbolic link may lead outside
//!   the base directory. This is a deliberate escape hatch so that an
//!   administrator can link external trees into the browsed root; it can be
//!   disabled via [`crate::config::BrowseConfig::follow_symlink_roots`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::config::BrowseConfig;

/// Matches any run of two or more consecutive dots.
///
/// Collapsing these to the empty string defeats `..`, `...`, and longer
/// variants while leaving legitimate single-dot filenames intact.
static DOT_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.\.+").expect("hard-coded pattern"));

/// What kind of filesystem object a request expects to resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// The target must be a directory (listing requests).
    Directory,
    /// The target must be a regular file (hash-check requests).
    File,
}

/// A successfully resolved request path.
///
/// The path is absolute and points at an existing object of the requested
/// type. `is_symlink` reflects the requested location itself (before any
/// link was followed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Absolute, canonical path of the target.
    pub path: PathBuf,
    /// Whether the target is a directory.
    pub is_dir: bool,
    /// Whether the requested path itself is a symbolic link.
    pub is_symlink: bool,
}

/// Errors produced by path resolution.
#[derive(thiserror::Error, Debug)]
pub enum PathError {
    /// The raw input contained a NUL byte or was otherwise malformed.
    #[error("invalid path input")]
    InvalidInput,

    /// The resolved path escapes the base directory without a sanctioned
    /// symlink exception.
    #[error("path escapes the base directory")]
    Traversal,

    /// The target does not exist, or exists with the wrong type.
    #[error("path not found: {0}")]
    NotFound(String),

    /// An unexpected I/O error during canonicalization or metadata lookup.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// Resolves user-supplied relative paths against a fixed base directory.
#[derive(Debug, Clone)]
pub struct PathResolver {
    base: PathBuf,
    follow_symlink_roots: bool,
}

impl PathResolver {
    /// Create a resolver for the configured base directory.
    ///
    /// The base is expected to be canonical already; [`BrowseConfig::new`]
    /// guarantees that.
    #[must_use]
    pub fn new(config: &BrowseConfig) -> Self {
        Self {
            base: config.base_dir.clone(),
            follow_symlink_roots: config.follow_symlink_roots,
        }
    }

    /// The canonical base directory all resolutions are confined to.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    /// Resolve a raw relative path to a validated absolute location.
    ///
    /// An empty (or fully sanitized-away) input refers to the base directory
    /// itself. See the module docs for the confinement rules.
    pub fn resolve(&self, raw: &str, mode: ResolveMode) -> Result<Resolved, PathError> {
        if raw.contains('\0') {
            log::warn!("rejecting path with NUL byte");
            return Err(PathError::InvalidInput);
        }

        let sanitized = sanitize(raw);
        let joined = if sanitized.is_empty() {
            self.base.clone()
        } else {
            self.base.join(&sanitized)
        };

        // lstat of the requested location, before following anything.
        let is_symlink = fs::symlink_metadata(&joined)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false);

        let trusted_root = self.follow_symlink_roots && self.first_segment_is_symlink(&sanitized);

        let canonical = match fs::canonicalize(&joined) {
            Ok(p) => p,
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
                ) =>
            {
                // Covers missing targets, dangling symlinks, and paths that
                // route through a regular file (ENOTDIR) alike.
                return Err(PathError::NotFound(sanitized));
            }
            Err(e) => {
                return Err(PathError::Io {
                    path: joined,
                    source: e,
                })
            }
        };

        if !trusted_root && !canonical.starts_with(&self.base) {
            log::warn!("traversal attempt: {raw:?} resolved outside the base directory");
            return Err(PathError::Traversal);
        }

        let meta = fs::metadata(&canonical).map_err(|e| {
            if matches!(
                e.kind(),
                io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
            ) {
                PathError::NotFound(sanitized.clone())
            } else {
                PathError::Io {
                    path: canonical.clone(),
                    source: e,
                }
            }
        })?;

        let type_matches = match mode {
            ResolveMode::Directory => meta.is_dir(),
            ResolveMode::File => meta.is_file(),
        };
        if !type_matches {
            return Err(PathError::NotFound(sanitized));
        }

        Ok(Resolved {
            path: canonical,
            is_dir: meta.is_dir(),
            is_symlink,
        })
    }

    /// Whether the first segment of an already-sanitized path is a symlink
    /// directly under the base directory.
    fn first_segment_is_symlink(&self, sanitized: &str) -> bool {
        let Some(first) = sanitized
            .split(['/', '\\'])
            .find(|s| !s.is_empty())
        else {
            return false;
        };
        fs::symlink_metadata(self.base.join(first))
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false)
    }
}

/// Sanitize a raw request path.
///
/// Strips NUL bytes, trims leading and trailing separators, and collapses
/// every run of two or more dots to nothing. The collapse can expose new
/// leading separators (`../etc` becomes `/etc`), so trimming runs again
/// afterwards; this also keeps [`Path::join`] from treating the remainder as
/// an absolute path.
#[must_use]
pub fn sanitize(raw: &str) -> String {
    let no_nul = raw.replace('\0', "");
    let trimmed = no_nul.trim_matches(['/', '\\']);
    DOT_RUNS
        .replace_all(trimmed, "")
        .trim_matches(['/', '\\'])
        .to_string()
}
