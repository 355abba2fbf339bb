//! Application configuration management.
//!
//! Configuration is assembled once at startup and passed explicitly into the
//! resolver, lister, and cache; there is no ambient global state. Two layers
//! exist:
//!
//! * [`Settings`]: the serde-friendly knobs a deployment can override via a
//!   TOML file (hide-lists, blocked extensions, sort defaults, formatting).
//! * [`BrowseConfig`]: the validated runtime value, carrying the
//!   canonicalized base directory and the settings normalized into lookup
//!   sets. Immutable for the process lifetime.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Default names hidden from listings regardless of other rules.
const DEFAULT_HIDDEN_NAMES: &[&str] = &["robots.txt", "favicon.ico"];

/// Default extensions excluded from listings (display-layer filter only).
const DEFAULT_BLOCKED_EXTENSIONS: &[&str] = &[
    "php", "php3", "php4", "php5", "html", "htm", "sh", "bat", "js", "css", "cmd", "png",
];

/// Deployment-tunable settings, loadable from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Show dotfiles in listings.
    pub show_hidden: bool,
    /// Group directories before files regardless of sort key.
    pub directories_first: bool,
    /// Exact file names to hide from listings.
    pub hidden_names: Vec<String>,
    /// Extensions (lowercase, no leading dot) to hide from listings.
    ///
    /// This is a display filter, not a security boundary: a hidden file is
    /// still reachable by a direct hash-check request. Preserved from the
    /// original deployment; see DESIGN.md.
    pub blocked_extensions: Vec<String>,
    /// Follow a symlink sitting directly under the base directory even when
    /// its target lies outside the tree.
    pub follow_symlink_roots: bool,
    /// strftime-style format for displayed timestamps.
    pub date_format: String,
    /// Decimal places for humanized sizes in text output.
    pub size_decimals: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            show_hidden: false,
            directories_first: true,
            hidden_names: DEFAULT_HIDDEN_NAMES.iter().map(ToString::to_string).collect(),
            blocked_extensions: DEFAULT_BLOCKED_EXTENSIONS
                .iter()
                .map(ToString::to_string)
                .collect(),
            follow_symlink_roots: true,
            date_format: "%d-%b-%Y %H:%M".to_string(),
            size_decimals: 1,
        }
    }
}

impl Settings {
    /// Load settings from an explicit path, or from the platform default
    /// location when `path` is `None`. A missing file yields defaults; a
    /// present but malformed file is an error (misconfiguration should not
    /// pass silently).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            log::debug!("no settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        let settings = toml::from_str(&content)
            .with_context(|| format!("malformed settings file {}", path.display()))?;
        log::debug!("loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Platform-specific default settings path.
    fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "hashdex", "hashdex")
            .map(|dirs| dirs.config_dir().join("settings.toml"))
    }
}

/// Validated, immutable runtime configuration.
#[derive(Debug, Clone)]
pub struct BrowseConfig {
    /// Canonical absolute root of the browsable tree.
    pub base_dir: PathBuf,
    /// Show dotfiles in listings.
    pub show_hidden: bool,
    /// Group directories before files.
    pub directories_first: bool,
    /// Exact names hidden from listings.
    pub hidden_names: HashSet<String>,
    /// Lowercased extensions hidden from listings.
    pub blocked_extensions: HashSet<String>,
    /// Trust symlinks directly under the base directory.
    pub follow_symlink_roots: bool,
    /// Display timestamp format.
    pub date_format: String,
    /// Decimal places for humanized sizes.
    pub size_decimals: usize,
}

impl BrowseConfig {
    /// Build the runtime configuration, canonicalizing the base directory.
    ///
    /// Fails if the base directory does not exist or is not a directory;
    /// everything downstream depends on the base being canonical.
    pub fn new(base_dir: &Path, settings: Settings) -> Result<Self> {
        let base_dir = base_dir
            .canonicalize()
            .with_context(|| format!("base directory {} is not accessible", base_dir.display()))?;
        anyhow::ensure!(
            base_dir.is_dir(),
            "base directory {} is not a directory",
            base_dir.display()
        );

        Ok(Self {
            base_dir,
            show_hidden: settings.show_hidden,
            directories_first: settings.directories_first,
            hidden_names: settings.hidden_names.into_iter().collect(),
            blocked_extensions: settings
                .blocked_extensions
                .into_iter()
                .map(|e| e.to_lowercase())
                .collect(),
            follow_symlink_roots: settings.follow_symlink_roots,
            date_format: settings.date_format,
            size_decimals: settings.size_decimals,
        })
    }

    /// Platform-specific default location of the hash cache database.
    pub fn default_cache_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("com", "hashdex", "hashdex")
            .context("failed to determine project directories")?;
        Ok(dirs.cache_dir().join("hashes.db"))
    }
}
