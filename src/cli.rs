//! Command-line interface definitions for hashdex.
//!
//! All arguments, subcommands, and options via the clap derive API. Global
//! options cover verbosity and output shape; subcommands map one-to-one
//! onto the browse facade (`list` → directory listing, `hash` → digest
//! check).
//!
//! # Example
//!
//! ```bash
//! # List the base directory root
//! hashdex --base-dir /srv/files list
//!
//! # List a subfolder, largest entries first
//! hashdex --base-dir /srv/files list downloads --sort size --order desc
//!
//! # Check the digests of one file, as JSON
//! hashdex --base-dir /srv/files --json hash downloads/image.iso
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::listing::{SortKey, SortOrder};

/// Browsable directory index with cached CRC32/MD5/SHA-1 integrity checks.
///
/// Hashdex serves listings of a fixed base directory and computes the
/// digest triple for individual files on demand, caching results keyed by
/// file identity so unchanged files are never re-read.
#[derive(Debug, Parser)]
#[command(name = "hashdex")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Base directory all requests are confined to
    #[arg(long, value_name = "DIR", default_value = ".", global = true)]
    pub base_dir: PathBuf,

    /// Path to a TOML settings file (hide-lists, blocklist, formatting)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Path to the hash cache database
    ///
    /// If not specified, a platform-specific default path is used.
    #[arg(long, value_name = "PATH", global = true)]
    pub cache: Option<PathBuf>,

    /// Emit results as JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Emit errors as structured JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the contents of a directory under the base directory
    List(ListArgs),
    /// Compute (or fetch cached) CRC32/MD5/SHA-1 digests for a file
    Hash(HashArgs),
}

/// Arguments for the list subcommand.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Relative folder to list; omit for the base directory root
    #[arg(value_name = "FOLDER")]
    pub folder: Option<String>,

    /// Sort key
    #[arg(short, long, value_enum, default_value = "name")]
    pub sort: SortKey,

    /// Sort direction
    #[arg(short, long, value_enum, default_value = "asc")]
    pub order: SortOrder,
}

/// Arguments for the hash subcommand.
#[derive(Debug, Args)]
pub struct HashArgs {
    /// Relative path of the file to hash-check
    #[arg(value_name = "FILE")]
    pub file: String,
}
