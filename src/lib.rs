//! Hashdex - Browsable Directory Index with Integrity Checks
//!
//! Serves listings of files and directories rooted at a fixed base
//! directory, with on-demand CRC32/MD5/SHA-1 computation for individual
//! files, cached by file identity, and traversal-safe path resolution.

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod digest;
pub mod error;
pub mod listing;
pub mod logging;
pub mod resolver;
pub mod service;

pub use app::run_app;
