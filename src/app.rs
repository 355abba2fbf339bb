//! CLI driver: wires configuration, the browse service, and output.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::cache::{HashCache, HashStore};
use crate::cli::{Cli, Commands};
use crate::config::{BrowseConfig, Settings};
use crate::error::{ExitCode, StructuredError};
use crate::logging::init_logging;
use crate::service::{BrowsePage, BrowseError, BrowseService, HashCheck};

/// Run the application for parsed CLI arguments, returning the exit code.
///
/// Service-level failures (not found, invalid path) are reported and mapped
/// to their exit codes here; only startup failures (bad base directory,
/// unopenable cache store) propagate as errors.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    init_logging(cli.verbose, cli.quiet);

    let settings = Settings::load(cli.config.as_deref())?;
    let config = BrowseConfig::new(&cli.base_dir, settings)?;

    let cache_path = match &cli.cache {
        Some(p) => p.clone(),
        None => BrowseConfig::default_cache_path()?,
    };
    let store = HashStore::open(&cache_path)
        .with_context(|| format!("failed to open hash cache at {}", cache_path.display()))?;
    let service = BrowseService::new(&config, HashCache::new(store));

    let outcome = match &cli.command {
        Commands::List(args) => service
            .browse(args.folder.as_deref(), args.sort, args.order)
            .map(|page| render_listing(&page, &config, cli.json)),
        Commands::Hash(args) => service
            .check_hash(&args.file)
            .map(|check| render_hash_check(&check, cli.json)),
    };

    match outcome {
        Ok(()) => Ok(ExitCode::Success),
        Err(err) => {
            report_error(&err, cli.json_errors);
            Ok(ExitCode::for_browse_error(&err))
        }
    }
}

fn report_error(err: &BrowseError, json_errors: bool) {
    let code = ExitCode::for_browse_error(err);
    if json_errors {
        let structured = StructuredError::new(err.to_string(), code);
        match serde_json::to_string_pretty(&structured) {
            Ok(json) => eprintln!("{json}"),
            Err(_) => eprintln!("[{}] Error: {}", code.code_prefix(), err),
        }
    } else {
        eprintln!("[{}] Error: {}", code.code_prefix(), err);
    }
}

fn render_listing(page: &BrowsePage, config: &BrowseConfig, json: bool) {
    if json {
        match serde_json::to_string_pretty(page) {
            Ok(out) => println!("{out}"),
            Err(e) => log::error!("failed to serialize listing: {e}"),
        }
        return;
    }

    println!("Index of {}", page.display_path);
    println!(
        "{} files, {} total",
        page.total_files,
        humanize_size(page.total_size_bytes, config.size_decimals)
    );
    println!();
    println!(
        "{:<40} {:<18} {:>12}  {:<18}",
        "Name", "Last Modified", "Size", "Created"
    );
    for entry in &page.entries {
        let name = if entry.is_dir {
            format!("{}/", entry.name)
        } else {
            entry.name.clone()
        };
        let size = if entry.is_dir {
            "-".to_string()
        } else {
            humanize_size(entry.size_bytes, config.size_decimals)
        };
        println!(
            "{:<40} {:<18} {:>12}  {:<18}",
            name,
            format_time(entry.modified_at, &config.date_format),
            size,
            format_time(entry.created_at, &config.date_format),
        );
    }
}

fn render_hash_check(check: &HashCheck, json: bool) {
    if json {
        match serde_json::to_string_pretty(check) {
            Ok(out) => println!("{out}"),
            Err(e) => log::error!("failed to serialize hash check: {e}"),
        }
        return;
    }

    println!("Hash check for {}", check.file_name);
    println!("Size  : {} bytes", check.file_size_bytes);
    println!("CRC32 : {}", check.crc32);
    println!("MD5   : {}", check.md5);
    println!("SHA-1 : {}", check.sha1);
}

fn format_time(time: DateTime<Utc>, format: &str) -> String {
    time.format(format).to_string()
}

/// Human-readable size with configurable decimals, 1024-based units.
fn humanize_size(bytes: u64, decimals: usize) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.decimals$} {}", UNITS[unit])
}
