//! Logging setup: `log` facade with an `env_logger` backend.
//!
//! Level resolution, in priority order:
//!
//! 1. `RUST_LOG` environment variable (if set)
//! 2. CLI flags: `--quiet` (errors only) or `-v`/`-vv` (debug/trace)
//! 3. Default: info

use env_logger::Builder;
use log::LevelFilter;
use std::env;
use std::io::Write;

/// Initialize logging once, before any log calls.
///
/// # Panics
///
/// Panics if called twice; `env_logger` initializes once per process.
pub fn init_logging(verbose: u8, quiet: bool) {
    let mut builder = Builder::new();

    if env::var("RUST_LOG").is_ok() {
        builder.parse_default_env();
    } else {
        builder.filter_level(determine_level(verbose, quiet));
    }

    // Compact format; module path only at higher verbosity.
    builder.format(move |buf, record| {
        let level = record.level();
        let style = buf.default_level_style(level);
        if verbose >= 1 {
            writeln!(
                buf,
                "{} {style}{:<5}{style:#} [{}] {}",
                buf.timestamp_seconds(),
                level,
                record.module_path().unwrap_or("unknown"),
                record.args()
            )
        } else {
            writeln!(buf, "{style}{:<5}{style:#} {}", level, record.args())
        }
    });

    builder.init();
}

/// Map CLI flags to a level filter; `quiet` wins over `verbose`.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}
