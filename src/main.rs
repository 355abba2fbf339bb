//! Hashdex - Browsable Directory Index with Integrity Checks
//!
//! Entry point for the hashdex CLI.

use clap::Parser;
use hashdex::cli::Cli;
use hashdex::error::{ExitCode, StructuredError};

fn main() {
    let cli = Cli::parse();
    let json_errors = cli.json_errors;

    match hashdex::run_app(cli) {
        Ok(code) => std::process::exit(code.as_i32()),
        Err(err) => {
            let exit_code = ExitCode::GeneralError;
            if json_errors {
                let structured = StructuredError::new(format!("{err:#}"), exit_code);
                if let Ok(json) = serde_json::to_string_pretty(&structured) {
                    eprintln!("{json}");
                } else {
                    eprintln!("[{}] Error: {err:#}", exit_code.code_prefix());
                }
            } else {
                eprintln!("[{}] Error: {err:#}", exit_code.code_prefix());
            }
            std::process::exit(exit_code.as_i32());
        }
    }
}
