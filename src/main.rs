//! # Concat Fragments CLI
//!
//! This is the binary entry point for the `concat-fragments` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Executing the appropriate command based on the parsed arguments.
//! - Translating errors into exit codes: 0 for success, 1 for errors (or
//!   pending changes reported by `diff`), 2 for invalid usage (from clap).
//!
//! The core application logic lives in the `concat_fragments` library crate,
//! so the binary stays a thin wrapper around it.

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    match cli.execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if commands::is_changes_detected(&e) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
