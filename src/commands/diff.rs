//! # Diff Command Implementation
//!
//! This module implements the `diff` subcommand, which shows what `apply`
//! would change without touching the filesystem.
//!
//! ## Functionality
//!
//! - **Change Detection**: Runs the full pipeline in noop mode
//! - **Unified Diffs**: Prints the content diff of every target that would be
//!   updated (unless the target disables `show_diff`)
//! - **Exit Codes**: Returns 0 if no changes would occur, 1 if changes exist
//!   or a declaration or target failed

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use concat_fragments::phases::{orchestrator, WriteOptions};
use concat_fragments::suggestions;

use super::{changes_detected, print_report, Format, ManifestArgs, PrintOptions};

/// Show differences between current files and rendered targets
#[derive(Args, Debug)]
pub struct DiffArgs {
    #[command(flatten)]
    pub manifests: ManifestArgs,

    /// Prefix prepended to every target path
    #[arg(long, value_name = "DIR", env = "CONCAT_ROOT")]
    pub root: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,

    /// Show only a summary without content diffs
    #[arg(long)]
    pub summary: bool,
}

/// Execute the `diff` command.
pub fn execute(args: DiffArgs, color_flag: &str) -> Result<()> {
    let manifests = args.manifests.load()?;
    let options = WriteOptions {
        root: args.root,
        noop: true,
    };
    let report = orchestrator::execute_apply(&manifests, &args.manifests.resolver(), &options);

    print_report(
        &report,
        PrintOptions {
            format: args.format,
            quiet: false,
            verbose: false,
            show_diffs: !args.summary,
        },
        color_flag,
    )?;

    if !report.is_success() {
        return Err(suggestions::run_failed(report.failures.len()));
    }
    if report.has_changes() {
        return Err(changes_detected());
    }
    Ok(())
}
