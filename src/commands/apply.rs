//! Apply command implementation
//!
//! The apply command runs the full pipeline:
//! 1. Collect and validate declarations from all manifests
//! 2. Render every present target
//! 3. Write the targets whose content or metadata differ, then notify

use anyhow::Result;
use clap::Args;
use log::info;
use std::path::PathBuf;
use std::time::Instant;

use concat_fragments::phases::{orchestrator, WriteOptions};
use concat_fragments::suggestions;

use super::{print_report, Format, ManifestArgs, PrintOptions};

/// Arguments for the apply command
#[derive(Args, Debug)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub manifests: ManifestArgs,

    /// Prefix prepended to every target path (for staging)
    #[arg(long, value_name = "DIR", env = "CONCAT_ROOT")]
    pub root: Option<PathBuf>,

    /// Show what would be done without making changes
    #[arg(short, long)]
    pub noop: bool,

    /// Report format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,

    /// Also list unchanged targets
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the apply command
pub fn execute(args: ApplyArgs, color_flag: &str) -> Result<()> {
    let start_time = Instant::now();

    let manifests = args.manifests.load()?;
    let options = WriteOptions {
        root: args.root,
        noop: args.noop,
    };
    let report = orchestrator::execute_apply(&manifests, &args.manifests.resolver(), &options);
    info!(
        "Applied {} manifest(s) in {:.2}s",
        manifests.len(),
        start_time.elapsed().as_secs_f64()
    );

    print_report(
        &report,
        PrintOptions {
            format: args.format,
            quiet: args.quiet,
            verbose: args.verbose,
            show_diffs: false,
        },
        color_flag,
    )?;

    if !report.is_success() {
        return Err(suggestions::run_failed(report.failures.len()));
    }
    Ok(())
}
