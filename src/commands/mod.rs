//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `concat-fragments` command-line tool. Each subcommand is defined in its
//! own file.
//!
//! ## Structure
//!
//! Each command module contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command's logic by calling into the `concat_fragments` library.
//!
//! Arguments shared by several commands live here.

pub mod apply;
pub mod completions;
pub mod diff;
pub mod render;
pub mod tree;
pub mod validate;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, ValueEnum};

use concat_fragments::defaults::default_manifest_path;
use concat_fragments::output::{format_report, format_report_json, OutputConfig};
use concat_fragments::phases::{orchestrator, LoadedManifest, Report};
use concat_fragments::source::LocalResolver;
use concat_fragments::suggestions;

/// Marker error for `diff` finding pending changes
const CHANGES_DETECTED: &str = "CHANGES_DETECTED";

/// Error returned by `diff` when applying would change something.
pub fn changes_detected() -> anyhow::Error {
    anyhow::anyhow!(CHANGES_DETECTED)
}

/// Whether `error` only signals pending changes.
pub fn is_changes_detected(error: &anyhow::Error) -> bool {
    error.to_string() == CHANGES_DETECTED
}

/// Where manifests and module files are found
#[derive(Args, Debug, Clone)]
pub struct ManifestArgs {
    /// Manifest files, directories or glob patterns (repeatable).
    #[arg(
        short,
        long = "manifest",
        value_name = "PATH",
        env = "CONCAT_MANIFEST",
        value_delimiter = ',',
        default_values_os_t = vec![default_manifest_path()]
    )]
    pub manifests: Vec<PathBuf>,

    /// Directory serving `puppet:///modules/<module>/<path>` sources.
    #[arg(long, value_name = "DIR", env = "CONCAT_MODULES_DIR")]
    pub modules_dir: Option<PathBuf>,
}

impl ManifestArgs {
    /// Discover and parse the manifests.
    pub fn load(&self) -> Result<Vec<LoadedManifest>> {
        for input in &self.manifests {
            let pattern = input.to_string_lossy();
            if is_glob(&pattern) {
                if let Err(e) = glob::Pattern::new(&pattern) {
                    return Err(suggestions::invalid_glob(&pattern, &e));
                }
            } else if !input.exists() {
                return Err(suggestions::manifest_not_found(input));
            }
        }
        Ok(orchestrator::load_manifests(&self.manifests)?)
    }

    /// Source resolver for fragments of these manifests.
    pub fn resolver(&self) -> LocalResolver {
        match &self.modules_dir {
            Some(dir) => LocalResolver::default().with_modules_dir(dir),
            None => LocalResolver::default(),
        }
    }
}

fn is_glob(input: &str) -> bool {
    input.contains(['*', '?', '['])
}

/// Report output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Human-readable lines
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Options controlling how a report is printed
#[derive(Debug, Clone, Copy)]
pub struct PrintOptions {
    pub format: Format,
    pub quiet: bool,
    pub verbose: bool,
    pub show_diffs: bool,
}

/// Print a run report to stdout.
pub fn print_report(report: &Report, options: PrintOptions, color_flag: &str) -> Result<()> {
    match options.format {
        Format::Json => println!("{}", format_report_json(report)?),
        Format::Text if options.quiet => {}
        Format::Text => {
            let out = OutputConfig::from_env_and_flag(color_flag);
            print!(
                "{}",
                format_report(&out, report, options.verbose, options.show_diffs)
            );
        }
    }
    Ok(())
}
