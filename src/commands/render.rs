//! # Render Command Implementation
//!
//! Prints the rendered content of a single target to stdout, exactly as
//! `apply` would write it. The target may be named by title or by path.
//! Nothing is written to disk.

use anyhow::Result;
use clap::Args;
use log::warn;
use std::io::Write;

use concat_fragments::phases::{phase1, phase2};
use concat_fragments::suggestions;

use super::ManifestArgs;

/// Print the rendered content of one target
#[derive(Args, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub manifests: ManifestArgs,

    /// Title or path of the target to render
    #[arg(value_name = "TARGET")]
    pub target: String,
}

/// Execute the `render` command.
pub fn execute(args: RenderArgs) -> Result<()> {
    let manifests = args.manifests.load()?;
    let collected = phase1::execute(&manifests);
    for failure in &collected.failures {
        warn!("{}: {}", failure.item, failure.message);
    }

    let registry = &collected.registry;
    if registry.target(&args.target).is_none() && registry.fragments_for(&args.target)?.is_empty() {
        let known: Vec<&str> = registry
            .targets()
            .flat_map(|t| [t.title(), t.path().to_str().unwrap_or_default()])
            .collect();
        return Err(suggestions::target_not_found(&args.target, &known));
    }

    let content = phase2::render_one(registry, &args.manifests.resolver(), &args.target)?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&content)?;
    stdout.flush()?;
    Ok(())
}
