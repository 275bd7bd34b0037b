//! # Validate Command Implementation
//!
//! This module implements the `validate` subcommand, which checks manifests
//! without writing anything.
//!
//! ## Functionality
//!
//! - **Manifest Parsing**: Discovers and parses every manifest.
//! - **Declaration Validation**: Runs the collection phase, reporting invalid
//!   order values, conflicting or missing content, relative paths and
//!   duplicate names.
//! - **Orphan Detection**: Warns about fragments whose target is never
//!   declared.
//! - **Source Check**: Optionally renders every target to verify that all
//!   `source` references resolve (controlled by flag).
//!
//! This command is a safe, read-only operation that does not modify any files.

use anyhow::Result;
use clap::Args;

use concat_fragments::output::{emoji, OutputConfig};
use concat_fragments::phases::{phase1, phase2};

use super::ManifestArgs;

/// Validate manifests without rendering or writing
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub manifests: ManifestArgs,

    /// If set, also render every target to check that all sources resolve.
    #[arg(long)]
    pub check_sources: bool,

    /// Use strict validation (fail on warnings).
    #[arg(long)]
    pub strict: bool,
}

/// Execute the `validate` command.
///
/// # Arguments
/// * `args` - The command arguments
/// * `color_flag` - The value of the global --color flag ("always", "never", or "auto")
pub fn execute(args: ValidateArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    println!(
        "{} Validating manifests: {}",
        emoji(&out, "🔍", "[SCAN]"),
        args.manifests
            .manifests
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let manifests = match args.manifests.load() {
        Ok(manifests) => {
            println!(
                "{} {} manifest(s) parsed successfully",
                emoji(&out, "✅", "[OK]"),
                manifests.len()
            );
            manifests
        }
        Err(e) => {
            println!("{} Manifest parsing failed", emoji(&out, "❌", "[ERR]"));
            return Err(e);
        }
    };

    let collected = phase1::execute(&manifests);
    let mut has_errors = !collected.failures.is_empty();
    let has_warnings = !collected.warnings.is_empty();

    println!("\n{} Manifest Summary:", emoji(&out, "📊", "[INFO]"));
    println!(
        "   Declarations: {}",
        manifests.iter().map(|m| m.manifest.len()).sum::<usize>()
    );
    println!("   Targets: {}", collected.registry.targets().count());
    println!("   Fragments: {}", collected.registry.fragments().count());

    println!(
        "\n{} Checking declarations...",
        emoji(&out, "🔄", "[CHECK]")
    );
    for failure in &collected.failures {
        println!(
            "{} {}: {}",
            emoji(&out, "❌", "[ERR]"),
            failure.item,
            failure.message
        );
    }
    for warning in &collected.warnings {
        println!("{} {}", emoji(&out, "⚠️", "[WARN]"), warning);
    }
    if !has_errors && !has_warnings {
        println!("{} All declarations are valid", emoji(&out, "✅", "[OK]"));
    }

    if args.check_sources {
        println!(
            "\n{} Checking fragment sources...",
            emoji(&out, "🌐", "[SRC]")
        );
        let (rendered, failures) = phase2::execute(&collected.registry, &args.manifests.resolver());
        for failure in &failures {
            println!(
                "{} {}: {}",
                emoji(&out, "❌", "[ERR]"),
                failure.item,
                failure.message
            );
        }
        if failures.is_empty() {
            println!(
                "{} {} target(s) render successfully",
                emoji(&out, "✅", "[OK]"),
                rendered.len()
            );
        }
        has_errors |= !failures.is_empty();
    }

    println!("\n{} Validation Result:", emoji(&out, "🎯", "[RESULT]"));

    if has_errors {
        println!(
            "{} Manifests have errors that must be fixed",
            emoji(&out, "❌", "[ERR]")
        );
        return Err(anyhow::anyhow!("Manifest validation failed"));
    }

    if has_warnings && args.strict {
        println!(
            "{} Manifests have warnings (strict mode enabled)",
            emoji(&out, "❌", "[ERR]")
        );
        return Err(anyhow::anyhow!(
            "Manifest validation failed due to warnings in strict mode"
        ));
    }

    println!("{} Manifests are valid", emoji(&out, "✅", "[OK]"));
    Ok(())
}
