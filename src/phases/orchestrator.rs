//! Orchestrator for a complete concat run
//!
//! This module coordinates the three phases behind a single call, and loads
//! manifests from the paths given on the command line.

use std::path::PathBuf;

use log::debug;

use super::{phase1, phase2, phase3, Collected, LoadedManifest, Report, WriteOptions};
use crate::config;
use crate::error::Result;
use crate::source::SourceResolver;

/// Discover and parse every manifest named by `inputs`
///
/// Inputs may be files, directories or glob patterns. A manifest that fails
/// to parse aborts loading, since none of its declarations can be trusted.
pub fn load_manifests(inputs: &[PathBuf]) -> Result<Vec<LoadedManifest>> {
    config::discover(inputs)?
        .into_iter()
        .map(|path| {
            debug!("Loading manifest {}", path.display());
            let manifest = config::from_file(&path)?;
            Ok(LoadedManifest::new(Some(path), manifest))
        })
        .collect()
}

/// Execute a complete run (Phases 1-3)
///
/// 1. Validate and register every declaration
/// 2. Aggregate every present target
/// 3. Realize the targets on disk (or only report, in noop mode)
///
/// Failures of individual declarations or targets are collected in the
/// returned report; the remaining targets still converge.
pub fn execute_apply(
    manifests: &[LoadedManifest],
    resolver: &dyn SourceResolver,
    options: &WriteOptions,
) -> Report {
    // Phase 1: Collection
    let Collected {
        registry,
        mut failures,
        warnings,
    } = phase1::execute(manifests);

    // Phase 2: Rendering
    let (rendered, render_failures) = phase2::execute(&registry, resolver);
    failures.extend(render_failures);

    // Phase 3: Writing
    let (targets, write_failures) = phase3::execute(&rendered, options);
    failures.extend(write_failures);

    Report {
        noop: options.noop,
        targets,
        failures,
        warnings,
    }
}
