//! Implementation of the 3 phases of a concat run.
//!
//! ## Overview
//!
//! A run follows 3 phases:
//! 1. Collection - Validate every declaration and register it in a `FragmentRegistry`
//! 2. Rendering - Aggregate each present target's fragments exactly once
//! 3. Writing - Compare with disk, write only what differs, apply file attributes
//!
//! Registration is finished before rendering starts, so the registry is
//! read-only from phase 2 on. A declaration or target that fails is recorded
//! as a `Failure` and skipped; it never stops other targets from converging.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::Manifest;
use crate::registry::FragmentRegistry;
use crate::target::Target;

// Phase modules
pub mod collect;
pub mod orchestrator;
pub mod render;
pub mod write;

// Re-export phase modules by position in the pipeline
pub use collect as phase1;
pub use render as phase2;
pub use write as phase3;

/// A parsed manifest together with the file it came from
#[derive(Debug, Clone)]
pub struct LoadedManifest {
    /// Manifest file, used to anchor relative sources and label failures
    pub path: Option<PathBuf>,
    /// Declarations in file order
    pub manifest: Manifest,
}

impl LoadedManifest {
    pub fn new(path: Option<PathBuf>, manifest: Manifest) -> Self {
        Self { path, manifest }
    }

    /// Directory relative sources are resolved against.
    pub fn base_dir(&self) -> Option<&Path> {
        self.path.as_deref().and_then(Path::parent)
    }
}

/// An item that could not be processed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    /// Resource label such as `Concat_fragment[header]`
    pub item: String,
    /// Human-readable error
    pub message: String,
}

impl Failure {
    pub fn new(item: impl Into<String>, error: &crate::error::Error) -> Self {
        Self {
            item: item.into(),
            message: error.to_string(),
        }
    }
}

/// Output of phase 1
#[derive(Debug, Default)]
pub struct Collected {
    pub registry: FragmentRegistry,
    pub failures: Vec<Failure>,
    pub warnings: Vec<String>,
}

/// Content computed for one target in phase 2
#[derive(Debug, Clone)]
pub struct RenderedTarget<'r> {
    /// The declared target, borrowed from the registry
    pub target: &'r Target,
    /// `None` for targets that ensure the file is absent
    pub content: Option<Vec<u8>>,
    /// Number of fragments aggregated
    pub fragments: usize,
}

/// What realizing a target did (or would do, in noop mode)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Change {
    /// The file did not exist and was written
    Created,
    /// The file content was replaced
    Updated,
    /// Only owner, group or mode changed
    Metadata,
    /// The file was removed
    Removed,
    /// Nothing changed
    Unchanged,
}

impl Change {
    /// Whether dependents should be notified.
    pub fn is_change(&self) -> bool {
        !matches!(self, Change::Unchanged)
    }
}

impl std::fmt::Display for Change {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Change::Created => "created",
            Change::Updated => "updated",
            Change::Metadata => "metadata",
            Change::Removed => "removed",
            Change::Unchanged => "unchanged",
        };
        f.write_str(s)
    }
}

/// Outcome of realizing one target
#[derive(Debug, Clone, Serialize)]
pub struct TargetReport {
    pub title: String,
    pub path: PathBuf,
    pub change: Change,
    /// Unified diff of a content update, when `show_diff` is on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
}

/// Options for phase 3
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Prefix prepended to every target path
    pub root: Option<PathBuf>,
    /// Compute changes without touching the filesystem or running notify commands
    pub noop: bool,
}

impl WriteOptions {
    /// Where a target path is written, taking `root` into account.
    ///
    /// Target paths are absolute and free of `..`, so the result stays
    /// under `root`.
    pub fn destination(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some(root) => root.join(path.strip_prefix("/").unwrap_or(path)),
            None => path.to_path_buf(),
        }
    }
}

/// Summary of a complete run
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub noop: bool,
    pub targets: Vec<TargetReport>,
    pub failures: Vec<Failure>,
    pub warnings: Vec<String>,
}

impl Report {
    /// Targets that changed (or would change).
    pub fn changed(&self) -> impl Iterator<Item = &TargetReport> {
        self.targets.iter().filter(|t| t.change.is_change())
    }

    pub fn has_changes(&self) -> bool {
        self.changed().next().is_some()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}
