//! # Concat Fragments Library
//!
//! This library assembles managed files from independently declared
//! fragments. Any number of manifests may contribute fragments to a target
//! file; the fragments are ordered deterministically and concatenated, and
//! the result is written only when it differs from what is on disk.
//!
//! ## Quick Example
//!
//! ```
//! use concat_fragments::aggregate::Aggregator;
//! use concat_fragments::filesystem::MemoryFS;
//! use concat_fragments::fragment::Fragment;
//! use concat_fragments::registry::FragmentRegistry;
//! use concat_fragments::target::Target;
//!
//! let mut registry = FragmentRegistry::new();
//! registry.declare_target(Target::at("/etc/motd").unwrap().with_ensure_newline(true)).unwrap();
//! registry
//!     .register(Fragment::with_content("body", "/etc/motd", "Have fun").unwrap().with_order("20").unwrap())
//!     .unwrap();
//! registry
//!     .register(Fragment::with_content("header", "/etc/motd", "Welcome").unwrap().with_order("05").unwrap())
//!     .unwrap();
//!
//! let target = registry.target("/etc/motd").unwrap();
//! let fragments = registry.fragments_for("/etc/motd").unwrap();
//! let fs = MemoryFS::new();
//! let content = Aggregator::new(&fs)
//!     .aggregate(&fragments, target.order(), target.ensure_newline())
//!     .unwrap();
//! assert_eq!(content, b"Welcome\nHave fun\n");
//! ```
//!
//! ## Core Concepts
//!
//! - **Manifests (`config`)**: YAML files declaring `concat_file` targets and
//!   `concat_fragment` pieces, and discovery of those files on disk.
//! - **Fragments and Targets (`fragment`, `target`)**: Validated declarations.
//!   Invalid order values, conflicting content/source and relative paths are
//!   rejected when these values are built.
//! - **Registry (`registry`)**: Collects every target and fragment of a run
//!   and answers which fragments belong to which target.
//! - **Aggregation (`aggregate`)**: Orders fragments in numeric or alpha mode
//!   and concatenates their content.
//! - **Sources (`source`, `filesystem`)**: Resolve `source` references on the
//!   local filesystem or in memory.
//! - **Phases (`phases`)**: The collect, render and write pipeline.
//!
//! ## Execution Flow
//!
//! The main entry point is `phases::orchestrator`, which executes:
//!
//! 1.  **Collection**: Validate declarations and fill the registry.
//! 2.  **Rendering**: Aggregate each present target exactly once.
//! 3.  **Writing**: Write changed files atomically, apply file attributes and
//!     run notify commands.

pub mod aggregate;
pub mod config;
pub mod defaults;
pub mod error;
pub mod filesystem;
pub mod fragment;
pub mod output;
pub mod phases;
pub mod registry;
pub mod source;
pub mod suggestions;
pub mod target;

#[cfg(test)]
mod aggregate_proptest;
