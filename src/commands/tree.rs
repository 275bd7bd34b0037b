//! # Tree Command Implementation
//!
//! This module implements the `tree` subcommand, which displays every
//! declared target with its fragments in the order they are concatenated.
//!
//! ## Functionality
//!
//! - **Target Overview**: Shows each target's title, path and order mode
//! - **Fragment Order**: Lists fragments by composite sort key, with their
//!   content size or source candidates
//! - **Orphans**: Groups fragments that no declared target claims
//!
//! This command is a safe, read-only operation that does not modify any files.

use anyhow::Result;
use clap::Args;
use ptree::{print_tree, TreeItem};

use concat_fragments::aggregate::{compare_keys, sort_key};
use concat_fragments::fragment::{Fragment, FragmentBody};
use concat_fragments::phases::phase1;
use concat_fragments::registry::FragmentRegistry;
use concat_fragments::target::OrderMode;

use super::ManifestArgs;

/// Display targets and their fragments
#[derive(Args, Debug)]
pub struct TreeArgs {
    #[command(flatten)]
    pub manifests: ManifestArgs,
}

/// Execute the `tree` command.
pub fn execute(args: TreeArgs) -> Result<()> {
    let manifests = args.manifests.load()?;
    let collected = phase1::execute(&manifests);

    let tree_root = build_tree(&collected.registry)?;
    print_tree(&tree_root).map_err(|e| anyhow::anyhow!("Failed to display tree: {}", e))?;

    for failure in &collected.failures {
        eprintln!("{}: {}", failure.item, failure.message);
    }
    Ok(())
}

/// Build the display tree for all targets in `registry`.
fn build_tree(registry: &FragmentRegistry) -> Result<TreeNode> {
    let mut children = Vec::new();
    for target in registry.targets() {
        let fragments = registry.fragments_for(target.title())?;
        children.push(TreeNode {
            label: format!(
                "{} ({}) [{}{}]",
                target.title(),
                target.path().display(),
                target.order(),
                if target.ensure_newline() { ", ensure_newline" } else { "" }
            ),
            children: fragment_nodes(fragments, target.order()),
        });
    }

    let orphans = registry.orphans();
    if !orphans.is_empty() {
        children.push(TreeNode {
            label: "(no declared target)".to_string(),
            children: fragment_nodes(orphans, OrderMode::Numeric),
        });
    }

    Ok(TreeNode {
        label: format!("{} target(s)", registry.targets().count()),
        children,
    })
}

fn fragment_nodes(fragments: Vec<&Fragment>, mode: OrderMode) -> Vec<TreeNode> {
    let mut keyed: Vec<(String, &Fragment)> = fragments
        .into_iter()
        .map(|f| (sort_key(f.order(), f.name(), mode), f))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| compare_keys(a, b, mode));

    keyed
        .into_iter()
        .map(|(key, fragment)| TreeNode {
            label: match fragment.body() {
                FragmentBody::Content(content) => format!("{} ({} bytes)", key, content.len()),
                FragmentBody::Source(sources) => format!("{} <- {}", key, sources.join(" | ")),
            },
            children: vec![],
        })
        .collect()
}

/// Tree node structure for ptree visualization
#[derive(Clone)]
struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeItem for TreeNode {
    type Child = TreeNode;

    fn write_self<W: std::io::Write>(
        &self,
        f: &mut W,
        _style: &ptree::Style,
    ) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> std::borrow::Cow<'_, [Self::Child]> {
        std::borrow::Cow::Borrowed(&self.children)
    }
}
