//! Phase 2: Rendering
//!
//! Computes the desired content of every declared target. Each target is
//! aggregated exactly once, after all registration is complete. Targets
//! that ensure the file is absent are passed through without content.
//!
//! A target whose fragments cannot be resolved fails on its own; the other
//! targets still render.

use log::{debug, warn};

use super::{Failure, RenderedTarget};
use crate::aggregate::Aggregator;
use crate::error::Result;
use crate::registry::FragmentRegistry;
use crate::source::SourceResolver;
use crate::target::{Ensure, Target};

/// Execute Phase 2: aggregate every declared target
pub fn execute<'r>(
    registry: &'r FragmentRegistry,
    resolver: &dyn SourceResolver,
) -> (Vec<RenderedTarget<'r>>, Vec<Failure>) {
    let aggregator = Aggregator::new(resolver);
    let mut rendered = Vec::new();
    let mut failures = Vec::new();

    for target in registry.targets() {
        match render_target(registry, &aggregator, target) {
            Ok(result) => rendered.push(result),
            Err(e) => {
                warn!("Failed to render {}: {}", target.title(), e);
                failures.push(Failure::new(format!("Concat_file[{}]", target.title()), &e));
            }
        }
    }

    (rendered, failures)
}

fn render_target<'r>(
    registry: &FragmentRegistry,
    aggregator: &Aggregator<'_>,
    target: &'r Target,
) -> Result<RenderedTarget<'r>> {
    if target.ensure() == Ensure::Absent {
        debug!("{} ensures absent, skipping aggregation", target.title());
        return Ok(RenderedTarget {
            target,
            content: None,
            fragments: 0,
        });
    }

    let fragments = registry.fragments_of(target)?;
    let content = aggregator.aggregate(&fragments, target.order(), target.ensure_newline())?;
    debug!(
        "Rendered {} from {} fragment(s), {} bytes",
        target.title(),
        fragments.len(),
        content.len()
    );

    Ok(RenderedTarget {
        target,
        content: Some(content),
        fragments: fragments.len(),
    })
}

/// Render the content of a single target by title or path.
///
/// Identities that name no declared target render the fragments that
/// reference them directly, in numeric order without newline enforcement.
pub fn render_one(
    registry: &FragmentRegistry,
    resolver: &dyn SourceResolver,
    identity: &str,
) -> Result<Vec<u8>> {
    let aggregator = Aggregator::new(resolver);
    let fragments = registry.fragments_for(identity)?;
    match registry.target(identity) {
        Some(target) => {
            aggregator.aggregate(&fragments, target.order(), target.ensure_newline())
        }
        None => aggregator.aggregate(&fragments, Default::default(), false),
    }
}
