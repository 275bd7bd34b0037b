//! # Fragment Registry
//!
//! The registry is the explicit replacement for a catalog-wide resource
//! lookup: every contributing manifest registers its targets and fragments
//! into one `FragmentRegistry`, and the render phase then asks it for the
//! fragments of each target.
//!
//! Declaration order is not significant. A fragment may be registered before
//! the target it references, and a fragment whose target is never declared is
//! reported as a warning rather than an error, because contributing manifests
//! may be applied independently of the one that declares the target.

use std::collections::HashSet;

use log::warn;

use crate::error::{Error, Result};
use crate::fragment::Fragment;
use crate::target::Target;

/// Holds all targets and fragments declared in one run
#[derive(Debug, Default)]
pub struct FragmentRegistry {
    targets: Vec<Target>,
    fragments: Vec<Fragment>,
}

impl FragmentRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a target.
    ///
    /// Titles and paths share one namespace: a new target may not be
    /// identified by any title or path an existing target answers to.
    pub fn declare_target(&mut self, target: Target) -> Result<()> {
        let path = target.path().to_string_lossy().into_owned();
        let clash = self.targets.iter().find(|t| {
            t.identifies(target.title())
                || t.identifies(&path)
                || target.identifies(t.title())
        });
        if let Some(existing) = clash {
            return Err(Error::DuplicateTarget {
                identity: format!(
                    "'{}' ({}) conflicts with '{}' ({})",
                    target.title(),
                    target.path().display(),
                    existing.title(),
                    existing.path().display()
                ),
            });
        }
        self.targets.push(target);
        Ok(())
    }

    /// Register a validated fragment.
    ///
    /// A second fragment with the same name and the same target reference is
    /// rejected.
    pub fn register(&mut self, fragment: Fragment) -> Result<()> {
        if self
            .fragments
            .iter()
            .any(|f| f.name() == fragment.name() && f.target() == fragment.target())
        {
            return Err(Error::DuplicateFragment {
                target: fragment.target().to_string(),
                name: fragment.name().to_string(),
            });
        }
        self.fragments.push(fragment);
        Ok(())
    }

    /// Look up a declared target by title or path.
    pub fn target(&self, identity: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.identifies(identity))
    }

    /// Declared targets, in declaration order.
    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.targets.iter()
    }

    /// All registered fragments, in registration order.
    pub fn fragments(&self) -> impl Iterator<Item = &Fragment> {
        self.fragments.iter()
    }

    /// Fragments belonging to the target named by `identity`.
    ///
    /// The returned order is unspecified; the aggregator sorts. Two fragments
    /// with the same name reaching one target through different references
    /// (its title and its path, say) are rejected.
    pub fn fragments_for(&self, identity: &str) -> Result<Vec<&Fragment>> {
        match self.target(identity) {
            Some(target) => self.fragments_of(target),
            None => unique(
                identity,
                self.fragments
                    .iter()
                    .filter(|f| f.target() == identity)
                    .collect(),
            ),
        }
    }

    /// Fragments claimed by a declared target.
    pub fn fragments_of(&self, target: &Target) -> Result<Vec<&Fragment>> {
        unique(
            target.title(),
            self.fragments.iter().filter(|f| target.claims(f)).collect(),
        )
    }

    /// Fragments that no declared target claims.
    pub fn orphans(&self) -> Vec<&Fragment> {
        self.fragments
            .iter()
            .filter(|f| !self.targets.iter().any(|t| t.claims(f)))
            .collect()
    }

    /// Log a warning for every orphaned fragment and return the messages.
    pub fn warn_orphans(&self) -> Vec<String> {
        self.orphans()
            .into_iter()
            .map(|fragment| {
                let message = format!(
                    "Target concat_file with path of {} not found in the catalog (fragment '{}')",
                    fragment.target(),
                    fragment.name()
                );
                warn!("{}", message);
                message
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty() && self.fragments.is_empty()
    }
}

fn unique<'a>(identity: &str, matched: Vec<&'a Fragment>) -> Result<Vec<&'a Fragment>> {
    let mut seen = HashSet::new();
    for fragment in &matched {
        if !seen.insert(fragment.name()) {
            return Err(Error::DuplicateFragment {
                target: identity.to_string(),
                name: fragment.name().to_string(),
            });
        }
    }
    Ok(matched)
}
