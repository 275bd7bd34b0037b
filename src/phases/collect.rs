//! Phase 1: Collection
//!
//! This is the first phase of a concat run. It turns the declarations of
//! every loaded manifest into validated targets and fragments and registers
//! them in a single `FragmentRegistry`.
//!
//! ## Process
//!
//! 1.  **Validation**: Each declaration is converted independently. A
//!     declaration that fails validation (forbidden order character, both or
//!     neither of `content`/`source`, relative path, duplicate name) is
//!     recorded as a `Failure` and skipped.
//!
//! 2.  **Registration**: Valid targets and fragments are registered in
//!     manifest order. Manifest order carries no meaning beyond which of two
//!     duplicates is reported.
//!
//! 3.  **Orphan Detection**: Fragments whose target is not declared anywhere
//!     are logged as warnings.

use log::debug;

use super::{Collected, Failure, LoadedManifest};
use crate::config::Declaration;
use crate::error::Error;
use crate::registry::FragmentRegistry;

/// Execute Phase 1: build the registry from loaded manifests
pub fn execute(manifests: &[LoadedManifest]) -> Collected {
    let mut registry = FragmentRegistry::new();
    let mut failures = Vec::new();

    for loaded in manifests {
        let origin = loaded
            .path
            .as_ref()
            .map(|p| format!(" ({})", p.display()))
            .unwrap_or_default();

        for declaration in &loaded.manifest {
            let label = declaration.label();
            let result = match declaration.clone() {
                Declaration::ConcatFile(decl) => decl
                    .into_target()
                    .and_then(|target| registry.declare_target(target)),
                Declaration::ConcatFragment(decl) => decl
                    .into_fragment(loaded.base_dir())
                    .and_then(|fragment| registry.register(fragment)),
                Declaration::Malformed { message, .. } => {
                    Err(Error::InvalidDeclaration { message })
                }
            };

            match result {
                Ok(()) => debug!("Registered {}{}", label, origin),
                Err(e) => failures.push(Failure::new(format!("{}{}", label, origin), &e)),
            }
        }
    }

    let warnings = registry.warn_orphans();

    Collected {
        registry,
        failures,
        warnings,
    }
}
