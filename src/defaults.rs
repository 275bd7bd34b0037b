//! Default values for concat-fragments.
//!
//! This module provides centralized default values used by the library and
//! the commands, ensuring consistency and avoiding duplication.

use std::path::PathBuf;

/// Order given to fragments that do not declare one.
pub const DEFAULT_ORDER: &str = "10";

/// Separator between order and name in numeric sort keys.
pub const NUMERIC_SEPARATOR: &str = "___";

/// Separator between order and name in alpha sort keys.
pub const ALPHA_SEPARATOR: &str = "__";

/// Placeholder replaced by the staged file path in `validate_cmd`.
pub const VALIDATE_PLACEHOLDER: &str = "%";

/// File extensions recognized as manifests when scanning directories.
pub const MANIFEST_EXTENSIONS: [&str; 2] = ["yaml", "yml"];

/// Returns the manifest used when none is given on the command line.
///
/// This can be overridden by the `--manifest` CLI flag or the
/// `CONCAT_MANIFEST` environment variable.
pub fn default_manifest_path() -> PathBuf {
    PathBuf::from("concat.yaml")
}
