//! Shared test utilities for integration and E2E tests.
//!
//! This module provides common fixtures, helper functions, and manifest
//! snippets to reduce duplication across test files.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_manifest(manifests::MOTD);
//!     fixture.command().arg("apply").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::manifests;
    pub use super::TestFixture;
}

/// Common manifest snippets for testing.
#[allow(dead_code)]
pub mod manifests {
    /// A motd target with a header, a body from a source file and a footer.
    pub const MOTD: &str = r#"
- concat_file:
    title: motd
    path: /etc/motd
    ensure_newline: true
- concat_fragment:
    name: footer
    target: motd
    order: 99
    content: "-- managed"
- concat_fragment:
    name: body
    target: /etc/motd
    order: 50
    source: [files/missing.txt, files/body.txt]
- concat_fragment:
    name: header
    target: motd
    order: "01"
    content: "Welcome"
"#;

    /// Two fragments ordered alphabetically.
    pub const ALPHA: &str = r#"
- concat_file:
    path: /etc/alpha
    order: alpha
- concat_fragment:
    name: "1"
    target: /etc/alpha
    order: b
    content: "1"
- concat_fragment:
    name: "2"
    target: /etc/alpha
    order: a
    content: "2"
"#;

    /// A fragment with a forbidden order character.
    pub const INVALID_ORDER: &str = r#"
- concat_file:
    path: /etc/motd
- concat_fragment:
    name: bad
    target: /etc/motd
    order: "12:30"
    content: x
"#;

    /// A fragment whose target is never declared.
    pub const ORPHAN: &str = r#"
- concat_file:
    path: /etc/motd
- concat_fragment:
    name: stray
    target: /etc/nowhere
    content: x
"#;

    /// Invalid YAML for error testing.
    pub const INVALID_YAML: &str = "- concat_file: [unclosed";
}

/// A temporary directory holding a `concat.yaml` manifest, its source files
/// and a staging root that target paths are written under.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a `concat.yaml` manifest with the given content.
    pub fn with_manifest(self, content: &str) -> Self {
        self.with_file("concat.yaml", content)
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Get the path to the manifest.
    pub fn manifest_path(&self) -> PathBuf {
        self.path().join("concat.yaml")
    }

    /// Staging root passed as `--root`.
    pub fn root(&self) -> PathBuf {
        self.path().join("root")
    }

    /// Path of a target file under the staging root.
    #[allow(dead_code)]
    pub fn staged(&self, target_path: &str) -> PathBuf {
        self.root().join(target_path.trim_start_matches('/'))
    }

    /// Read a target file under the staging root.
    #[allow(dead_code)]
    pub fn read_staged(&self, target_path: &str) -> String {
        std::fs::read_to_string(self.staged(target_path)).expect("Failed to read staged file")
    }

    /// Create a command running in this fixture's directory, isolated from
    /// `CONCAT_*` variables of the calling environment.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("concat-fragments");
        cmd.current_dir(self.path())
            .env_remove("CONCAT_MANIFEST")
            .env_remove("CONCAT_ROOT")
            .env_remove("CONCAT_MODULES_DIR")
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1");
        cmd
    }

    /// Create a command for `subcommand` with `--root` pointing at the
    /// staging root.
    #[allow(dead_code)]
    pub fn staged_command(&self, subcommand: &str) -> assert_cmd::Command {
        let mut cmd = self.command();
        cmd.arg(subcommand).arg("--root").arg(self.root());
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
