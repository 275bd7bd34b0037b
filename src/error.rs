//! # Error Handling
//!
//! This module defines the centralized error type for `concat-fragments`. It
//! uses the `thiserror` library to build a single `Error` enum that covers
//! every failure mode of the library, with messages that carry the offending
//! value so they can be shown to users as-is.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum. Variants fall into four groups:
//!   - declaration validation (`InvalidDeclaration`, `InvalidOrder`, `ContentConflict`,
//!     `ContentMissing`, `TargetNotSet`, `PathNotAbsolute`, `InvalidValue`,
//!     `DuplicateFragment`, `DuplicateTarget`), raised when a fragment or
//!     target is constructed or registered;
//!   - source resolution (`SourceNotFound`, `Source`), raised while a
//!     target's content is aggregated;
//!   - realization (`ValidateCmd`, `Attribute`, `Notify`, `Filesystem`),
//!     raised while the rendered file is written;
//!   - wrapped errors from the standard library and third-party crates.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.

use thiserror::Error;

/// Main error type for concat-fragments operations
#[derive(Error, Debug)]
pub enum Error {
    /// A manifest could not be parsed.
    ///
    /// This error includes the specific parsing issue and optionally a hint
    /// about how to fix it.
    #[error("Manifest parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the manifest
        hint: Option<String>,
    },

    /// A declaration's attributes do not have the expected types.
    #[error("Invalid declaration: {message}")]
    InvalidDeclaration { message: String },

    /// A fragment order value contains a forbidden character.
    #[error("Invalid order '{order}' for fragment '{fragment}': order cannot contain {character:?} (forbidden: '/', ':', '\\n')")]
    InvalidOrder {
        fragment: String,
        order: String,
        character: char,
    },

    /// A fragment sets both `source` and `content`.
    #[error("Can't use 'source' and 'content' at the same time (fragment '{fragment}')")]
    ContentConflict { fragment: String },

    /// A fragment sets neither `source` nor `content`.
    #[error("Set either 'source' or 'content' (fragment '{fragment}')")]
    ContentMissing { fragment: String },

    /// A fragment does not name the target it belongs to.
    #[error("Target not set (fragment '{fragment}')")]
    TargetNotSet { fragment: String },

    /// A target path is relative.
    #[error("File paths must be fully qualified, not '{path}'")]
    PathNotAbsolute { path: String },

    /// A parameter was given a value outside its accepted set.
    #[error("Invalid value \"{value}\" for {parameter}. Valid values are {expected}")]
    InvalidValue {
        parameter: String,
        value: String,
        expected: String,
    },

    /// Two fragments with the same name were registered for one target.
    #[error("Duplicate fragment '{name}' for target '{target}'")]
    DuplicateFragment { target: String, name: String },

    /// Two targets share a title or a path.
    #[error("Duplicate target declaration: {identity}")]
    DuplicateTarget { identity: String },

    /// None of the source candidates of a fragment exist.
    #[error("Could not retrieve source(s) {}", sources.join(", "))]
    SourceNotFound { sources: Vec<String> },

    /// A source reference could not be read or is not supported.
    #[error("Source error for '{reference}': {message}")]
    Source { reference: String, message: String },

    /// The validation command rejected the rendered content.
    #[error("Validation of '{path}' failed with `{command}`: {message}")]
    ValidateCmd {
        path: String,
        command: String,
        message: String,
    },

    /// Owner, group or mode could not be resolved or applied.
    #[error("File attribute error for '{path}': {message}")]
    Attribute { path: String, message: String },

    /// A notify command failed after the target changed.
    #[error("Notify command `{command}` failed: {message}")]
    Notify { command: String, message: String },

    /// A filesystem operation failed while realizing a target.
    #[error("Filesystem operation error: {message}")]
    Filesystem { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON serialization error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    /// An error while walking the matches of a glob pattern.
    #[error("Glob walk error: {0}")]
    GlobWalk(#[from] glob::GlobError),

    /// An error while walking a manifest directory.
    #[error("Directory walk error: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl Error {
    /// Returns true for errors raised while validating a declaration.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidDeclaration { .. }
                | Error::InvalidOrder { .. }
                | Error::ContentConflict { .. }
                | Error::ContentMissing { .. }
                | Error::TargetNotSet { .. }
                | Error::PathNotAbsolute { .. }
                | Error::InvalidValue { .. }
                | Error::DuplicateFragment { .. }
                | Error::DuplicateTarget { .. }
        )
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_config_parse() {
        let error = Error::ConfigParse {
            message: "Expected a sequence".to_string(),
            hint: None,
        };
        let display = format!("{}", error);
        assert!(display.contains("Manifest parsing error"));
        assert!(display.contains("Expected a sequence"));
        assert!(!display.contains("hint:"));
    }

    #[test]
    fn test_error_display_config_parse_with_hint() {
        let error = Error::ConfigParse {
            message: "Unknown declaration 'file'".to_string(),
            hint: Some("Use 'concat_file' or 'concat_fragment'".to_string()),
        };
        let display = format!("{}", error);
        assert!(display.contains("hint:"));
        assert!(display.contains("concat_fragment"));
    }

    #[test]
    fn test_error_display_invalid_order_names_character() {
        let error = Error::InvalidOrder {
            fragment: "header".to_string(),
            order: "1:2".to_string(),
            character: ':',
        };
        let display = format!("{}", error);
        assert!(display.contains("'1:2'"));
        assert!(display.contains("cannot contain ':'"));
    }

    #[test]
    fn test_error_display_invalid_order_newline_is_escaped() {
        let error = Error::InvalidOrder {
            fragment: "header".to_string(),
            order: "1\n2".to_string(),
            character: '\n',
        };
        let display = format!("{}", error);
        assert!(display.contains("cannot contain '\\n'"));
    }

    #[test]
    fn test_error_display_content_conflict_mentions_both_keywords() {
        let error = Error::ContentConflict {
            fragment: "motd_header".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("'source'"));
        assert!(display.contains("'content'"));
        assert!(display.contains("at the same time"));
    }

    #[test]
    fn test_error_display_source_not_found_lists_all_candidates() {
        let error = Error::SourceNotFound {
            sources: vec!["/foo/bar".to_string(), "/foo/baz".to_string()],
        };
        assert_eq!(
            error.to_string(),
            "Could not retrieve source(s) /foo/bar, /foo/baz"
        );
    }

    #[test]
    fn test_error_display_path_not_absolute() {
        let error = Error::PathNotAbsolute {
            path: "foo/bar".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "File paths must be fully qualified, not 'foo/bar'"
        );
    }

    #[test]
    fn test_error_display_invalid_value() {
        let error = Error::InvalidValue {
            parameter: "order".to_string(),
            value: "bar".to_string(),
            expected: "alpha, numeric".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("Invalid value \"bar\""));
        assert!(display.contains("alpha, numeric"));
    }

    #[test]
    fn test_error_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let error: Error = io_error.into();
        let display = format!("{}", error);
        assert!(display.contains("I/O error"));
        assert!(display.contains("File not found"));
    }

    #[test]
    fn test_error_from_yaml_error() {
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("invalid: [unclosed").unwrap_err();
        let error: Error = yaml_error.into();
        assert!(error.to_string().contains("YAML parsing error"));
    }

    #[test]
    fn test_is_validation() {
        assert!(Error::ContentMissing {
            fragment: "a".to_string()
        }
        .is_validation());
        assert!(!Error::SourceNotFound { sources: vec![] }.is_validation());
        assert!(!Error::Filesystem {
            message: "boom".to_string()
        }
        .is_validation());
    }
}
