//! # Targets
//!
//! A target is the aggregation point that collects fragments and owns the
//! rendered file. It is identified by its `title`, may also be referenced by
//! its output `path`, and collects fragments carrying its `tag`.
//!
//! File metadata such as owner, group and mode is not part of aggregation;
//! it travels in a plain [`FileAttributes`] struct to the write phase.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;

use crate::defaults::VALIDATE_PLACEHOLDER;
use crate::error::{Error, Result};
use crate::fragment::Fragment;

/// Comparison strategy used to sequence fragments
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderMode {
    /// Digit-only key components compare as integers
    #[default]
    Numeric,
    /// Key components compare as plain strings
    Alpha,
}

impl FromStr for OrderMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "numeric" => Ok(OrderMode::Numeric),
            "alpha" => Ok(OrderMode::Alpha),
            _ => Err(Error::InvalidValue {
                parameter: "order".to_string(),
                value: s.to_string(),
                expected: "alpha, numeric".to_string(),
            }),
        }
    }
}

impl fmt::Display for OrderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderMode::Numeric => f.write_str("numeric"),
            OrderMode::Alpha => f.write_str("alpha"),
        }
    }
}

/// Whether the managed file should exist
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Ensure {
    #[default]
    Present,
    Absent,
}

impl FromStr for Ensure {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "present" | "file" => Ok(Ensure::Present),
            "absent" => Ok(Ensure::Absent),
            _ => Err(Error::InvalidValue {
                parameter: "ensure".to_string(),
                value: s.to_string(),
                expected: "present, absent".to_string(),
            }),
        }
    }
}

/// Pass-through metadata applied when the target file is written
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileAttributes {
    /// Owner as a numeric uid or a user name
    pub owner: Option<String>,
    /// Group as a numeric gid or a group name
    pub group: Option<String>,
    /// Permission bits
    pub mode: Option<u32>,
    /// Backup suffix for the previous content; only values starting with `.` are used
    pub backup: Option<String>,
    /// Whether existing content may be replaced
    pub replace: bool,
    /// Command run against the staged content before it is installed
    pub validate_cmd: Option<String>,
    /// Whether content changes are logged as a unified diff
    pub show_diff: bool,
}

impl Default for FileAttributes {
    fn default() -> Self {
        Self {
            owner: None,
            group: None,
            mode: None,
            backup: None,
            replace: true,
            validate_cmd: None,
            show_diff: true,
        }
    }
}

impl FileAttributes {
    /// Backup suffix, if local backups are enabled.
    pub fn backup_suffix(&self) -> Option<&str> {
        self.backup.as_deref().filter(|b| b.starts_with('.') && b.len() > 1)
    }
}

/// A declared aggregation point
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    title: String,
    path: PathBuf,
    tag: String,
    order: OrderMode,
    ensure_newline: bool,
    ensure: Ensure,
    attributes: FileAttributes,
    notify: Vec<String>,
}

impl Target {
    /// Declare a target.
    ///
    /// `path` defaults to the title, and must be absolute either way.
    pub fn new(title: impl Into<String>, path: Option<String>) -> Result<Self> {
        let title = title.into();
        let path = path.unwrap_or_else(|| title.clone());
        if !Path::new(&path).is_absolute() {
            return Err(Error::PathNotAbsolute { path });
        }
        if Path::new(&path)
            .components()
            .any(|c| c == Component::ParentDir)
        {
            return Err(Error::InvalidValue {
                parameter: "path".to_string(),
                value: path,
                expected: "an absolute path without '..' components".to_string(),
            });
        }
        Ok(Self {
            tag: title.clone(),
            title,
            path: PathBuf::from(path),
            order: OrderMode::default(),
            ensure_newline: false,
            ensure: Ensure::default(),
            attributes: FileAttributes::default(),
            notify: Vec::new(),
        })
    }

    /// Declare a target whose title is its path.
    pub fn at(path: impl Into<String>) -> Result<Self> {
        Self::new(path, None)
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn with_order(mut self, order: OrderMode) -> Self {
        self.order = order;
        self
    }

    pub fn with_ensure_newline(mut self, ensure_newline: bool) -> Self {
        self.ensure_newline = ensure_newline;
        self
    }

    pub fn with_ensure(mut self, ensure: Ensure) -> Self {
        self.ensure = ensure;
        self
    }

    /// Attach file attributes. A `validate_cmd` must contain the `%` placeholder.
    pub fn with_attributes(mut self, attributes: FileAttributes) -> Result<Self> {
        if let Some(cmd) = &attributes.validate_cmd {
            if !cmd.contains(VALIDATE_PLACEHOLDER) {
                return Err(Error::InvalidValue {
                    parameter: "validate_cmd".to_string(),
                    value: cmd.clone(),
                    expected: format!("a command containing '{}'", VALIDATE_PLACEHOLDER),
                });
            }
        }
        self.attributes = attributes;
        Ok(self)
    }

    pub fn with_notify(mut self, commands: Vec<String>) -> Self {
        self.notify = commands;
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn order(&self) -> OrderMode {
        self.order
    }

    pub fn ensure_newline(&self) -> bool {
        self.ensure_newline
    }

    pub fn ensure(&self) -> Ensure {
        self.ensure
    }

    pub fn attributes(&self) -> &FileAttributes {
        &self.attributes
    }

    pub fn notify(&self) -> &[String] {
        &self.notify
    }

    /// Whether `identity` names this target, by title or by path.
    pub fn identifies(&self, identity: &str) -> bool {
        self.title == identity || self.path == Path::new(identity)
    }

    /// Whether a fragment joins this target, by reference or by tag.
    pub fn claims(&self, fragment: &Fragment) -> bool {
        self.identifies(fragment.target()) || fragment.tag() == Some(self.tag.as_str())
    }
}

/// Parse a boolean parameter the way manifests spell it.
///
/// Accepts `true`/`yes` and `false`/`no` in any case.
pub fn parse_flag(parameter: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" => Ok(true),
        "false" | "no" => Ok(false),
        _ => Err(Error::InvalidValue {
            parameter: parameter.to_string(),
            value: value.to_string(),
            expected: "true, false, yes, no".to_string(),
        }),
    }
}

/// Parse an octal permission string such as `"0644"` or `"755"`.
pub fn parse_mode(value: &str) -> Result<u32> {
    let invalid = || Error::InvalidValue {
        parameter: "mode".to_string(),
        value: value.to_string(),
        expected: "an octal mode such as '0644'".to_string(),
    };
    if value.is_empty() || value.len() > 4 {
        return Err(invalid());
    }
    u32::from_str_radix(value, 8).map_err(|_| invalid())
}
