//! # Manifest Schema and Parsing
//!
//! This module defines the data structures that represent a manifest file,
//! as well as the logic for parsing it and for discovering manifest files on
//! disk.
//!
//! ## Format
//!
//! A manifest is a YAML sequence of declarations. Each declaration is a
//! single-key mapping naming its kind:
//!
//! ```yaml
//! - concat_file:
//!     title: apiserver
//!     path: /etc/kubernetes/apiserver
//!     ensure_newline: true
//!     mode: "0644"
//! - concat_fragment:
//!     name: header
//!     target: apiserver
//!     order: "01"
//!     content: "# managed file\n"
//! ```
//!
//! `concat` and `concat::fragment` are accepted as aliases of `concat_file`
//! and `concat_fragment`. Declarations are only deserialized here; turning
//! them into validated [`Target`]s and [`Fragment`]s is a separate step so
//! that one invalid declaration does not prevent the rest of a manifest from
//! being read.

use crate::defaults::MANIFEST_EXTENSIONS;
use crate::error::{Error, Result};
use crate::fragment::{Fragment, FragmentBody};
use crate::target::{parse_flag, parse_mode, Ensure, FileAttributes, OrderMode, Target};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// A scalar that manifests may spell as a string or as a number
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Text(String),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Scalar::Int(i) => i.to_string(),
            Scalar::Text(s) => s,
        }
    }
}

/// A boolean that manifests may spell as `true`/`false` or `"yes"`/`"no"`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Flag {
    Bool(bool),
    Text(String),
}

impl Flag {
    fn resolve(&self, parameter: &str) -> Result<bool> {
        match self {
            Flag::Bool(b) => Ok(*b),
            Flag::Text(s) => parse_flag(parameter, s),
        }
    }
}

/// A single source reference or an ordered list of candidates
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SourceList {
    One(String),
    Many(Vec<String>),
}

impl SourceList {
    fn into_vec(self) -> Vec<String> {
        match self {
            SourceList::One(s) => vec![s],
            SourceList::Many(v) => v,
        }
    }
}

/// `concat_file` declaration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConcatFileDecl {
    /// Identity of the target; defaults to `path`
    #[serde(default)]
    pub title: Option<String>,
    /// Output file; defaults to `title`
    #[serde(default)]
    pub path: Option<String>,
    /// Collection tag; defaults to the title
    #[serde(default)]
    pub tag: Option<String>,
    /// `numeric` or `alpha`
    #[serde(default)]
    pub order: Option<String>,
    #[serde(default)]
    pub ensure_newline: Option<Flag>,
    /// `present` or `absent`
    #[serde(default)]
    pub ensure: Option<String>,
    #[serde(default)]
    pub owner: Option<Scalar>,
    #[serde(default)]
    pub group: Option<Scalar>,
    /// Octal mode. Unquoted YAML numbers are read digit for digit, so
    /// `mode: 0644` and `mode: "0644"` mean the same thing.
    #[serde(default)]
    pub mode: Option<Scalar>,
    #[serde(default)]
    pub backup: Option<String>,
    #[serde(default)]
    pub replace: Option<Flag>,
    #[serde(default)]
    pub validate_cmd: Option<String>,
    #[serde(default)]
    pub show_diff: Option<Flag>,
    /// Shell commands run after the file changed
    #[serde(default)]
    pub notify: Vec<String>,
}

/// `concat_fragment` declaration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConcatFragmentDecl {
    pub name: String,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub order: Option<Scalar>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub source: Option<SourceList>,
}

/// All declaration kinds a manifest may contain
#[derive(Debug, Clone)]
pub enum Declaration {
    /// A target file assembled from fragments.
    ConcatFile(ConcatFileDecl),
    /// A piece of content contributed to a target.
    ConcatFragment(ConcatFragmentDecl),
    /// A declaration of a known kind whose attributes have the wrong shape,
    /// such as `order: [1]`. It fails on its own during collection.
    Malformed {
        /// Report label, e.g. `Concat_fragment[header]`
        label: String,
        message: String,
    },
}

impl Declaration {
    /// Human-readable label used in reports.
    pub fn label(&self) -> String {
        match self {
            Declaration::ConcatFile(decl) => format!(
                "Concat_file[{}]",
                decl.title
                    .as_deref()
                    .or(decl.path.as_deref())
                    .unwrap_or("<untitled>")
            ),
            Declaration::ConcatFragment(decl) => format!("Concat_fragment[{}]", decl.name),
            Declaration::Malformed { label, .. } => label.clone(),
        }
    }
}

/// A parsed manifest, in file order
pub type Manifest = Vec<Declaration>;

impl ConcatFileDecl {
    /// Validate the declaration into a [`Target`].
    pub fn into_target(self) -> Result<Target> {
        let title = match (self.title, &self.path) {
            (Some(title), _) => title,
            (None, Some(path)) => path.clone(),
            (None, None) => {
                return Err(Error::PathNotAbsolute {
                    path: String::new(),
                })
            }
        };

        let mut target = Target::new(title, self.path)?;
        if let Some(tag) = self.tag {
            target = target.with_tag(tag);
        }
        if let Some(order) = self.order {
            target = target.with_order(order.parse::<OrderMode>()?);
        }
        if let Some(flag) = self.ensure_newline {
            target = target.with_ensure_newline(flag.resolve("ensure_newline")?);
        }
        if let Some(ensure) = self.ensure {
            target = target.with_ensure(ensure.parse::<Ensure>()?);
        }

        let defaults = FileAttributes::default();
        let attributes = FileAttributes {
            owner: self.owner.map(Scalar::into_string),
            group: self.group.map(Scalar::into_string),
            mode: self
                .mode
                .map(|m| parse_mode(&m.into_string()))
                .transpose()?,
            backup: self.backup,
            replace: match self.replace {
                Some(flag) => flag.resolve("replace")?,
                None => defaults.replace,
            },
            validate_cmd: self.validate_cmd,
            show_diff: match self.show_diff {
                Some(flag) => flag.resolve("show_diff")?,
                None => defaults.show_diff,
            },
        };

        Ok(target.with_attributes(attributes)?.with_notify(self.notify))
    }
}

impl ConcatFragmentDecl {
    /// Validate the declaration into a [`Fragment`].
    ///
    /// Relative source paths are anchored at `base_dir`, the directory of
    /// the manifest that declared the fragment.
    pub fn into_fragment(self, base_dir: Option<&Path>) -> Result<Fragment> {
        let target = self.target.unwrap_or_default();
        let source = self.source.map(|s| {
            s.into_vec()
                .into_iter()
                .map(|reference| anchor_source(reference, base_dir))
                .collect()
        });
        let body = FragmentBody::from_parts(&self.name, self.content, source)?;

        let mut fragment = Fragment::new(self.name, target, body)?;
        if let Some(order) = self.order {
            fragment = fragment.with_order(order.into_string())?;
        }
        if let Some(tag) = self.tag {
            fragment = fragment.with_tag(tag);
        }
        Ok(fragment)
    }
}

fn anchor_source(reference: String, base_dir: Option<&Path>) -> String {
    match base_dir {
        Some(base) if !reference.contains("://") && Path::new(&reference).is_relative() => {
            base.join(&reference).to_string_lossy().into_owned()
        }
        _ => reference,
    }
}

/// Parses a YAML string into a [`Manifest`].
pub fn parse(yaml_content: &str) -> Result<Manifest> {
    use serde_yaml::Value;

    let raw: Value = serde_yaml::from_str(yaml_content).map_err(Error::Yaml)?;
    let items = match raw {
        Value::Null => return Ok(Vec::new()),
        Value::Sequence(items) => items,
        _ => {
            return Err(Error::ConfigParse {
                message: "Manifest must be a sequence of declarations".to_string(),
                hint: Some("Start each declaration with '- concat_file:' or '- concat_fragment:'".to_string()),
            })
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| convert_declaration(idx, item))
        .collect()
}

/// Convert one YAML item to a [`Declaration`]
fn convert_declaration(idx: usize, item: serde_yaml::Value) -> Result<Declaration> {
    let map = match item {
        serde_yaml::Value::Mapping(map) if map.len() == 1 => map,
        _ => {
            return Err(Error::ConfigParse {
                message: format!("Declaration {} must be a mapping with a single key", idx),
                hint: Some("Use '- concat_file: {...}' or '- concat_fragment: {...}'".to_string()),
            })
        }
    };

    let (key, value) = map.into_iter().next().ok_or_else(|| Error::ConfigParse {
        message: format!("Declaration {} is empty", idx),
        hint: None,
    })?;

    let kind = key.as_str().ok_or_else(|| Error::ConfigParse {
        message: format!("Declaration {} key must be a string", idx),
        hint: None,
    })?;

    let malformed = |label: String, e: serde_yaml::Error| Declaration::Malformed {
        label,
        message: format!("Declaration {} ({}): {}", idx, kind, e),
    };

    match kind {
        "concat_file" | "concat" => {
            let label = raw_label("Concat_file", &value, &["title", "path"], idx);
            Ok(serde_yaml::from_value(value)
                .map(Declaration::ConcatFile)
                .unwrap_or_else(|e| malformed(label, e)))
        }
        "concat_fragment" | "concat::fragment" => {
            let label = raw_label("Concat_fragment", &value, &["name"], idx);
            Ok(serde_yaml::from_value(value)
                .map(Declaration::ConcatFragment)
                .unwrap_or_else(|e| malformed(label, e)))
        }
        other => Err(Error::ConfigParse {
            message: format!("Unknown declaration '{}' at index {}", other, idx),
            hint: Some(crate::suggestions::declaration_hint(other)),
        }),
    }
}

/// Label a declaration from its raw mapping, using the first of `keys`
/// that holds a string, or the item index.
fn raw_label(kind: &str, value: &serde_yaml::Value, keys: &[&str], idx: usize) -> String {
    let name = keys
        .iter()
        .find_map(|key| value.get(*key).and_then(serde_yaml::Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| format!("#{}", idx));
    format!("{}[{}]", kind, name)
}

/// Load and parse a manifest from a file
pub fn from_file(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::ConfigParse {
        message: format!("Failed to read manifest {}: {}", path.display(), e),
        hint: None,
    })?;
    parse(&content).map_err(|e| match e {
        Error::ConfigParse { message, hint } => Error::ConfigParse {
            message: format!("{}: {}", path.display(), message),
            hint,
        },
        Error::Yaml(e) => Error::ConfigParse {
            message: format!("{}: {}", path.display(), e),
            hint: None,
        },
        other => other,
    })
}

/// Expand manifest arguments into a sorted, de-duplicated list of files.
///
/// Each input may be a file, a directory (searched recursively for `.yaml`
/// and `.yml` files) or a glob pattern.
pub fn discover(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let mut in_dir = Vec::new();
            for entry in walkdir::WalkDir::new(input).follow_links(true) {
                let entry = entry?;
                if entry.file_type().is_file() && is_manifest(entry.path()) {
                    in_dir.push(entry.into_path());
                }
            }
            in_dir.sort();
            found.extend(in_dir);
        } else if input.exists() {
            found.push(input.clone());
        } else {
            let pattern = input.to_string_lossy();
            let mut matches = Vec::new();
            for entry in glob::glob(&pattern)? {
                let path = entry?;
                if path.is_file() {
                    matches.push(path);
                }
            }
            if matches.is_empty() {
                return Err(Error::ConfigParse {
                    message: format!("Manifest not found: {}", input.display()),
                    hint: Some("Pass a file, a directory or a glob pattern".to_string()),
                });
            }
            matches.sort();
            found.extend(matches);
        }
    }

    let mut seen = std::collections::HashSet::new();
    found.retain(|p| seen.insert(p.clone()));
    Ok(found)
}

fn is_manifest(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| MANIFEST_EXTENSIONS.contains(&e))
}
