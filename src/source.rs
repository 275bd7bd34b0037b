//! # Source Resolution
//!
//! Fragments that do not carry literal content name one or more `source`
//! references. A [`SourceResolver`] turns a reference into bytes, or reports
//! that nothing exists behind it so the next candidate can be tried.
//!
//! [`LocalResolver`] understands the reference forms used by manifests:
//!
//! - absolute paths (`/srv/files/header`);
//! - paths relative to a base directory (`files/header`);
//! - `file://` URLs;
//! - `puppet:///modules/<module>/<path>`, served from
//!   `<modules_dir>/<module>/files/<path>`.
//!
//! The in-memory [`MemoryFS`](crate::filesystem::MemoryFS) also implements
//! the trait for embedding and tests.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::debug;
use percent_encoding::percent_decode_str;
use url::Url;

use crate::error::{Error, Result};

/// Backend that fragment sources are fetched from
pub trait SourceResolver {
    /// Fetch the bytes behind `source`.
    ///
    /// Returns `Ok(None)` when nothing exists at that reference. Any other
    /// failure is an error and must not be treated as "not found".
    fn fetch(&self, source: &str) -> Result<Option<Vec<u8>>>;
}

/// Resolves sources against the local filesystem
#[derive(Debug, Clone)]
pub struct LocalResolver {
    base_dir: PathBuf,
    modules_dir: Option<PathBuf>,
}

impl LocalResolver {
    /// Create a resolver that resolves relative paths against `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            modules_dir: None,
        }
    }

    /// Serve `puppet:///modules/...` references from `modules_dir`.
    pub fn with_modules_dir(mut self, modules_dir: impl Into<PathBuf>) -> Self {
        self.modules_dir = Some(modules_dir.into());
        self
    }

    /// Map a source reference to the local path that backs it.
    pub fn locate(&self, source: &str) -> Result<PathBuf> {
        if !source.contains("://") {
            return Ok(self.base_dir.join(source));
        }

        let url = Url::parse(source)?;
        match url.scheme() {
            "file" => url.to_file_path().map_err(|_| Error::Source {
                reference: source.to_string(),
                message: "not a local file URL".to_string(),
            }),
            "puppet" => self.locate_module_file(source, &url),
            scheme => Err(Error::Source {
                reference: source.to_string(),
                message: format!("unsupported scheme '{}'", scheme),
            }),
        }
    }

    fn locate_module_file(&self, source: &str, url: &Url) -> Result<PathBuf> {
        let modules_dir = self.modules_dir.as_ref().ok_or_else(|| Error::Source {
            reference: source.to_string(),
            message: "no modules directory configured".to_string(),
        })?;

        let mut segments = Vec::new();
        for segment in url.path_segments().into_iter().flatten() {
            if segment.is_empty() {
                continue;
            }
            let decoded = percent_decode_str(segment)
                .decode_utf8()
                .map_err(|e| Error::Source {
                    reference: source.to_string(),
                    message: format!("invalid path segment '{}': {}", segment, e),
                })?;
            if decoded == "." || decoded == ".." || decoded.contains('/') {
                return Err(Error::Source {
                    reference: source.to_string(),
                    message: format!("path segment '{}' leaves the module", decoded),
                });
            }
            segments.push(decoded.into_owned());
        }

        match segments.as_slice() {
            [modules, module, rest @ ..] if modules == "modules" && !rest.is_empty() => {
                let mut path = modules_dir.join(module).join("files");
                path.extend(rest);
                Ok(path)
            }
            _ => Err(Error::Source {
                reference: source.to_string(),
                message: "expected puppet:///modules/<module>/<path>".to_string(),
            }),
        }
    }
}

impl Default for LocalResolver {
    fn default() -> Self {
        Self::new(".")
    }
}

impl SourceResolver for LocalResolver {
    fn fetch(&self, source: &str) -> Result<Option<Vec<u8>>> {
        let path = self.locate(source)?;
        read_if_exists(source, &path)
    }
}

fn read_if_exists(source: &str, path: &Path) -> Result<Option<Vec<u8>>> {
    if path.is_dir() {
        return Err(Error::Source {
            reference: source.to_string(),
            message: format!("{} is a directory", path.display()),
        });
    }

    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("Source {} not found at {}", source, path.display());
            Ok(None)
        }
        Err(e) => Err(Error::Source {
            reference: source.to_string(),
            message: e.to_string(),
        }),
    }
}
