//! In-memory fragment sources
//!
//! [`MemoryFS`] maps source references to bytes. It lets a library user
//! serve fragment sources without touching disk, and backs most unit tests.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::source::SourceResolver;

/// In-memory filesystem keyed by the reference fragments use as `source`
#[derive(Debug, Clone, Default)]
pub struct MemoryFS {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemoryFS {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `content` under `reference`, replacing any previous content.
    pub fn insert(&mut self, reference: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.files.insert(reference.into(), content.into());
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_file(mut self, reference: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.insert(reference, content);
        self
    }

    pub fn get(&self, reference: &str) -> Option<&[u8]> {
        self.files.get(normalize(reference)).map(Vec::as_slice)
    }

    pub fn remove(&mut self, reference: &str) -> Option<Vec<u8>> {
        self.files.remove(normalize(reference))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// `file:///x` and `/x` name the same entry.
fn normalize(reference: &str) -> &str {
    reference.strip_prefix("file://").unwrap_or(reference)
}

impl SourceResolver for MemoryFS {
    fn fetch(&self, source: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.get(source).map(<[u8]>::to_vec))
    }
}
