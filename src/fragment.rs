//! # Fragments
//!
//! A fragment is a named, ordered piece of content contributed toward a
//! target file. Fragments are validated when they are constructed, so every
//! `Fragment` value held by the registry is known to be well formed:
//!
//! - its order key contains none of `/`, `:` or `\n`;
//! - it carries exactly one of literal `content` or a list of `source`
//!   candidates;
//! - it names the target it joins.

use crate::defaults::DEFAULT_ORDER;
use crate::error::{Error, Result};
use serde::Serialize;

/// Characters an order value may not contain.
pub const FORBIDDEN_ORDER_CHARS: [char; 3] = ['/', ':', '\n'];

/// Where the bytes of a fragment come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentBody {
    /// Literal content, emitted verbatim
    Content(String),
    /// Candidate source references, tried in order; the first one that exists wins
    Source(Vec<String>),
}

impl FragmentBody {
    /// Build a body from the optional `content` and `source` attributes.
    ///
    /// Exactly one of the two must be set.
    pub fn from_parts(
        fragment: &str,
        content: Option<String>,
        source: Option<Vec<String>>,
    ) -> Result<Self> {
        match (content, source) {
            (Some(_), Some(_)) => Err(Error::ContentConflict {
                fragment: fragment.to_string(),
            }),
            (None, None) => Err(Error::ContentMissing {
                fragment: fragment.to_string(),
            }),
            (Some(content), None) => Ok(FragmentBody::Content(content)),
            (None, Some(sources)) => Ok(FragmentBody::Source(sources)),
        }
    }
}

/// A validated fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fragment {
    name: String,
    target: String,
    tag: Option<String>,
    order: String,
    body: FragmentBody,
}

impl Fragment {
    /// Create a fragment with the default order.
    pub fn new(
        name: impl Into<String>,
        target: impl Into<String>,
        body: FragmentBody,
    ) -> Result<Self> {
        let name = name.into();
        let target = target.into();
        if target.is_empty() {
            return Err(Error::TargetNotSet { fragment: name });
        }
        Ok(Self {
            name,
            target,
            tag: None,
            order: DEFAULT_ORDER.to_string(),
            body,
        })
    }

    /// Shorthand for a fragment with literal content.
    pub fn with_content(
        name: impl Into<String>,
        target: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Self> {
        Self::new(name, target, FragmentBody::Content(content.into()))
    }

    /// Replace the order key, validating it.
    pub fn with_order(mut self, order: impl Into<String>) -> Result<Self> {
        let order = order.into();
        validate_order(&self.name, &order)?;
        self.order = order;
        Ok(self)
    }

    /// Set the collection tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn order(&self) -> &str {
        &self.order
    }

    pub fn body(&self) -> &FragmentBody {
        &self.body
    }
}

/// Check an order value against the forbidden characters.
///
/// # Examples
///
/// ```
/// use concat_fragments::fragment::validate_order;
///
/// assert!(validate_order("motd", "01").is_ok());
/// assert!(validate_order("motd", "1:2").is_err());
/// ```
pub fn validate_order(fragment: &str, order: &str) -> Result<()> {
    match order.chars().find(|c| FORBIDDEN_ORDER_CHARS.contains(c)) {
        Some(character) => Err(Error::InvalidOrder {
            fragment: fragment.to_string(),
            order: order.to_string(),
            character,
        }),
        None => Ok(()),
    }
}
