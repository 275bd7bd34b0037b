//! # Aggregation
//!
//! The aggregator computes the final bytes of one target from its fragments.
//! It is a pure function of the fragment set, the order mode and the
//! `ensure_newline` flag: registration order never leaks into the output, so
//! re-running with unchanged inputs reproduces byte-identical content.
//!
//! ## Algorithm
//!
//! 1. Resolve each fragment's content: literal content is used verbatim;
//!    otherwise its source candidates are fetched in order and the first
//!    existing one wins. If none exists the whole target fails.
//! 2. With `ensure_newline`, content not ending in `\n` gets one appended.
//! 3. Each fragment gets a composite sort key, `order___name` in numeric mode
//!    and `order__name` in alpha mode.
//! 4. Keys are split on the separator into at most two parts and compared
//!    part by part. In numeric mode an all-digit part is an integer and sorts
//!    before any textual part; in alpha mode every part is a plain string.
//!    The raw key breaks remaining ties (`"01"` and `"1"` are numerically
//!    equal).
//! 5. The sorted contents are joined with no separator.

use std::cmp::Ordering;

use log::debug;

use crate::defaults::{ALPHA_SEPARATOR, NUMERIC_SEPARATOR};
use crate::error::{Error, Result};
use crate::fragment::{Fragment, FragmentBody};
use crate::source::SourceResolver;
use crate::target::OrderMode;

/// One component of a composite sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPart<'a> {
    /// Decimal digits with leading zeros stripped
    Number(&'a str),
    /// Anything else
    Text(&'a str),
}

impl<'a> KeyPart<'a> {
    fn numeric(part: &'a str) -> Self {
        if !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()) {
            KeyPart::Number(part.trim_start_matches('0'))
        } else {
            KeyPart::Text(part)
        }
    }
}

impl Ord for KeyPart<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            // Unbounded integers: a longer digit string is larger.
            (KeyPart::Number(a), KeyPart::Number(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            (KeyPart::Number(_), KeyPart::Text(_)) => Ordering::Less,
            (KeyPart::Text(_), KeyPart::Number(_)) => Ordering::Greater,
            (KeyPart::Text(a), KeyPart::Text(b)) => a.as_bytes().cmp(b.as_bytes()),
        }
    }
}

impl PartialOrd for KeyPart<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Separator placed between order and name for the given mode.
pub fn separator(mode: OrderMode) -> &'static str {
    match mode {
        OrderMode::Numeric => NUMERIC_SEPARATOR,
        OrderMode::Alpha => ALPHA_SEPARATOR,
    }
}

/// Build the composite sort key of a fragment.
///
/// # Examples
///
/// ```
/// use concat_fragments::aggregate::sort_key;
/// use concat_fragments::target::OrderMode;
///
/// assert_eq!(sort_key("01", "header", OrderMode::Numeric), "01___header");
/// assert_eq!(sort_key("a", "header", OrderMode::Alpha), "a__header");
/// ```
pub fn sort_key(order: &str, name: &str, mode: OrderMode) -> String {
    format!("{}{}{}", order, separator(mode), name)
}

/// Split a composite key into its typed components.
pub fn decompose(key: &str, mode: OrderMode) -> Vec<KeyPart<'_>> {
    key.splitn(2, separator(mode))
        .map(|part| match mode {
            OrderMode::Numeric => KeyPart::numeric(part),
            OrderMode::Alpha => KeyPart::Text(part),
        })
        .collect()
}

/// Compare two composite keys under the given mode.
pub fn compare_keys(a: &str, b: &str, mode: OrderMode) -> Ordering {
    decompose(a, mode)
        .cmp(&decompose(b, mode))
        .then_with(|| a.as_bytes().cmp(b.as_bytes()))
}

/// Computes target content from fragments
pub struct Aggregator<'r> {
    resolver: &'r dyn SourceResolver,
}

impl<'r> Aggregator<'r> {
    /// Create an aggregator that fetches `source` fragments through `resolver`.
    pub fn new(resolver: &'r dyn SourceResolver) -> Self {
        Self { resolver }
    }

    /// Compute the concatenated content of `fragments`.
    ///
    /// Fails without producing any output if a fragment's sources cannot be
    /// resolved.
    pub fn aggregate(
        &self,
        fragments: &[&Fragment],
        mode: OrderMode,
        ensure_newline: bool,
    ) -> Result<Vec<u8>> {
        let mut keyed = Vec::with_capacity(fragments.len());
        for fragment in fragments {
            let mut content = self.resolve(fragment)?;
            if ensure_newline && !content.ends_with(b"\n") {
                content.push(b'\n');
            }
            keyed.push((sort_key(fragment.order(), fragment.name(), mode), content));
        }

        keyed.sort_by(|(a, _), (b, _)| compare_keys(a, b, mode));

        debug!(
            "Aggregated {} fragment(s) in {} order: {}",
            keyed.len(),
            mode,
            keyed
                .iter()
                .map(|(key, _)| key.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(keyed.into_iter().flat_map(|(_, content)| content).collect())
    }

    /// Resolve the bytes a single fragment contributes.
    pub fn resolve(&self, fragment: &Fragment) -> Result<Vec<u8>> {
        match fragment.body() {
            FragmentBody::Content(content) => Ok(content.as_bytes().to_vec()),
            FragmentBody::Source(sources) => {
                for source in sources {
                    if let Some(bytes) = self.resolver.fetch(source)? {
                        debug!("Fragment {} resolved from {}", fragment.name(), source);
                        return Ok(bytes);
                    }
                }
                Err(Error::SourceNotFound {
                    sources: sources.clone(),
                })
            }
        }
    }
}
