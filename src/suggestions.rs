//! # Error Suggestions
//!
//! This module provides helper functions for generating helpful error
//! messages with hints and suggestions. Errors should tell users what went
//! wrong AND how to fix it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use concat_fragments::suggestions;
//!
//! // Instead of:
//! anyhow::bail!("Manifest not found: {}", path.display());
//!
//! // Use:
//! return Err(suggestions::manifest_not_found(path));
//! ```

use std::path::Path;

/// Declaration kinds accepted in manifests
pub const DECLARATION_KINDS: [&str; 4] = ["concat_file", "concat", "concat_fragment", "concat::fragment"];

/// Generate an error for when no manifest exists at the given path.
pub fn manifest_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Manifest not found: {path}\n\n\
         hint: Create a concat.yaml file in the current directory\n\
         hint: Use -m/--manifest to specify files, directories or glob patterns\n\
         hint: Set the CONCAT_MANIFEST environment variable",
        path = path.display()
    )
}

/// Generate an error for an invalid glob pattern.
pub fn invalid_glob(pattern: &str, error: &glob::PatternError) -> anyhow::Error {
    anyhow::anyhow!(
        "Invalid glob pattern: {pattern}\n\
         error: {error}\n\n\
         hint: Use * for single path component, ** for recursive matching\n\
         hint: Quote patterns so the shell does not expand them"
    )
}

/// Generate an error for a render request that matches nothing.
///
/// Suggests a declared target with a similar title or path.
pub fn target_not_found(identity: &str, known: &[&str]) -> anyhow::Error {
    let did_you_mean = find_similar(identity, known)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();

    anyhow::anyhow!(
        "No target or fragment references '{identity}'{did_you_mean}\n\n\
         hint: Run 'concat-fragments tree' to list declared targets"
    )
}

/// Generate an error summarizing a run that had failures.
pub fn run_failed(failures: usize) -> anyhow::Error {
    anyhow::anyhow!(
        "{failures} item(s) failed\n\n\
         hint: Run 'concat-fragments validate' to check manifests without writing\n\
         hint: Re-run with --log-level debug for details"
    )
}

/// Hint for a misspelled declaration kind, if one is close enough.
pub fn declaration_hint(kind: &str) -> String {
    match find_similar(kind, &DECLARATION_KINDS) {
        Some(similar) => format!("Did you mean '{similar}'?"),
        None => format!("Supported declarations: {}", DECLARATION_KINDS.join(", ")),
    }
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Calculate the Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    // Single-row variant of the classic matrix.
    let mut row: Vec<usize> = (0..=b_chars.len()).collect();
    for (i, a_char) in a_chars.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            let next = (row[j + 1] + 1).min(row[j] + 1).min(diagonal + cost);
            diagonal = row[j + 1];
            row[j + 1] = next;
        }
    }
    row[b_chars.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_not_found_includes_hints() {
        let message = manifest_not_found(Path::new("/srv/site/concat.yaml")).to_string();
        assert!(message.contains("Manifest not found: /srv/site/concat.yaml"));
        assert!(message.contains("-m/--manifest"));
        assert!(message.contains("CONCAT_MANIFEST"));
    }

    #[test]
    fn test_target_not_found_suggests_similar() {
        let message = target_not_found("/etc/mtod", &["/etc/motd", "/etc/issue"]).to_string();
        assert!(message.contains("No target or fragment references '/etc/mtod'"));
        assert!(message.contains("Did you mean '/etc/motd'?"));

        let message = target_not_found("something", &["/etc/motd"]).to_string();
        assert!(!message.contains("Did you mean"));
    }

    #[test]
    fn test_declaration_hint() {
        assert_eq!(declaration_hint("concat_fragmnt"), "Did you mean 'concat_fragment'?");
        assert!(declaration_hint("file").starts_with("Supported declarations: concat_file"));
    }

    #[test]
    fn test_run_failed() {
        let message = run_failed(2).to_string();
        assert!(message.starts_with("2 item(s) failed"));
        assert!(message.contains("hint:"));
    }

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("concat", "concat"), 0);
        assert_eq!(edit_distance("concat_fil", "concat_file"), 1);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("", "abc"), 3);
    }

    #[test]
    fn test_find_similar() {
        assert_eq!(find_similar("concat_fle", &DECLARATION_KINDS), Some("concat_file"));
        assert_eq!(find_similar("foobar", &DECLARATION_KINDS), None);
    }
}
