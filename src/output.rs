//! # Output Configuration
//!
//! This module provides utilities for controlling CLI output appearance,
//! including color and emoji support based on terminal capabilities and
//! user preferences, and the text and JSON renderings of a run [`Report`].
//!
//! ## Respecting User Preferences
//!
//! The module respects the following environment variables and flags:
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals
//!
//! ## Usage
//!
//! ```rust,ignore
//! use concat_fragments::output::{OutputConfig, emoji};
//!
//! let config = OutputConfig::from_env_and_flag("auto");
//! println!("{} Rendering...", emoji(&config, "🔍", "[SCAN]"));
//! ```

use std::env;
use std::fmt::Write;

use crate::error::Result;
use crate::phases::{Change, Report};

/// Output configuration for controlling colors and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// # Arguments
    /// * `color_flag` - The value of the --color CLI flag: "always", "never", or "auto"
    ///
    /// In auto mode, colors are disabled if `NO_COLOR` is set, `CLICOLOR=0`,
    /// `TERM=dumb`, or stdout is not a TTY (unless `CLICOLOR_FORCE=1`).
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // The presence of the variable (even if empty) disables colors
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    /// Create a configuration with colors always enabled.
    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    /// Create a configuration with colors always disabled.
    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Returns the emoji when colors are enabled, the plain text otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

fn change_marker<'a>(config: &OutputConfig, change: Change) -> &'a str {
    match change {
        Change::Created => emoji(config, "✨", "[CREATE]"),
        Change::Updated => emoji(config, "✏️", "[UPDATE]"),
        Change::Metadata => emoji(config, "🔧", "[META]"),
        Change::Removed => emoji(config, "🗑️", "[REMOVE]"),
        Change::Unchanged => emoji(config, "✅", "[OK]"),
    }
}

/// Render a report as human-readable text.
///
/// Unchanged targets are listed only when `verbose` is set. Diffs are
/// included when `show_diffs` is set.
pub fn format_report(config: &OutputConfig, report: &Report, verbose: bool, show_diffs: bool) -> String {
    let mut text = String::new();
    let prefix = if report.noop { "(noop) " } else { "" };

    for target in &report.targets {
        if !verbose && !target.change.is_change() {
            continue;
        }
        let _ = writeln!(
            text,
            "{} {}{}: {}",
            change_marker(config, target.change),
            prefix,
            target.path.display(),
            target.change
        );
        if let (true, Some(diff)) = (show_diffs, &target.diff) {
            for line in diff.lines() {
                let _ = writeln!(text, "    {}", line);
            }
        }
    }

    for warning in &report.warnings {
        let _ = writeln!(text, "{} {}", emoji(config, "⚠️", "[WARN]"), warning);
    }

    for failure in &report.failures {
        let _ = writeln!(
            text,
            "{} {}: {}",
            emoji(config, "❌", "[ERR]"),
            failure.item,
            failure.message
        );
    }

    let changed = report.changed().count();
    let _ = writeln!(
        text,
        "{} target(s) {}, {} unchanged, {} failure(s)",
        changed,
        if report.noop { "would change" } else { "changed" },
        report.targets.len() - changed,
        report.failures.len()
    );

    text
}

/// Render a report as pretty-printed JSON.
pub fn format_report_json(report: &Report) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}
