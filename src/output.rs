//! # Output Configuration
//!
//! Controls how `modsync` prints user-facing results: whether markers are
//! emoji or plain text, based on the `--color` flag and the terminal.
//!
//! In `auto` mode the following environment variables are honoured:
//! - `NO_COLOR` disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` disables colors
//! - `CLICOLOR_FORCE=1` forces colors even in non-TTY
//! - `TERM=dumb` disables colors
//!
//! ```rust,ignore
//! use modsync::output::{OutputConfig, emoji};
//!
//! let config = OutputConfig::from_env_and_flag("auto");
//! println!("{} ns/repo", emoji(&config, "🚀", "[PUSHED]"));
//! ```

use std::env;

use crate::sync::{ModuleOutcome, ModuleReport};

/// Output configuration for controlling colors and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// `color_flag` is the value of `--color`: "always", "never" or "auto".
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
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

    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

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

/// The emoji when colors are enabled, otherwise the plain alternative.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// One summary line for a module.
pub fn module_line(config: &OutputConfig, report: &ModuleReport) -> String {
    let (marker, text) = match &report.outcome {
        ModuleOutcome::Pushed => (emoji(config, "🚀", "[PUSHED]"), "changes pushed".to_string()),
        ModuleOutcome::Unchanged => (emoji(config, "✅", "[OK]"), "no changes".to_string()),
        ModuleOutcome::Previewed(changes) if changes.has_changes() => (
            emoji(config, "📝", "[NOOP]"),
            format!("would change ({} new file(s))", changes.added.len()),
        ),
        ModuleOutcome::Previewed(_) => (emoji(config, "✅", "[NOOP]"), "no changes".to_string()),
        ModuleOutcome::Offline => (emoji(config, "📴", "[OFFLINE]"), "rendered locally".to_string()),
        ModuleOutcome::Skipped(reason) => (emoji(config, "⚠️", "[SKIPPED]"), reason.clone()),
    };
    format!("{} {}: {}", marker, report.name, text)
}
