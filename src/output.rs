//! # Output
//!
//! Terminal presentation of walk results. Emoji and color are used only when
//! the terminal and the user allow it:
//!
//! - `--color=never|always|auto` on the command line
//! - `NO_COLOR` set (any value) disables them
//! - `CLICOLOR=0` disables them, `CLICOLOR_FORCE=1` forces them
//! - `TERM=dumb` disables them
//!
//! ```rust,ignore
//! use pipeline_reuse::output::{emoji, OutputConfig};
//!
//! let out = OutputConfig::from_env_and_flag("auto");
//! println!("{} saved file release.yaml", emoji(&out, "💾", "[SAVED]"));
//! ```

use std::env;
use std::path::Path;

use console::style;

use crate::walk::WalkReport;

#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub use_color: bool,
}

impl OutputConfig {
    /// Build from the `--color` flag value, falling back to the environment
    /// in `auto` mode.
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

/// The emoji when color is enabled, otherwise the plain marker.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

fn display(root: &Path, path: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

/// Lines describing a finished walk: one per saved or generated file, one
/// per failure and a closing summary.
pub fn report_lines(config: &OutputConfig, report: &WalkReport, root: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    for path in &report.generated {
        lines.push(format!(
            "{} generated {}",
            emoji(config, "📄", "[NEW]"),
            display(root, path)
        ));
    }
    for path in &report.saved {
        lines.push(format!(
            "{} saved {}",
            emoji(config, "💾", "[SAVED]"),
            display(root, path)
        ));
    }
    for failure in &report.failed {
        let marker = emoji(config, "❌", "[FAILED]");
        let message = if config.use_color {
            style(failure.to_string()).red().to_string()
        } else {
            failure.to_string()
        };
        lines.push(format!("{} {}", marker, message));
    }

    let summary = format!(
        "{} saved, {} generated, {} unchanged, {} skipped, {} failed",
        report.saved.len(),
        report.generated.len(),
        report.unchanged,
        report.skipped,
        report.failed.len()
    );
    let marker = if report.has_failures() {
        emoji(config, "⚠️ ", "[WARN]")
    } else {
        emoji(config, "✅", "[OK]")
    };
    lines.push(format!("{} {}", marker, summary));
    lines
}

/// Print [`report_lines`] to stdout.
pub fn print_report(config: &OutputConfig, report: &WalkReport, root: &Path) {
    for line in report_lines(config, report, root) {
        println!("{}", line);
    }
}
