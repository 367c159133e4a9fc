//! Output helpers for consistent CLI output.
//!
//! Status messages with coloured prefixes, following cargo-like patterns.
//!
//! # Example
//!
//! ```rust,ignore
//! use mkit::output::Output;
//!
//! Output::success("Pushed jozu.ml/acme/titanic-survivability:latest");
//! Output::running("kit push jozu.ml/acme/titanic-survivability:latest");
//! ```

use owo_colors::OwoColorize;

/// Standard output helper for consistent CLI formatting.
pub struct Output;

impl Output {
    /// Print a success message with a green checkmark.
    ///
    /// Example: `✓ Updated code section`
    pub fn success(msg: impl AsRef<str>) {
        println!("{} {}", "✓".green().bold(), msg.as_ref());
    }

    /// Print an error message with a red X to stderr.
    pub fn error(msg: impl AsRef<str>) {
        eprintln!("{} {}", "✗".red().bold(), msg.as_ref().red());
    }

    /// Print a warning message with a yellow warning symbol.
    pub fn warning(msg: impl AsRef<str>) {
        println!("{} {}", "⚠".yellow(), msg.as_ref());
    }

    /// Print an info/status message with a cyan arrow.
    pub fn info(msg: impl AsRef<str>) {
        println!("{} {}", "→".cyan(), msg.as_ref().dimmed());
    }

    /// Print a header/section title.
    ///
    /// Example: `Kitfile Contents...`
    pub fn header(msg: impl AsRef<str>) {
        println!("\n{}\n", msg.as_ref().bold().cyan());
    }

    /// Print a key-value pair with alignment.
    pub fn kv(key: impl AsRef<str>, value: impl AsRef<str>) {
        println!("  {:<14} {}", format!("{}:", key.as_ref()).cyan(), value.as_ref());
    }

    /// Print a hint/suggestion message (indented with arrow).
    pub fn hint(msg: impl AsRef<str>) {
        println!("  {} {}", "→".cyan(), msg.as_ref());
    }

    /// Print a dry-run message.
    ///
    /// Example: `[dry-run] Would run: kit logout jozu.ml`
    pub fn dry_run(msg: impl AsRef<str>) {
        println!("{} {}", "[dry-run]".dimmed(), msg.as_ref().dimmed());
    }

    /// Print the running command (for transparency).
    ///
    /// Example: `Running: kit pack . -t jozu.ml/acme/titanic-survivability:latest`
    pub fn running(cmd: impl AsRef<str>) {
        println!("{} {}", "Running:".dimmed(), cmd.as_ref().dimmed());
    }

    /// Print a block of text verbatim.
    pub fn raw(text: impl AsRef<str>) {
        println!("{}", text.as_ref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_methods_dont_panic() {
        Output::success("test");
        Output::error("test");
        Output::warning("test");
        Output::info("test");
        Output::header("test");
        Output::hint("test");
        Output::dry_run("test");
        Output::running("test");
        Output::kv("key", "value");
        Output::raw("code:\n- path: train.py");
    }
}
