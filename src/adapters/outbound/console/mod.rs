//! Console output helpers for the scan summary.

use owo_colors::OwoColorize;

/// Writes user-facing scan output to stderr, leaving stdout free for
/// machine-readable report content.
pub struct Console;

impl Console {
    pub fn section(title: &str) {
        eprintln!();
        eprintln!("{}", title.bold().underline());
    }

    pub fn info(message: &str) {
        eprintln!("  {}", message);
    }

    pub fn success(message: &str) {
        eprintln!("  {} {}", "✓".green(), message);
    }

    pub fn warning(message: &str) {
        eprintln!("  {} {}", "!".yellow(), message.yellow());
    }

    pub fn error(message: &str) {
        eprintln!("  {} {}", "✗".red(), message.red());
    }

    pub fn finding(cpe: &str, count: usize) {
        eprintln!(
            "  {} {} ({} {})",
            "✗".red(),
            cpe,
            count.red().bold(),
            if count == 1 { "CVE" } else { "CVEs" }
        );
    }
}
