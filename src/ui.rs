//! Human-facing messages. Standard output is reserved for results, so
//! everything here goes to stderr.

use colored::Colorize;

/// Print a warning message
pub fn warn(msg: &str) {
    eprintln!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}
