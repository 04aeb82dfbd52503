//! Output formatting utilities for CLI commands

use colored::Colorize;

/// Print a section heading (resource/class banner)
pub fn heading(msg: &str) {
    println!("{}", msg.bold());
}

/// Print error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print warning message
pub fn warning(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}
