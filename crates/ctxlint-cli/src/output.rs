// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! CLI output styling.
//!
//! Respects NO_COLOR and FORCE_COLOR.

use colored::{ColoredString, Colorize};

/// Call once at startup.
pub fn init() {
    if std::env::var_os("NO_COLOR").is_some() {
        colored::control::set_override(false);
    } else if std::env::var_os("FORCE_COLOR").is_some() {
        colored::control::set_override(true);
    }
}

pub fn error_label() -> ColoredString {
    "error".red().bold()
}

pub fn code(code: &str) -> ColoredString {
    code.bold()
}

pub fn dimmed(text: &str) -> ColoredString {
    text.dimmed()
}

pub fn banner_ok(msg: &str) -> String {
    format!("{} {} {}", "===".dimmed(), msg.green().bold(), "===".dimmed())
}

pub fn banner_fail(msg: &str) -> String {
    format!("{} {} {}", "===".dimmed(), msg.red().bold(), "===".dimmed())
}

/// `3 warnings`, `1 error`.
pub fn count(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("1 {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_pluralizes() {
        assert_eq!(count(1, "warning"), "1 warning");
        assert_eq!(count(0, "error"), "0 errors");
        assert_eq!(count(3, "file"), "3 files");
    }
}
