use ansi_term::Style;

use crate::colors::WHITE;

/// Prints a coloured status line to stderr.
pub fn log(color: Style, prefix: &str, message: &str) {
    eprintln!("{} {}", color.paint(prefix), WHITE.paint(message));
}
