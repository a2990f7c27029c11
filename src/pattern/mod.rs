//! Format patterns
//!
//! A format pattern such as `"{date} [{thread}] {class}.{method}(): {message}"`
//! is compiled once into a tree of [`Token`]s by [`FormatPatternParser`] and
//! then rendered for every log entry.

pub mod parser;
pub mod placeholders;
pub mod style;
pub mod token;

use crate::core::{LogEntry, ValueSet};
use std::fmt;

pub use parser::FormatPatternParser;
pub use style::{IndentationToken, MaximumSizeToken, MinimumSizeToken, SizeToken};
pub use token::{BundleToken, PlainTextToken};

/// Platform line separator
pub const NEW_LINE: &str = if cfg!(windows) { "\r\n" } else { "\n" };

/// Immutable render node of a compiled format pattern
///
/// Tokens are shared between all threads that render log entries.
pub trait Token: Send + Sync + fmt::Debug {
    /// Log entry values this token reads
    fn required_values(&self) -> ValueSet;

    /// Append the rendered output for `entry`
    fn render(&self, entry: &LogEntry, output: &mut String);
}

/// Render a token into a new string
pub fn render_to_string(token: &dyn Token, entry: &LogEntry) -> String {
    let mut output = String::new();
    token.render(entry, &mut output);
    output
}
