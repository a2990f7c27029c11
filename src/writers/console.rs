//! Console writer implementation

use super::{compile_pattern, flag};
use crate::config::Configuration;
use crate::core::{InternalLogger, Level, LogEntry, LogEntryValue, Result, ValueSet, Writer};
use crate::pattern::{Token, NEW_LINE};
#[cfg(feature = "console")]
use colored::Colorize;
use std::io::Write;

pub const STREAM_KEY: &str = "stream";
pub const COLORS_KEY: &str = "colors";

/// Writes log entries rendered by a format pattern to stdout and stderr
///
/// Entries at or above the error threshold go to stderr, all others to
/// stdout. The `stream` property selects the routing: `out`, `err`, or
/// `err@LEVEL` for a custom threshold. The default is `err@ERROR`.
/// With the `console` feature, `colors = true` colors each line by level.
pub struct ConsoleWriter {
    token: Box<dyn Token>,
    error_threshold: Level,
    use_colors: bool,
}

impl ConsoleWriter {
    pub fn new(token: Box<dyn Token>) -> Self {
        Self {
            token,
            error_threshold: Level::Error,
            use_colors: false,
        }
    }

    pub fn from_configuration(configuration: &Configuration, diagnostics: &InternalLogger) -> Result<Self> {
        let mut writer = Self::new(compile_pattern(configuration, diagnostics));
        writer.use_colors = flag(configuration, COLORS_KEY, "console", diagnostics);

        if let Some(stream) = configuration.get(STREAM_KEY) {
            writer.error_threshold = Self::parse_stream(stream.trim()).unwrap_or_else(|| {
                diagnostics.error(format!("Invalid stream for console writer: '{}'", stream));
                Level::Error
            });
        }

        Ok(writer)
    }

    /// Route entries at or above `threshold` to stderr
    #[must_use]
    pub fn with_error_threshold(mut self, threshold: Level) -> Self {
        self.error_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    fn parse_stream(stream: &str) -> Option<Level> {
        if stream.eq_ignore_ascii_case("out") {
            Some(Level::Off)
        } else if stream.eq_ignore_ascii_case("err") {
            Some(Level::Trace)
        } else {
            let (target, level) = stream.split_once('@')?;
            if target.trim().eq_ignore_ascii_case("err") {
                level.trim().parse().ok()
            } else {
                None
            }
        }
    }

    fn is_error(&self, level: Level) -> bool {
        self.error_threshold != Level::Off && level.is_at_least_as_severe_as(self.error_threshold)
    }

    fn render(&self, entry: &LogEntry) -> String {
        let mut line = String::with_capacity(256);
        self.token.render(entry, &mut line);

        let mut line = self.colorize(line, entry.level);
        line.push_str(NEW_LINE);
        line
    }

    #[cfg(feature = "console")]
    fn colorize(&self, line: String, level: Level) -> String {
        if self.use_colors {
            line.color(level.color_code()).to_string()
        } else {
            line
        }
    }

    #[cfg(not(feature = "console"))]
    fn colorize(&self, line: String, _level: Level) -> String {
        line
    }
}

impl Writer for ConsoleWriter {
    fn required_values(&self) -> ValueSet {
        self.token.required_values().with(LogEntryValue::Level)
    }

    fn write(&self, entry: &LogEntry) -> Result<()> {
        let line = self.render(entry);

        if self.is_error(entry.level) {
            std::io::stderr().lock().write_all(line.as_bytes())?;
        } else {
            std::io::stdout().lock().write_all(line.as_bytes())?;
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        // Flush both stdout and stderr since we write to both
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.flush()
    }

    fn name(&self) -> &str {
        "console"
    }
}
