//! Writer implementations

pub mod console;
pub mod file;
pub mod json;

pub use console::ConsoleWriter;
pub use file::FileWriter;
pub use json::JsonWriter;

use crate::config::Configuration;
use crate::core::{InternalLogger, LoggerError, Result};
use crate::pattern::{FormatPatternParser, Token};
use std::path::PathBuf;

/// Format pattern used when a writer block has no `pattern` property
pub const DEFAULT_PATTERN: &str = "{date} [{thread}] {level}: {message}";

pub const PATTERN_KEY: &str = "pattern";
pub const FILE_KEY: &str = "file";
pub const APPEND_KEY: &str = "append";
pub const BUFFERED_KEY: &str = "buffered";

/// Compile the format pattern of a writer block
///
/// `format` is accepted as an alias of `pattern`.
pub(crate) fn compile_pattern(
    configuration: &Configuration,
    diagnostics: &InternalLogger,
) -> Box<dyn Token> {
    let pattern = configuration
        .get(PATTERN_KEY)
        .or_else(|| configuration.get("format"))
        .unwrap_or(DEFAULT_PATTERN);

    FormatPatternParser::new(diagnostics.clone()).parse(pattern)
}

pub(crate) fn file_path(configuration: &Configuration, writer: &str) -> Result<PathBuf> {
    configuration
        .get(FILE_KEY)
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| LoggerError::config(writer, "File name is missing"))
}

/// Boolean property of a writer block, reporting invalid values
pub(crate) fn flag(
    configuration: &Configuration,
    key: &str,
    writer: &str,
    diagnostics: &InternalLogger,
) -> bool {
    configuration.get_bool(key).unwrap_or_else(|e| {
        diagnostics.error(format!("Writer \"{}\": {}", writer, e));
        None
    }) == Some(true)
}
