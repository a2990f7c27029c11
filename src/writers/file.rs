//! File writer implementation

use super::{compile_pattern, file_path, flag, APPEND_KEY, BUFFERED_KEY};
use crate::config::Configuration;
use crate::core::{InternalLogger, LogEntry, LoggerError, Result, ValueSet, Writer};
use crate::pattern::{Token, NEW_LINE};
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Line oriented output to a file, shared by the file based writers
pub(crate) struct FileOutput {
    path: PathBuf,
    writer: Mutex<Option<BufWriter<File>>>,
    buffered: bool,
}

impl FileOutput {
    /// Open a file, creating missing parent directories
    ///
    /// Existing content is kept with `append`, otherwise the file is truncated.
    pub(crate) fn open(path: impl Into<PathBuf>, append: bool, buffered: bool) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "creating log directory",
                    format!("Cannot create '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(&path)
            .map_err(|e| {
                LoggerError::io_operation(
                    "opening log file",
                    format!("Cannot open '{}'", path.display()),
                    e,
                )
            })?;

        Ok(Self {
            path,
            writer: Mutex::new(Some(BufWriter::new(file))),
            buffered,
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn write(&self, bytes: &[u8]) -> Result<()> {
        let mut guard = self.writer.lock();
        let writer = guard
            .as_mut()
            .ok_or_else(|| LoggerError::writer(format!("'{}' is closed", self.path.display())))?;

        writer.write_all(bytes)?;
        if !self.buffered {
            writer.flush()?;
        }
        Ok(())
    }

    pub(crate) fn flush(&self) -> Result<()> {
        if let Some(writer) = self.writer.lock().as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    pub(crate) fn close(&self) -> Result<()> {
        if let Some(mut writer) = self.writer.lock().take() {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for FileOutput {
    fn drop(&mut self) {
        // Ensure all buffered data is flushed to disk
        let _ = self.close();
    }
}

/// Writes log entries rendered by a format pattern to a file
///
/// Properties: `file` (required), `pattern`, `append` (default `false`) and
/// `buffered` (default `false`). Unbuffered writers flush after every entry.
pub struct FileWriter {
    token: Box<dyn Token>,
    output: FileOutput,
}

impl FileWriter {
    pub fn new(token: Box<dyn Token>, path: impl Into<PathBuf>, append: bool, buffered: bool) -> Result<Self> {
        Ok(Self {
            token,
            output: FileOutput::open(path, append, buffered)?,
        })
    }

    pub fn from_configuration(configuration: &Configuration, diagnostics: &InternalLogger) -> Result<Self> {
        let path = file_path(configuration, "file writer")?;
        let append = flag(configuration, APPEND_KEY, "file", diagnostics);
        let buffered = flag(configuration, BUFFERED_KEY, "file", diagnostics);

        Self::new(compile_pattern(configuration, diagnostics), path, append, buffered)
    }

    pub fn path(&self) -> &Path {
        self.output.path()
    }
}

impl Writer for FileWriter {
    fn required_values(&self) -> ValueSet {
        self.token.required_values()
    }

    fn write(&self, entry: &LogEntry) -> Result<()> {
        let mut line = String::with_capacity(256);
        self.token.render(entry, &mut line);
        line.push_str(NEW_LINE);
        self.output.write(line.as_bytes())
    }

    fn flush(&self) -> Result<()> {
        self.output.flush()
    }

    fn close(&self) -> Result<()> {
        self.output.close()
    }

    fn name(&self) -> &str {
        "file"
    }
}
