//! Dispatch of log calls to writers

use super::location::Location;
use crate::config::{
    Configuration, LevelConfiguration, LoggingConfiguration, LoggingConfigurationParser,
    WriterRegistry, DEFAULT_TAGGED, UNTAGGED,
};
use crate::core::{
    InternalLogger, InternalSink, Level, LogEntry, LogEntryValue, LoggerError, MessageFormatter,
    Result, ThreadContext, ThreadInfo, Throwable, ValueSet, Writer, INTERNAL_TAG,
};
use crate::writing_thread::{WritingThread, DEFAULT_QUEUE_CAPACITY};
use chrono::Utc;
use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;

/// Location information a caller has to supply for an enabled level
///
/// Ordered from least to most information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OutputDetails {
    Disabled,
    EnabledWithoutLocation,
    EnabledWithCallerClassName,
    EnabledWithFullLocation,
}

impl OutputDetails {
    pub fn is_enabled(&self) -> bool {
        *self != OutputDetails::Disabled
    }
}

/// [`OutputDetails`] for each severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelVisibility {
    details: [OutputDetails; 5],
}

impl LevelVisibility {
    pub fn new(details: [OutputDetails; 5]) -> Self {
        Self { details }
    }

    /// Output details of a level, always disabled for [`Level::Off`]
    pub fn get(&self, level: Level) -> OutputDetails {
        self.details
            .get(level.ordinal())
            .copied()
            .unwrap_or(OutputDetails::Disabled)
    }

    pub fn trace(&self) -> OutputDetails {
        self.get(Level::Trace)
    }

    pub fn debug(&self) -> OutputDetails {
        self.get(Level::Debug)
    }

    pub fn info(&self) -> OutputDetails {
        self.get(Level::Info)
    }

    pub fn warn(&self) -> OutputDetails {
        self.get(Level::Warn)
    }

    pub fn error(&self) -> OutputDetails {
        self.get(Level::Error)
    }
}

/// Logging backend
///
/// Resolves the severity level for each call, builds log entries with
/// exactly the values the active writers need, writes to synchronous writers
/// directly and passes entries for asynchronous writers to the writing
/// thread.
///
/// The backend is immutable after construction and shared via `Arc`.
/// Dropping the last reference shuts it down.
///
/// # Example
///
/// ```
/// use rust_log_backend::prelude::*;
///
/// let backend = LoggingBackend::builder()
///     .configuration(
///         Configuration::new()
///             .with("level", "info")
///             .with("writer", "console")
///             .with("writer.pattern", "{level}: {message}"),
///     )
///     .build()
///     .unwrap();
///
/// let location = Location::Module(module_path!());
/// assert!(backend.is_enabled(&location, None, Level::Info));
/// assert!(!backend.is_enabled(&location, None, Level::Debug));
/// ```
pub struct LoggingBackend {
    configuration: LoggingConfiguration,
    writing_thread: Option<WritingThread>,
    diagnostics: InternalLogger,
    started: Instant,
    shut_down: AtomicBool,
}

impl LoggingBackend {
    /// Create a builder for LoggingBackend
    #[must_use]
    pub fn builder() -> BackendBuilder {
        BackendBuilder::new()
    }

    /// Whether a log entry at `level` would be output for a location and tag
    pub fn is_enabled(&self, location: &Location, tag: Option<&str>, level: Level) -> bool {
        level != Level::Off
            && level.is_at_least_as_severe_as(
                self.level_configuration(location)
                    .level(tag.unwrap_or(UNTAGGED)),
            )
    }

    /// Issue a log entry
    ///
    /// The message is formatted with `formatter` only if both a formatter
    /// and arguments are given, and converted to text only if a writer
    /// outputs it. Problems of writers are reported to the diagnostics
    /// channel and never returned to the caller.
    #[allow(clippy::too_many_arguments)]
    pub fn log(
        &self,
        location: &Location,
        tag: Option<&str>,
        level: Level,
        throwable: Option<&Throwable>,
        message: Option<&dyn Display>,
        args: &[&dyn Display],
        formatter: Option<&dyn MessageFormatter>,
    ) {
        if !self.is_enabled(location, tag, level) || self.is_shut_down() {
            return;
        }

        let repository = self
            .configuration
            .get_writers(tag.unwrap_or(UNTAGGED), level);
        if repository.is_empty() {
            return;
        }

        let entry = self.create_entry(
            repository.required_values(),
            location,
            tag,
            level,
            throwable,
            message,
            args,
            formatter,
        );

        for writer in repository.sync_writers() {
            self.write(writer, &entry);
        }

        if let Some(writing_thread) = &self.writing_thread {
            if !repository.async_writers().is_empty() {
                let entry = Arc::new(entry);
                for writer in repository.async_writers() {
                    writing_thread.enqueue(Arc::clone(writer), Arc::clone(&entry));
                }
            }
        }
    }

    /// Output details per level for a tag, independent of the location
    pub fn level_visibility_by_tag(&self, tag: Option<&str>) -> LevelVisibility {
        let tag = tag.unwrap_or(UNTAGGED);
        LevelVisibility::new(Level::ENABLED.map(|level| self.output_details(tag, level)))
    }

    /// Output details per level for a location, combined over all tags
    pub fn level_visibility_by_location(&self, location: &Location) -> LevelVisibility {
        let configuration = self.level_configuration(location);

        LevelVisibility::new(Level::ENABLED.map(|level| {
            if !level.is_at_least_as_severe_as(configuration.least_severe_level()) {
                return OutputDetails::Disabled;
            }

            configuration
                .tags()
                .chain([UNTAGGED, DEFAULT_TAGGED])
                .filter(|tag| level.is_at_least_as_severe_as(configuration.level(tag)))
                .map(|tag| self.output_details(tag, level))
                .max()
                .unwrap_or(OutputDetails::Disabled)
        }))
    }

    /// Flush all synchronous writers
    ///
    /// Asynchronous writers are flushed by the writing thread whenever its
    /// queue runs empty.
    pub fn flush(&self) {
        for writer in self.configuration.sync_writers() {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| writer.flush()));
            if let Some(error) = Self::failure(writer, result) {
                self.diagnostics
                    .error(format!("Failed to flush writer \"{}\": {}", writer.name(), error));
            }
        }
    }

    /// Write all pending entries and close all writers
    ///
    /// Only the first call has an effect. Later log calls are ignored.
    /// Asynchronous writers are closed by the writing thread after its queue
    /// is drained.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }

        self.diagnostics.detach();

        if let Some(writing_thread) = &self.writing_thread {
            writing_thread.shut_down();
            if let Err(e) = writing_thread.join() {
                self.diagnostics
                    .error(format!("Writing thread terminated abnormally: {}", e));
            }
        }

        for writer in self.configuration.sync_writers() {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| writer.close()));
            if let Some(error) = Self::failure(writer, result) {
                self.diagnostics
                    .error(format!("Failed to close writer \"{}\": {}", writer.name(), error));
            }
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    pub fn configuration(&self) -> &LoggingConfiguration {
        &self.configuration
    }

    fn level_configuration(&self, location: &Location) -> &LevelConfiguration {
        self.configuration
            .level_configuration(location.class_name())
    }

    fn output_details(&self, tag: &str, level: Level) -> OutputDetails {
        let repository = self.configuration.get_writers(tag, level);
        if repository.is_empty() {
            return OutputDetails::Disabled;
        }

        let values = repository.required_values();
        if values.contains(LogEntryValue::Method)
            || values.contains(LogEntryValue::File)
            || values.contains(LogEntryValue::Line)
        {
            OutputDetails::EnabledWithFullLocation
        } else if values.contains(LogEntryValue::Class) {
            OutputDetails::EnabledWithCallerClassName
        } else {
            OutputDetails::EnabledWithoutLocation
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn create_entry(
        &self,
        values: ValueSet,
        location: &Location,
        tag: Option<&str>,
        level: Level,
        throwable: Option<&Throwable>,
        message: Option<&dyn Display>,
        args: &[&dyn Display],
        formatter: Option<&dyn MessageFormatter>,
    ) -> LogEntry {
        let mut entry = LogEntry::new(level);

        if values.contains(LogEntryValue::Timestamp) {
            entry.timestamp = Some(Utc::now());
        }
        if values.contains(LogEntryValue::Uptime) {
            entry.uptime = Some(self.started.elapsed());
        }
        if values.contains(LogEntryValue::Thread) {
            entry.thread = Some(ThreadInfo::current());
        }
        if values.contains(LogEntryValue::Context) {
            entry.context = ThreadContext::snapshot();
        }
        if values.contains(LogEntryValue::Class) {
            let class_name = location.class_name();
            if !class_name.is_empty() {
                entry.class_name = Some(class_name.to_string());
            }
        }

        if let Some(frame) = location.stack_frame() {
            if values.contains(LogEntryValue::Method) {
                entry.method_name = frame.method_name.as_deref().map(String::from);
            }
            if values.contains(LogEntryValue::File) {
                entry.file_name = frame.short_file_name().map(String::from);
            }
            if values.contains(LogEntryValue::Line) {
                entry.line_number = frame.line_number;
            }
        }

        if values.contains(LogEntryValue::Tag) {
            entry.tag = tag.map(String::from);
        } else if tag == Some(INTERNAL_TAG) {
            // Writers and the writing thread recognize diagnostics by their tag
            entry.tag = Some(INTERNAL_TAG.to_string());
        }

        if values.contains(LogEntryValue::Message) {
            entry.message = message.map(|message| match formatter {
                Some(formatter) if !args.is_empty() => formatter.format(&message.to_string(), args),
                _ => message.to_string(),
            });
        }
        if values.contains(LogEntryValue::Exception) {
            entry.exception = throwable.cloned();
        }

        entry
    }

    fn write(&self, writer: &Arc<dyn Writer>, entry: &LogEntry) {
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| writer.write(entry)));
        if let Some(error) = Self::failure(writer, result) {
            if entry.tag.as_deref() != Some(INTERNAL_TAG) {
                self.diagnostics
                    .error(format!("Failed to write log entry: {}", error));
            }
        }
    }

    fn failure(
        writer: &Arc<dyn Writer>,
        result: std::thread::Result<Result<()>>,
    ) -> Option<LoggerError> {
        match result {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e),
            Err(payload) => Some(LoggerError::writer_panicked(writer.name(), payload.as_ref())),
        }
    }
}

impl InternalSink for LoggingBackend {
    fn log_internal(&self, level: Level, message: &str) {
        self.log(
            &Location::Module(module_path!()),
            Some(INTERNAL_TAG),
            level,
            None,
            Some(&message),
            &[],
            None,
        );
    }
}

impl Drop for LoggingBackend {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for LoggingBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggingBackend")
            .field("writers", &self.configuration.all_writers().len())
            .field("writing_thread", &self.writing_thread.is_some())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

/// Builder for constructing a [`LoggingBackend`] with a fluent API
///
/// # Example
/// ```
/// use rust_log_backend::prelude::*;
///
/// let backend = LoggingBackend::builder()
///     .configuration(Configuration::new().with("level", "debug@db"))
///     .queue_capacity(1024)
///     .internal_logger(InternalLogger::capturing())
///     .build()
///     .unwrap();
///
/// let location = Location::Name("app.Main".to_string());
/// assert!(backend.is_enabled(&location, Some("db"), Level::Debug));
/// assert!(!backend.is_enabled(&location, None, Level::Error));
/// ```
pub struct BackendBuilder {
    configuration: Configuration,
    registry: Option<WriterRegistry>,
    queue_capacity: usize,
    internal_logger: Option<InternalLogger>,
}

impl BackendBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            configuration: Configuration::new(),
            registry: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            internal_logger: None,
        }
    }

    /// Set the configuration properties
    #[must_use = "builder methods return a new value"]
    pub fn configuration(mut self, configuration: Configuration) -> Self {
        self.configuration = configuration;
        self
    }

    /// Set a single configuration property
    #[must_use = "builder methods return a new value"]
    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.configuration.set(key, value);
        self
    }

    /// Set the registry of writer types
    ///
    /// Defaults to [`WriterRegistry::default`].
    #[must_use = "builder methods return a new value"]
    pub fn registry(mut self, registry: WriterRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set the capacity of the writing thread queue
    #[must_use = "builder methods return a new value"]
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set the channel for diagnostics of the backend itself
    #[must_use = "builder methods return a new value"]
    pub fn internal_logger(mut self, internal_logger: InternalLogger) -> Self {
        self.internal_logger = Some(internal_logger);
        self
    }

    /// Build the backend
    ///
    /// Configuration problems are reported to the internal logger and do not
    /// fail the build. Fails only if the writing thread cannot be spawned.
    pub fn build(self) -> Result<Arc<LoggingBackend>> {
        let diagnostics = self.internal_logger.unwrap_or_default();
        let registry = Arc::new(self.registry.unwrap_or_default());

        let configuration =
            LoggingConfigurationParser::new(&self.configuration, registry, diagnostics.clone())
                .parse();

        let writing_thread = if configuration.has_async_writers() {
            Some(WritingThread::start(
                configuration.async_writers().to_vec(),
                self.queue_capacity,
                diagnostics.clone(),
            )?)
        } else {
            None
        };

        let backend = Arc::new(LoggingBackend {
            configuration,
            writing_thread,
            diagnostics: diagnostics.clone(),
            started: Instant::now(),
            shut_down: AtomicBool::new(false),
        });

        let sink: Weak<dyn InternalSink> = Arc::downgrade(&backend) as Weak<dyn InternalSink>;
        diagnostics.attach(sink);

        Ok(backend)
    }
}

impl Default for BackendBuilder {
    fn default() -> Self {
        Self::new()
    }
}
