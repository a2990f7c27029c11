//! # Rust Log Backend
//!
//! A configurable logging backend that routes log entries by severity level,
//! tag and package to any number of writers.
//!
//! ## Features
//!
//! - **Level Resolution**: Global, per-package and per-tag severity levels
//! - **Lazy Log Entries**: Only values that an active writer outputs are resolved
//! - **Format Patterns**: `{date} [{thread}] {class}.{method}(): {message}` with
//!   size and indentation styles
//! - **Writing Thread**: Bounded queue that moves slow writers off the calling threads
//! - **Multiple Writers**: Console, file and JSON writers, plus custom writer types
//!
//! ## Example
//!
//! ```
//! use rust_log_backend::prelude::*;
//! use rust_log_backend::info;
//!
//! let backend = LoggingBackend::builder()
//!     .property("level", "info")
//!     .property("writer", "console")
//!     .property("writer.pattern", "{level}: {message}")
//!     .build()
//!     .unwrap();
//!
//! info!(backend, "Hello {}!", "World");
//! backend.shutdown();
//! ```

pub mod backend;
pub mod config;
pub mod core;
pub mod macros;
pub mod pattern;
pub mod writers;
pub mod writing_thread;

pub mod prelude {
    pub use crate::backend::{
        BackendBuilder, LevelVisibility, Location, LoggingBackend, OutputDetails, StackFrame,
    };
    pub use crate::config::{Configuration, WriterRegistry};
    pub use crate::core::{
        BraceMessageFormatter, ContextGuard, InternalLogger, Level, LogEntry, LogEntryValue,
        LoggerError, MessageFormatter, Result, ThreadContext, Throwable, ValueSet, Writer,
    };
    pub use crate::pattern::{FormatPatternParser, Token};
    pub use crate::writers::{ConsoleWriter, FileWriter, JsonWriter};
}

pub use backend::{BackendBuilder, Location, LoggingBackend, OutputDetails, StackFrame};
pub use config::{Configuration, WriterRegistry};
pub use crate::core::{
    Level, LogEntry, LogEntryValue, LoggerError, Result, ThreadContext, Throwable, ValueSet, Writer,
};
pub use writers::{ConsoleWriter, FileWriter, JsonWriter};
