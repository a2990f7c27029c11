//! Core types and traits

pub mod error;
pub mod internal;
pub mod level;
pub mod log_context;
pub mod log_entry;
pub mod message;
pub mod writer;

pub use error::{LoggerError, Result};
pub use internal::{InternalLogger, InternalRecord, InternalSink, INTERNAL_TAG};
pub use level::Level;
pub use log_context::{ContextGuard, ThreadContext};
pub use log_entry::{LogEntry, LogEntryValue, ThreadInfo, Throwable, ValueSet};
pub use message::{BraceMessageFormatter, MessageFormatter};
pub use writer::Writer;
