//! Writer trait for log output destinations

use super::{error::Result, log_entry::LogEntry, log_entry::ValueSet};

/// Output destination for log entries
///
/// Writers are shared between the calling threads and the writing thread, so
/// all methods take `&self`. Implementations guard their mutable state
/// internally.
pub trait Writer: Send + Sync {
    /// Log entry values this writer reads
    fn required_values(&self) -> ValueSet;

    fn write(&self, entry: &LogEntry) -> Result<()>;

    fn flush(&self) -> Result<()>;

    /// Release all resources. Called exactly once when the backend shuts down.
    fn close(&self) -> Result<()>;

    fn name(&self) -> &str;
}
