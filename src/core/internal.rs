//! Diagnostics channel for problems of the logging engine itself
//!
//! Before a backend exists, messages go to stderr as `[LOGGER ERROR] ...`.
//! Once attached, they are logged through the backend with the
//! [`INTERNAL_TAG`] so that the configured writers receive them.

use super::level::Level;
use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, Weak};

/// Tag of log entries issued by the logging engine itself
pub const INTERNAL_TAG: &str = "internal";

/// Target that accepts internal diagnostics once the backend is running
pub trait InternalSink: Send + Sync {
    fn log_internal(&self, level: Level, message: &str);
}

/// Diagnostic message recorded by a capturing [`InternalLogger`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalRecord {
    pub level: Level,
    pub message: String,
}

struct Inner {
    sink: RwLock<Option<Weak<dyn InternalSink>>>,
    captured: Option<Mutex<Vec<InternalRecord>>>,
}

/// Reporter for configuration, write and shutdown problems
///
/// Cloning is cheap and all clones share the same target.
#[derive(Clone)]
pub struct InternalLogger {
    inner: Arc<Inner>,
}

impl InternalLogger {
    /// Create a logger that reports to stderr until attached
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                sink: RwLock::new(None),
                captured: None,
            }),
        }
    }

    /// Create a logger that only records messages in memory
    pub fn capturing() -> Self {
        Self {
            inner: Arc::new(Inner {
                sink: RwLock::new(None),
                captured: Some(Mutex::new(Vec::new())),
            }),
        }
    }

    pub fn attach(&self, sink: Weak<dyn InternalSink>) {
        *self.inner.sink.write() = Some(sink);
    }

    pub fn detach(&self) {
        *self.inner.sink.write() = None;
    }

    pub fn is_capturing(&self) -> bool {
        self.inner.captured.is_some()
    }

    pub fn log(&self, level: Level, message: impl Into<String>) {
        let message = message.into();

        if let Some(captured) = &self.inner.captured {
            captured.lock().push(InternalRecord { level, message });
            return;
        }

        let sink = self.inner.sink.read().as_ref().and_then(Weak::upgrade);
        match sink {
            Some(sink) => sink.log_internal(level, &message),
            None => {
                let label = match level {
                    Level::Warn => "WARNING",
                    other => other.to_str(),
                };
                eprintln!("[LOGGER {}] {}", label, message);
            }
        }
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(Level::Error, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(Level::Warn, message);
    }

    /// Messages recorded so far. Always empty unless capturing.
    pub fn records(&self) -> Vec<InternalRecord> {
        self.inner
            .captured
            .as_ref()
            .map(|captured| captured.lock().clone())
            .unwrap_or_default()
    }

    /// Remove and return all recorded messages
    pub fn take_records(&self) -> Vec<InternalRecord> {
        self.inner
            .captured
            .as_ref()
            .map(|captured| std::mem::take(&mut *captured.lock()))
            .unwrap_or_default()
    }
}

impl Default for InternalLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InternalLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InternalLogger")
            .field("capturing", &self.is_capturing())
            .field("attached", &self.inner.sink.read().is_some())
            .finish()
    }
}
