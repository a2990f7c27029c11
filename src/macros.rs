//! Logging macros for ergonomic log calls.
//!
//! The macros capture the calling module, file and line, skip all work for
//! disabled levels, and format their arguments lazily: the message is only
//! rendered if at least one writer outputs it.
//!
//! # Examples
//!
//! ```
//! use rust_log_backend::prelude::*;
//! use rust_log_backend::{info, warn};
//!
//! let backend = LoggingBackend::builder()
//!     .property("writer", "console")
//!     .property("writer.pattern", "{level}: {message}")
//!     .build()
//!     .unwrap();
//!
//! // Basic logging
//! info!(backend, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(backend, "Server listening on port {}", port);
//!
//! // Tagged
//! warn!(backend, tag: "security", "{} failed logins", 3);
//! ```

/// Source location of the macro call site.
#[macro_export]
macro_rules! location {
    () => {
        $crate::backend::Location::Frame($crate::backend::StackFrame::caller(
            module_path!(),
            file!(),
            line!(),
        ))
    };
}

/// Log a message with automatic formatting.
///
/// A tag and an exception can be passed before the message with `tag:` and
/// `exception:`.
///
/// # Examples
///
/// ```
/// # use rust_log_backend::prelude::*;
/// # let backend = LoggingBackend::builder().build().unwrap();
/// use rust_log_backend::log;
/// use std::sync::Arc;
///
/// log!(backend, Level::Info, "Simple message");
/// log!(backend, Level::Error, "Error code: {}", 500);
/// log!(backend, Level::Warn, tag: "db", "Slow query");
///
/// let cause: Throwable = Arc::new(std::io::Error::other("timeout"));
/// log!(backend, Level::Error, tag: "db", exception: cause, "Query failed");
/// ```
#[macro_export]
macro_rules! log {
    (@emit $backend:expr, $level:expr, $tag:expr, $exception:expr, $($arg:tt)+) => {{
        let location = $crate::location!();
        let level: $crate::core::Level = $level;
        let tag: Option<&str> = $tag;
        if $backend.is_enabled(&location, tag, level) {
            let exception: Option<&$crate::core::Throwable> = $exception;
            $backend.log(
                &location,
                tag,
                level,
                exception,
                Some(&format_args!($($arg)+)),
                &[],
                None,
            );
        }
    }};
    ($backend:expr, $level:expr, tag: $tag:expr, exception: $exception:expr, $($arg:tt)+) => {
        $crate::log!(@emit $backend, $level, Some($tag), Some(&$exception), $($arg)+)
    };
    ($backend:expr, $level:expr, tag: $tag:expr, $($arg:tt)+) => {
        $crate::log!(@emit $backend, $level, Some($tag), None, $($arg)+)
    };
    ($backend:expr, $level:expr, exception: $exception:expr, $($arg:tt)+) => {
        $crate::log!(@emit $backend, $level, None, Some(&$exception), $($arg)+)
    };
    ($backend:expr, $level:expr, $($arg:tt)+) => {
        $crate::log!(@emit $backend, $level, None, None, $($arg)+)
    };
}

/// Log a trace-level message.
///
/// # Examples
///
/// ```
/// # use rust_log_backend::prelude::*;
/// # let backend = LoggingBackend::builder().property("level", "trace").build().unwrap();
/// use rust_log_backend::trace;
/// trace!(backend, "Entering function: calculate()");
/// trace!(backend, "Variable value: {}", 42);
/// ```
#[macro_export]
macro_rules! trace {
    ($backend:expr, $($arg:tt)+) => {
        $crate::log!($backend, $crate::core::Level::Trace, $($arg)+)
    };
}

/// Log a debug-level message.
///
/// # Examples
///
/// ```
/// # use rust_log_backend::prelude::*;
/// # let backend = LoggingBackend::builder().build().unwrap();
/// use rust_log_backend::debug;
/// debug!(backend, "Debug information");
/// debug!(backend, tag: "cache", "Counter value: {}", 10);
/// ```
#[macro_export]
macro_rules! debug {
    ($backend:expr, $($arg:tt)+) => {
        $crate::log!($backend, $crate::core::Level::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($backend:expr, $($arg:tt)+) => {
        $crate::log!($backend, $crate::core::Level::Info, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($backend:expr, $($arg:tt)+) => {
        $crate::log!($backend, $crate::core::Level::Warn, $($arg)+)
    };
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// # use rust_log_backend::prelude::*;
/// # let backend = LoggingBackend::builder().build().unwrap();
/// use rust_log_backend::error;
/// use std::sync::Arc;
///
/// error!(backend, "Failed to connect to database");
///
/// let cause: Throwable = Arc::new(std::io::Error::other("connection refused"));
/// error!(backend, exception: cause, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! error {
    ($backend:expr, $($arg:tt)+) => {
        $crate::log!($backend, $crate::core::Level::Error, $($arg)+)
    };
}
