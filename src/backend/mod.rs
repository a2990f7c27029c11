//! Logging backend: level resolution and dispatch to writers

pub mod location;
pub mod logging_backend;

pub use location::{Location, StackFrame};
pub use logging_backend::{BackendBuilder, LevelVisibility, LoggingBackend, OutputDetails};
