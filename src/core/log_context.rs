//! Thread-bound context values
//!
//! This module provides:
//! - `ThreadContext`: key-value mapping bound to the current thread
//! - `ContextGuard`: RAII guard that removes a value when the scope ends
//!
//! The backend copies a snapshot of the mapping into a log entry whenever an
//! active writer requires [`LogEntryValue::Context`](super::LogEntryValue).

use std::cell::RefCell;
use std::collections::HashMap;

thread_local! {
    static CONTEXT: RefCell<HashMap<String, String>> = RefCell::new(HashMap::new());
}

/// Context values of the current thread
///
/// # Example
///
/// ```
/// use rust_log_backend::core::ThreadContext;
///
/// ThreadContext::put("user", "alice");
/// assert_eq!(ThreadContext::get("user").as_deref(), Some("alice"));
///
/// ThreadContext::remove("user");
/// assert!(ThreadContext::get("user").is_none());
/// ```
pub struct ThreadContext;

impl ThreadContext {
    /// Store a value, replacing any existing value for the same key
    pub fn put(key: impl Into<String>, value: impl ToString) {
        let value = value.to_string();
        CONTEXT.with(|context| {
            context.borrow_mut().insert(key.into(), value);
        });
    }

    pub fn get(key: &str) -> Option<String> {
        CONTEXT.with(|context| context.borrow().get(key).cloned())
    }

    pub fn remove(key: &str) {
        CONTEXT.with(|context| {
            context.borrow_mut().remove(key);
        });
    }

    pub fn clear() {
        CONTEXT.with(|context| context.borrow_mut().clear());
    }

    pub fn is_empty() -> bool {
        CONTEXT.with(|context| context.borrow().is_empty())
    }

    /// Copy of all values stored for the current thread
    pub fn snapshot() -> HashMap<String, String> {
        CONTEXT.with(|context| context.borrow().clone())
    }

    /// Store a value that is removed again when the returned guard is dropped
    ///
    /// A value that existed before under the same key is restored.
    #[must_use = "the value is removed as soon as the guard is dropped"]
    pub fn scoped(key: impl Into<String>, value: impl ToString) -> ContextGuard {
        let key = key.into();
        let value = value.to_string();
        let previous = CONTEXT.with(|context| context.borrow_mut().insert(key.clone(), value));
        ContextGuard { key, previous }
    }
}

/// RAII guard for a scoped context value
pub struct ContextGuard {
    key: String,
    previous: Option<String>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        // Thread-local storage may already be gone while the thread exits
        let _ = CONTEXT.try_with(|context| {
            let mut context = context.borrow_mut();
            match previous {
                Some(value) => context.insert(self.key.clone(), value),
                None => context.remove(&self.key),
            };
        });
    }
}
