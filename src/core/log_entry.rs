//! Log entry structure and the set of values a log entry can carry

use super::level::Level;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::ops::BitOr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Error attached to a log entry
pub type Throwable = Arc<dyn std::error::Error + Send + Sync>;

/// Values that can be stored in a [`LogEntry`]
///
/// Writers and format tokens declare which of these values they need, so that
/// the backend only has to resolve what is actually going to be output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogEntryValue {
    Timestamp,
    Uptime,
    Thread,
    Context,
    Class,
    Method,
    File,
    Line,
    Tag,
    Level,
    Message,
    Exception,
}

impl LogEntryValue {
    pub const ALL: [LogEntryValue; 12] = [
        LogEntryValue::Timestamp,
        LogEntryValue::Uptime,
        LogEntryValue::Thread,
        LogEntryValue::Context,
        LogEntryValue::Class,
        LogEntryValue::Method,
        LogEntryValue::File,
        LogEntryValue::Line,
        LogEntryValue::Tag,
        LogEntryValue::Level,
        LogEntryValue::Message,
        LogEntryValue::Exception,
    ];

    #[inline]
    const fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

/// Compact set of [`LogEntryValue`]s
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ValueSet(u16);

impl ValueSet {
    pub const fn empty() -> Self {
        ValueSet(0)
    }

    pub fn all() -> Self {
        LogEntryValue::ALL.iter().copied().collect()
    }

    pub fn of(values: &[LogEntryValue]) -> Self {
        values.iter().copied().collect()
    }

    #[must_use]
    pub const fn with(self, value: LogEntryValue) -> Self {
        ValueSet(self.0 | value.bit())
    }

    #[inline]
    pub const fn contains(&self, value: LogEntryValue) -> bool {
        self.0 & value.bit() != 0
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn insert(&mut self, value: LogEntryValue) {
        self.0 |= value.bit();
    }

    pub fn extend_from(&mut self, other: ValueSet) {
        self.0 |= other.0;
    }

    pub fn iter(&self) -> impl Iterator<Item = LogEntryValue> + '_ {
        LogEntryValue::ALL
            .iter()
            .copied()
            .filter(move |value| self.contains(*value))
    }
}

impl BitOr for ValueSet {
    type Output = ValueSet;

    fn bitor(self, rhs: ValueSet) -> ValueSet {
        ValueSet(self.0 | rhs.0)
    }
}

impl FromIterator<LogEntryValue> for ValueSet {
    fn from_iter<I: IntoIterator<Item = LogEntryValue>>(iter: I) -> Self {
        let mut set = ValueSet::empty();
        for value in iter {
            set.insert(value);
        }
        set
    }
}

impl fmt::Debug for ValueSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

// Thread-local cache so that thread information is only computed once per thread
thread_local! {
    static CURRENT_THREAD: ThreadInfo = ThreadInfo::compute();
}

/// Name and numeric ID of the thread that issued a log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadInfo {
    pub name: String,
    pub id: u64,
}

impl ThreadInfo {
    /// Information about the current thread
    pub fn current() -> Self {
        CURRENT_THREAD.with(Clone::clone)
    }

    fn compute() -> Self {
        let id = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
        let name = std::thread::current()
            .name()
            .map(String::from)
            .unwrap_or_else(|| format!("thread-{}", id));
        Self { name, id }
    }
}

/// Immutable snapshot of a single log call
///
/// Only values that are required by at least one active writer are populated.
/// All other fields remain `None` or empty.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: Option<DateTime<Utc>>,
    pub uptime: Option<Duration>,
    pub thread: Option<ThreadInfo>,
    pub context: HashMap<String, String>,
    pub class_name: Option<String>,
    pub method_name: Option<String>,
    pub file_name: Option<String>,
    pub line_number: Option<u32>,
    pub tag: Option<String>,
    pub level: Level,
    pub message: Option<String>,
    pub exception: Option<Throwable>,
}

impl LogEntry {
    pub fn new(level: Level) -> Self {
        Self {
            timestamp: None,
            uptime: None,
            thread: None,
            context: HashMap::new(),
            class_name: None,
            method_name: None,
            file_name: None,
            line_number: None,
            tag: None,
            level,
            message: None,
            exception: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_uptime(mut self, uptime: Duration) -> Self {
        self.uptime = Some(uptime);
        self
    }

    pub fn with_thread(mut self, thread: ThreadInfo) -> Self {
        self.thread = Some(thread);
        self
    }

    pub fn with_context_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn with_location(
        mut self,
        class_name: impl Into<String>,
        method_name: impl Into<String>,
        file_name: impl Into<String>,
        line_number: u32,
    ) -> Self {
        self.class_name = Some(class_name.into());
        self.method_name = Some(method_name.into());
        self.file_name = Some(file_name.into());
        self.line_number = Some(line_number);
        self
    }

    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn with_exception(mut self, exception: Throwable) -> Self {
        self.exception = Some(exception);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_set_membership() {
        let set = ValueSet::of(&[LogEntryValue::Level, LogEntryValue::Message]);
        assert!(set.contains(LogEntryValue::Level));
        assert!(set.contains(LogEntryValue::Message));
        assert!(!set.contains(LogEntryValue::Timestamp));
        assert!(!set.is_empty());
        assert!(ValueSet::empty().is_empty());
    }

    #[test]
    fn test_value_set_union() {
        let a = ValueSet::empty().with(LogEntryValue::Tag);
        let b = ValueSet::of(&[LogEntryValue::Thread]);
        let union = a | b;
        assert_eq!(
            union.iter().collect::<Vec<_>>(),
            vec![LogEntryValue::Thread, LogEntryValue::Tag]
        );
        assert_eq!(ValueSet::all().iter().count(), LogEntryValue::ALL.len());
    }

    #[test]
    fn test_thread_info_is_cached_per_thread() {
        let first = ThreadInfo::current();
        let second = ThreadInfo::current();
        assert_eq!(first, second);

        let other = std::thread::Builder::new()
            .name("worker-7".to_string())
            .spawn(ThreadInfo::current)
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(other.name, "worker-7");
        assert_ne!(other.id, first.id);
    }

    #[test]
    fn test_unnamed_thread_gets_generated_name() {
        let info = std::thread::spawn(ThreadInfo::current).join().unwrap();
        assert_eq!(info.name, format!("thread-{}", info.id));
    }

    #[test]
    fn test_entry_builders() {
        let entry = LogEntry::new(Level::Info)
            .with_message("Hello")
            .with_tag("db")
            .with_location("app::Service", "run", "service.rs", 42);

        assert_eq!(entry.level, Level::Info);
        assert_eq!(entry.message.as_deref(), Some("Hello"));
        assert_eq!(entry.tag.as_deref(), Some("db"));
        assert_eq!(entry.line_number, Some(42));
        assert!(entry.timestamp.is_none());
        assert!(entry.context.is_empty());
    }
}
