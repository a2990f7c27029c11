//! Tokens for the placeholders of format patterns

use super::{Token, NEW_LINE};
use crate::config::logging_configuration::split_qualified_name;
use crate::core::{InternalLogger, LogEntry, LogEntryValue, ValueSet};
use chrono::format::{Fixed, Item, Numeric, StrftimeItems};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::error::Error;
use std::fmt::Write;
use std::time::Duration;

const UNKNOWN: &str = "<unknown>";

/// Default format of `{date}`
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Default format of `{uptime}`
pub const DEFAULT_UPTIME_FORMAT: &str = "HH:mm:ss";

fn values(value: LogEntryValue) -> ValueSet {
    ValueSet::empty().with(value)
}

/// Date and time of issue in UTC, formatted with a strftime pattern
///
/// The last formatted second is cached, unless the pattern contains
/// fractions of a second.
#[derive(Debug)]
pub struct DateToken {
    format: String,
    cacheable: bool,
    cache: Mutex<Option<(i64, String)>>,
}

impl DateToken {
    /// Create with a strftime pattern
    ///
    /// An invalid pattern is reported and the default pattern is used instead.
    pub fn new(format: Option<&str>, diagnostics: &InternalLogger) -> Self {
        let format = match format {
            Some(format) if Self::is_valid(format) => format,
            Some(format) => {
                diagnostics.error(format!("'{}' is an invalid date format pattern", format));
                DEFAULT_DATE_FORMAT
            }
            None => DEFAULT_DATE_FORMAT,
        };

        let cacheable = !StrftimeItems::new(format).any(|item| {
            matches!(
                item,
                Item::Numeric(Numeric::Nanosecond, _)
                    | Item::Fixed(Fixed::Nanosecond)
                    | Item::Fixed(Fixed::Nanosecond3)
                    | Item::Fixed(Fixed::Nanosecond6)
                    | Item::Fixed(Fixed::Nanosecond9)
                    | Item::Fixed(Fixed::Internal(_))
            )
        });

        Self {
            format: format.to_string(),
            cacheable,
            cache: Mutex::new(None),
        }
    }

    fn is_valid(format: &str) -> bool {
        !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
    }

    fn format(&self, timestamp: &DateTime<Utc>) -> String {
        timestamp.format(&self.format).to_string()
    }
}

impl Token for DateToken {
    fn required_values(&self) -> ValueSet {
        values(LogEntryValue::Timestamp)
    }

    fn render(&self, entry: &LogEntry, output: &mut String) {
        let Some(timestamp) = entry.timestamp.as_ref() else {
            output.push_str(UNKNOWN);
            return;
        };

        if !self.cacheable {
            output.push_str(&self.format(timestamp));
            return;
        }

        let second = timestamp.timestamp();
        let mut cache = self.cache.lock();
        match cache.as_ref() {
            Some((cached_second, text)) if *cached_second == second => output.push_str(text),
            _ => {
                let text = self.format(timestamp);
                output.push_str(&text);
                *cache = Some((second, text));
            }
        }
    }
}

/// Unix timestamp in seconds or milliseconds
#[derive(Debug)]
pub struct TimestampToken {
    milliseconds: bool,
}

impl TimestampToken {
    pub fn new(unit: Option<&str>) -> Self {
        Self {
            milliseconds: unit.map(str::trim) == Some("milliseconds"),
        }
    }
}

impl Token for TimestampToken {
    fn required_values(&self) -> ValueSet {
        values(LogEntryValue::Timestamp)
    }

    fn render(&self, entry: &LogEntry, output: &mut String) {
        match entry.timestamp {
            Some(timestamp) if self.milliseconds => {
                let _ = write!(output, "{}", timestamp.timestamp_millis());
            }
            Some(timestamp) => {
                let _ = write!(output, "{}", timestamp.timestamp());
            }
            None => output.push_str(UNKNOWN),
        }
    }
}

#[derive(Debug, Clone)]
enum UptimeSegment {
    Text(String),
    Time {
        digits: usize,
        divisor: u128,
        modulus: u128,
    },
}

/// Time since the backend was started
///
/// Patterns use `d` (days), `H` (hours), `m` (minutes), `s` (seconds) and
/// `S` (fractions of a second). The largest unit in the pattern is not
/// wrapped, so `H` alone renders the total number of hours. Text in single
/// quotes is output literally.
#[derive(Debug)]
pub struct UptimeToken {
    segments: Vec<UptimeSegment>,
}

impl UptimeToken {
    const SECOND: u128 = 1_000_000_000;
    const MINUTE: u128 = 60 * Self::SECOND;
    const HOUR: u128 = 60 * Self::MINUTE;
    const DAY: u128 = 24 * Self::HOUR;

    pub fn new(pattern: Option<&str>) -> Self {
        Self {
            segments: Self::parse(pattern.unwrap_or(DEFAULT_UPTIME_FORMAT)),
        }
    }

    fn parse(pattern: &str) -> Vec<UptimeSegment> {
        let chars: Vec<char> = pattern.chars().collect();
        let mut segments = Vec::new();
        let mut max_divisor = 1;
        let mut index = 0;

        while index < chars.len() {
            let c = chars[index];
            let length = chars[index..].iter().take_while(|other| **other == c).count();

            let time = |digits: usize, divisor: u128, modulus: u128| UptimeSegment::Time {
                digits,
                divisor,
                modulus,
            };

            let segment = match c {
                '\'' => {
                    let end = chars[index + 1..]
                        .iter()
                        .position(|other| *other == '\'')
                        .map(|offset| index + 1 + offset);
                    match end {
                        None => {
                            index += 1;
                            UptimeSegment::Text("'".to_string())
                        }
                        Some(end) if end == index + 1 => {
                            index += 2;
                            UptimeSegment::Text("'".to_string())
                        }
                        Some(end) => {
                            let text = chars[index + 1..end].iter().collect();
                            index = end + 1;
                            UptimeSegment::Text(text)
                        }
                    }
                }
                'S' => {
                    let precision = length.min(9) as u32;
                    let divisor = 10u128.pow(9 - precision);
                    index += length;
                    max_divisor = max_divisor.max(divisor);
                    time(length, divisor, 10u128.pow(precision))
                }
                's' | 'm' | 'H' | 'd' => {
                    let (divisor, modulus) = match c {
                        's' => (Self::SECOND, 60),
                        'm' => (Self::MINUTE, 60),
                        'H' => (Self::HOUR, 24),
                        _ => (Self::DAY, 0),
                    };
                    index += length;
                    max_divisor = max_divisor.max(divisor);
                    time(length, divisor, modulus)
                }
                other => {
                    index += 1;
                    UptimeSegment::Text(other.to_string())
                }
            };

            segments.push(segment);
        }

        for segment in &mut segments {
            if let UptimeSegment::Time {
                divisor, modulus, ..
            } = segment
            {
                if *divisor == max_divisor {
                    *modulus = 0;
                }
            }
        }

        segments
    }

    fn format(&self, uptime: Duration, output: &mut String) {
        let nanos = uptime.as_nanos();
        for segment in &self.segments {
            match segment {
                UptimeSegment::Text(text) => output.push_str(text),
                UptimeSegment::Time {
                    digits,
                    divisor,
                    modulus,
                } => {
                    let mut value = nanos / divisor;
                    if *modulus > 0 {
                        value %= modulus;
                    }
                    let _ = write!(output, "{:0width$}", value, width = *digits);
                }
            }
        }
    }
}

impl Token for UptimeToken {
    fn required_values(&self) -> ValueSet {
        values(LogEntryValue::Uptime)
    }

    fn render(&self, entry: &LogEntry, output: &mut String) {
        match entry.uptime {
            Some(uptime) => self.format(uptime, output),
            None => output.push_str("<uptime unknown>"),
        }
    }
}

/// ID of the current process
#[derive(Debug)]
pub struct ProcessIdToken {
    pid: String,
}

impl ProcessIdToken {
    pub fn new() -> Self {
        Self {
            pid: std::process::id().to_string(),
        }
    }
}

impl Default for ProcessIdToken {
    fn default() -> Self {
        Self::new()
    }
}

impl Token for ProcessIdToken {
    fn required_values(&self) -> ValueSet {
        ValueSet::empty()
    }

    fn render(&self, _entry: &LogEntry, output: &mut String) {
        output.push_str(&self.pid);
    }
}

#[derive(Debug)]
pub struct ThreadNameToken;

impl Token for ThreadNameToken {
    fn required_values(&self) -> ValueSet {
        values(LogEntryValue::Thread)
    }

    fn render(&self, entry: &LogEntry, output: &mut String) {
        match &entry.thread {
            Some(thread) => output.push_str(&thread.name),
            None => output.push_str(UNKNOWN),
        }
    }
}

#[derive(Debug)]
pub struct ThreadIdToken;

impl Token for ThreadIdToken {
    fn required_values(&self) -> ValueSet {
        values(LogEntryValue::Thread)
    }

    fn render(&self, entry: &LogEntry, output: &mut String) {
        match &entry.thread {
            Some(thread) => {
                let _ = write!(output, "{}", thread.id);
            }
            None => output.push_str(UNKNOWN),
        }
    }
}

/// Value of the thread context, or a default if absent
#[derive(Debug)]
pub struct ContextToken {
    key: String,
    default: String,
}

impl ContextToken {
    pub fn new(key: impl Into<String>, default: Option<&str>) -> Self {
        Self {
            key: key.into(),
            default: default.unwrap_or_default().to_string(),
        }
    }
}

impl Token for ContextToken {
    fn required_values(&self) -> ValueSet {
        values(LogEntryValue::Context)
    }

    fn render(&self, entry: &LogEntry, output: &mut String) {
        output.push_str(entry.context.get(&self.key).unwrap_or(&self.default));
    }
}

/// Fully qualified class or module name
#[derive(Debug)]
pub struct ClassNameToken;

impl Token for ClassNameToken {
    fn required_values(&self) -> ValueSet {
        values(LogEntryValue::Class)
    }

    fn render(&self, entry: &LogEntry, output: &mut String) {
        output.push_str(entry.class_name.as_deref().unwrap_or(UNKNOWN));
    }
}

/// Class name without package
#[derive(Debug)]
pub struct SimpleClassNameToken;

impl Token for SimpleClassNameToken {
    fn required_values(&self) -> ValueSet {
        values(LogEntryValue::Class)
    }

    fn render(&self, entry: &LogEntry, output: &mut String) {
        match entry.class_name.as_deref() {
            Some(name) => output.push_str(split_qualified_name(name).1),
            None => output.push_str(UNKNOWN),
        }
    }
}

/// Package or parent module of the class name
#[derive(Debug)]
pub struct PackageNameToken;

impl Token for PackageNameToken {
    fn required_values(&self) -> ValueSet {
        values(LogEntryValue::Class)
    }

    fn render(&self, entry: &LogEntry, output: &mut String) {
        match entry.class_name.as_deref() {
            Some(name) => output.push_str(split_qualified_name(name).0),
            None => output.push_str(UNKNOWN),
        }
    }
}

#[derive(Debug)]
pub struct MethodNameToken;

impl Token for MethodNameToken {
    fn required_values(&self) -> ValueSet {
        values(LogEntryValue::Method)
    }

    fn render(&self, entry: &LogEntry, output: &mut String) {
        output.push_str(entry.method_name.as_deref().unwrap_or(UNKNOWN));
    }
}

#[derive(Debug)]
pub struct FileNameToken;

impl Token for FileNameToken {
    fn required_values(&self) -> ValueSet {
        values(LogEntryValue::File)
    }

    fn render(&self, entry: &LogEntry, output: &mut String) {
        output.push_str(entry.file_name.as_deref().unwrap_or(UNKNOWN));
    }
}

#[derive(Debug)]
pub struct LineNumberToken;

impl Token for LineNumberToken {
    fn required_values(&self) -> ValueSet {
        values(LogEntryValue::Line)
    }

    fn render(&self, entry: &LogEntry, output: &mut String) {
        match entry.line_number {
            Some(line) => {
                let _ = write!(output, "{}", line);
            }
            None => output.push('?'),
        }
    }
}

/// Tag of the log entry, or a default for untagged entries
#[derive(Debug)]
pub struct TagToken {
    default: String,
}

impl TagToken {
    pub fn new(default: Option<&str>) -> Self {
        Self {
            default: default.unwrap_or_default().to_string(),
        }
    }
}

impl Token for TagToken {
    fn required_values(&self) -> ValueSet {
        values(LogEntryValue::Tag)
    }

    fn render(&self, entry: &LogEntry, output: &mut String) {
        output.push_str(entry.tag.as_deref().unwrap_or(&self.default));
    }
}

/// Severity level as upper case name
#[derive(Debug)]
pub struct LevelToken;

impl Token for LevelToken {
    fn required_values(&self) -> ValueSet {
        values(LogEntryValue::Level)
    }

    fn render(&self, entry: &LogEntry, output: &mut String) {
        output.push_str(entry.level.to_str());
    }
}

/// Severity level as number, `0` for trace up to `4` for error
#[derive(Debug)]
pub struct LevelCodeToken;

impl Token for LevelCodeToken {
    fn required_values(&self) -> ValueSet {
        values(LogEntryValue::Level)
    }

    fn render(&self, entry: &LogEntry, output: &mut String) {
        let _ = write!(output, "{}", entry.level.ordinal());
    }
}

/// Text message without exception
#[derive(Debug)]
pub struct MessageToken;

impl Token for MessageToken {
    fn required_values(&self) -> ValueSet {
        values(LogEntryValue::Message)
    }

    fn render(&self, entry: &LogEntry, output: &mut String) {
        if let Some(message) = &entry.message {
            output.push_str(message);
        }
    }
}

/// Text message followed by the exception, if any
#[derive(Debug)]
pub struct MessageAndExceptionToken;

impl Token for MessageAndExceptionToken {
    fn required_values(&self) -> ValueSet {
        ValueSet::of(&[LogEntryValue::Message, LogEntryValue::Exception])
    }

    fn render(&self, entry: &LogEntry, output: &mut String) {
        if let Some(message) = &entry.message {
            output.push_str(message);
        }

        if let Some(exception) = &entry.exception {
            if entry.message.is_some() {
                output.push_str(": ");
            }
            render_exception(exception.as_ref(), output);
        }
    }
}

/// Exception with its chain of causes
#[derive(Debug)]
pub struct ExceptionToken;

impl Token for ExceptionToken {
    fn required_values(&self) -> ValueSet {
        values(LogEntryValue::Exception)
    }

    fn render(&self, entry: &LogEntry, output: &mut String) {
        if let Some(exception) = &entry.exception {
            render_exception(exception.as_ref(), output);
        }
    }
}

fn render_exception(exception: &(dyn Error + 'static), output: &mut String) {
    let _ = write!(output, "{}", exception);

    let mut cause = exception.source();
    while let Some(error) = cause {
        output.push_str(NEW_LINE);
        let _ = write!(output, "Caused by: {}", error);
        cause = error.source();
    }
}
