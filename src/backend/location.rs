//! Source locations of log calls

use std::borrow::Cow;

/// Caller information of a single log call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    pub class_name: Cow<'static, str>,
    pub method_name: Option<Cow<'static, str>>,
    pub file_name: Option<Cow<'static, str>>,
    pub line_number: Option<u32>,
}

impl StackFrame {
    pub fn new(class_name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            class_name: class_name.into(),
            method_name: None,
            file_name: None,
            line_number: None,
        }
    }

    /// Frame of a call site as produced by `module_path!()`, `file!()` and
    /// `line!()`
    pub const fn caller(module: &'static str, file: &'static str, line: u32) -> Self {
        Self {
            class_name: Cow::Borrowed(module),
            method_name: None,
            file_name: Some(Cow::Borrowed(file)),
            line_number: Some(line),
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_method(mut self, method_name: impl Into<Cow<'static, str>>) -> Self {
        self.method_name = Some(method_name.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_file(mut self, file_name: impl Into<Cow<'static, str>>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_line(mut self, line_number: u32) -> Self {
        self.line_number = Some(line_number);
        self
    }

    /// File name without directories
    pub fn short_file_name(&self) -> Option<&str> {
        self.file_name
            .as_deref()
            .map(|path| path.rsplit(['/', '\\']).next().unwrap_or(path))
    }
}

/// Where a log call was issued
///
/// Callers pass the cheapest representation they have. Level resolution only
/// needs [`class_name`](Self::class_name), full stack frames are read only if
/// a writer outputs method, file or line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Frame(StackFrame),
    /// Module path as returned by `module_path!()`
    Module(&'static str),
    /// Fully qualified class or module name
    Name(String),
}

impl Location {
    pub fn class_name(&self) -> &str {
        match self {
            Location::Frame(frame) => &frame.class_name,
            Location::Module(module) => module,
            Location::Name(name) => name,
        }
    }

    pub fn stack_frame(&self) -> Option<&StackFrame> {
        match self {
            Location::Frame(frame) => Some(frame),
            _ => None,
        }
    }
}

impl From<StackFrame> for Location {
    fn from(frame: StackFrame) -> Self {
        Location::Frame(frame)
    }
}

impl From<&'static str> for Location {
    fn from(module: &'static str) -> Self {
        Location::Module(module)
    }
}

impl From<String> for Location {
    fn from(name: String) -> Self {
        Location::Name(name)
    }
}
