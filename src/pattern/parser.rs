//! Compiler for format patterns

use super::placeholders::{
    ClassNameToken, ContextToken, DateToken, ExceptionToken, FileNameToken, LevelCodeToken,
    LevelToken, LineNumberToken, MessageAndExceptionToken, MessageToken, MethodNameToken,
    PackageNameToken, ProcessIdToken, SimpleClassNameToken, TagToken, ThreadIdToken,
    ThreadNameToken, TimestampToken, UptimeToken,
};
use super::style::{IndentationToken, MaximumSizeToken, MinimumSizeToken, SizeToken};
use super::token::{BundleToken, PlainTextToken};
use super::Token;
use crate::core::InternalLogger;

#[derive(Debug)]
enum Segment<'a> {
    Text(&'a str),
    Group(&'a str),
}

/// Parses format patterns into token trees
///
/// Placeholders are written in curly brackets, for example
/// `{date: %H:%M:%S}`. Style options follow a pipe inside the brackets:
/// `{level|min-size=5}`. Brackets can be nested to style several
/// placeholders together: `{{class}.{method}()|min-size=40}`.
///
/// Malformed patterns never fail. Problems are reported to the
/// diagnostics channel and the affected text is output as it is.
///
/// # Example
///
/// ```
/// use rust_log_backend::core::{InternalLogger, Level, LogEntry};
/// use rust_log_backend::pattern::{render_to_string, FormatPatternParser};
///
/// let parser = FormatPatternParser::new(InternalLogger::new());
/// let token = parser.parse("{level}: {message}");
/// let entry = LogEntry::new(Level::Info).with_message("Hello World!");
///
/// assert_eq!(render_to_string(token.as_ref(), &entry), "INFO: Hello World!");
/// ```
#[derive(Debug, Clone)]
pub struct FormatPatternParser {
    diagnostics: InternalLogger,
}

impl FormatPatternParser {
    pub fn new(diagnostics: InternalLogger) -> Self {
        Self { diagnostics }
    }

    /// Compile a format pattern into a root token
    pub fn parse(&self, pattern: &str) -> Box<dyn Token> {
        let tokens = self
            .scan(pattern)
            .into_iter()
            .map(|segment| match segment {
                Segment::Text(text) => Box::new(PlainTextToken::new(text)) as Box<dyn Token>,
                Segment::Group(content) => self.parse_group(content),
            })
            .collect();

        bundle(tokens)
    }

    /// Split into literal text and top level `{...}` groups
    fn scan<'a>(&self, pattern: &'a str) -> Vec<Segment<'a>> {
        let mut segments = Vec::new();
        let mut depth = 0usize;
        let mut start = 0;
        let mut escaped = false;

        for (index, c) in pattern.char_indices() {
            if escaped {
                escaped = false;
                continue;
            }

            match c {
                '\\' => escaped = true,
                '{' => {
                    if depth == 0 {
                        if start < index {
                            segments.push(Segment::Text(&pattern[start..index]));
                        }
                        start = index;
                    }
                    depth += 1;
                }
                '}' => {
                    if depth == 0 {
                        self.diagnostics
                            .error(format!("Opening curly bracket is missing: '{}'", pattern));
                    } else {
                        depth -= 1;
                        if depth == 0 {
                            segments.push(Segment::Group(&pattern[start + 1..index]));
                            start = index + 1;
                        }
                    }
                }
                _ => {}
            }
        }

        if depth > 0 {
            self.diagnostics
                .error(format!("Closing curly bracket is missing: '{}'", pattern));
        }

        if start < pattern.len() {
            segments.push(Segment::Text(&pattern[start..]));
        }

        segments
    }

    /// Compile the content of a `{...}` group
    fn parse_group(&self, content: &str) -> Box<dyn Token> {
        let mut segments = self.scan(content);

        let mut options = None;
        if let Some(Segment::Text(text)) = segments.last_mut() {
            let whole = *text;
            if let Some(index) = find_unescaped(whole, '|') {
                options = Some(&whole[index + 1..]);
                *text = &whole[..index];
            }
        }

        let has_groups = segments
            .iter()
            .any(|segment| matches!(segment, Segment::Group(_)));

        let token = if has_groups {
            let last = segments.len() - 1;
            let tokens = segments
                .into_iter()
                .enumerate()
                .filter_map(|(index, segment)| match segment {
                    Segment::Group(inner) => Some(self.parse_group(inner)),
                    Segment::Text(text) => {
                        let text = if index == last && options.is_some() {
                            text.trim()
                        } else {
                            text
                        };
                        (!text.is_empty())
                            .then(|| Box::new(PlainTextToken::new(text)) as Box<dyn Token>)
                    }
                })
                .collect();
            bundle(tokens)
        } else {
            let placeholder = match segments.first() {
                Some(Segment::Text(text)) => *text,
                _ => "",
            };
            self.create_placeholder(placeholder).unwrap_or_else(|| {
                Box::new(PlainTextToken::new(&format!("{{{}}}", placeholder.trim())))
            })
        };

        match options {
            Some(options) => self.style(token, options),
            None => token,
        }
    }

    fn create_placeholder(&self, placeholder: &str) -> Option<Box<dyn Token>> {
        let (name, configuration) = match placeholder.split_once(':') {
            Some((name, configuration)) => (name.trim(), Some(configuration.trim())),
            None => (placeholder.trim(), None),
        };

        let token: Box<dyn Token> = match name {
            "date" => Box::new(DateToken::new(configuration, &self.diagnostics)),
            "timestamp" => Box::new(TimestampToken::new(configuration)),
            "uptime" => Box::new(UptimeToken::new(configuration)),
            "pid" => Box::new(ProcessIdToken::new()),
            "thread" => Box::new(ThreadNameToken),
            "thread-id" => Box::new(ThreadIdToken),
            "context" => self.create_context_token(configuration),
            "class" => Box::new(ClassNameToken),
            "class-name" => Box::new(SimpleClassNameToken),
            "package" => Box::new(PackageNameToken),
            "method" => Box::new(MethodNameToken),
            "file" => Box::new(FileNameToken),
            "line" => Box::new(LineNumberToken),
            "tag" => Box::new(TagToken::new(configuration)),
            "level" => Box::new(LevelToken),
            "level-code" => Box::new(LevelCodeToken),
            "message" => Box::new(MessageAndExceptionToken),
            "message-only" => Box::new(MessageToken),
            "exception" => Box::new(ExceptionToken),
            "opening-curly-bracket" => Box::new(PlainTextToken::verbatim("{")),
            "closing-curly-bracket" => Box::new(PlainTextToken::verbatim("}")),
            "pipe" => Box::new(PlainTextToken::verbatim("|")),
            _ => return None,
        };

        Some(token)
    }

    fn create_context_token(&self, configuration: Option<&str>) -> Box<dyn Token> {
        let (key, default) = match configuration {
            Some(configuration) => match configuration.split_once(',') {
                Some((key, default)) => (key.trim(), Some(default.trim())),
                None => (configuration.trim(), None),
            },
            None => ("", None),
        };

        if key.is_empty() {
            self.diagnostics.error("\"{context}\" requires a key");
            return Box::new(PlainTextToken::verbatim(""));
        }

        Box::new(ContextToken::new(key, default))
    }

    /// Wrap a token with the decorators of comma separated `key=value` options
    fn style(&self, token: Box<dyn Token>, options: &str) -> Box<dyn Token> {
        let mut styled = token;

        for option in options.split(',') {
            let Some((key, value)) = option.split_once('=') else {
                self.diagnostics
                    .error(format!("No value set for '{}'", option.trim()));
                continue;
            };

            let key = key.trim();
            let value = value.trim();
            let Ok(size) = value.parse::<usize>() else {
                self.diagnostics
                    .error(format!("'{}' is an invalid value for '{}'", value, key));
                continue;
            };

            styled = match key {
                "min-size" => Box::new(MinimumSizeToken::new(styled, size)),
                "max-size" => Box::new(MaximumSizeToken::new(styled, size)),
                "size" => Box::new(SizeToken::new(styled, size)),
                "indent" => Box::new(IndentationToken::new(styled, size)),
                _ => {
                    self.diagnostics
                        .error(format!("Unknown style option: '{}'", key));
                    styled
                }
            };
        }

        styled
    }
}

impl Default for FormatPatternParser {
    fn default() -> Self {
        Self::new(InternalLogger::new())
    }
}

fn bundle(mut tokens: Vec<Box<dyn Token>>) -> Box<dyn Token> {
    if tokens.len() == 1 {
        if let Some(token) = tokens.pop() {
            return token;
        }
    }
    Box::new(BundleToken::new(tokens))
}

fn find_unescaped(text: &str, target: char) -> Option<usize> {
    let mut escaped = false;
    for (index, c) in text.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == target {
            return Some(index);
        }
    }
    None
}
