//! Literal text and sequences of tokens

use super::{Token, NEW_LINE};
use crate::core::{LogEntry, ValueSet};

/// Static text
///
/// Escape sequences `\n`, `\r`, `\r\n` and real line breaks are converted to
/// the platform line separator, `\t` to a tab. Any other escaped character
/// is output as it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainTextToken {
    text: String,
}

impl PlainTextToken {
    pub fn new(text: &str) -> Self {
        Self {
            text: unescape(text),
        }
    }

    /// Create from text that is used verbatim
    pub fn verbatim(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Token for PlainTextToken {
    fn required_values(&self) -> ValueSet {
        ValueSet::empty()
    }

    fn render(&self, _entry: &LogEntry, output: &mut String) {
        output.push_str(&self.text);
    }
}

fn unescape(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('n') => output.push_str(NEW_LINE),
                Some('r') => {
                    if chars.peek() == Some(&'\\') {
                        let mut lookahead = chars.clone();
                        lookahead.next();
                        if lookahead.peek() == Some(&'n') {
                            chars.next();
                            chars.next();
                        }
                    }
                    output.push_str(NEW_LINE);
                }
                Some('t') => output.push('\t'),
                Some(other) => output.push(other),
                None => output.push('\\'),
            },
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                output.push_str(NEW_LINE);
            }
            '\n' => output.push_str(NEW_LINE),
            other => output.push(other),
        }
    }

    output
}

/// Sequence of tokens rendered one after another
#[derive(Debug)]
pub struct BundleToken {
    tokens: Vec<Box<dyn Token>>,
}

impl BundleToken {
    pub fn new(tokens: Vec<Box<dyn Token>>) -> Self {
        Self { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl Token for BundleToken {
    fn required_values(&self) -> ValueSet {
        self.tokens
            .iter()
            .fold(ValueSet::empty(), |values, token| values | token.required_values())
    }

    fn render(&self, entry: &LogEntry, output: &mut String) {
        for token in &self.tokens {
            token.render(entry, output);
        }
    }
}
