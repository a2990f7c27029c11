//! Decorator tokens for padding, trimming and indenting

use super::Token;
use crate::core::{LogEntry, ValueSet};

fn render_child(token: &dyn Token, entry: &LogEntry) -> String {
    let mut rendered = String::new();
    token.render(entry, &mut rendered);
    rendered
}

fn pad(output: &mut String, count: usize) {
    output.extend(std::iter::repeat(' ').take(count));
}

/// Keep only the last `size` characters
fn keep_tail(text: &str, size: usize) -> &str {
    let length = text.chars().count();
    if length <= size {
        return text;
    }

    let skip = length - size;
    match text.char_indices().nth(skip) {
        Some((index, _)) => &text[index..],
        None => "",
    }
}

/// Pads the output of a token with trailing spaces
#[derive(Debug)]
pub struct MinimumSizeToken {
    token: Box<dyn Token>,
    size: usize,
}

impl MinimumSizeToken {
    pub fn new(token: Box<dyn Token>, size: usize) -> Self {
        Self { token, size }
    }
}

impl Token for MinimumSizeToken {
    fn required_values(&self) -> ValueSet {
        self.token.required_values()
    }

    fn render(&self, entry: &LogEntry, output: &mut String) {
        let rendered = render_child(self.token.as_ref(), entry);
        let length = rendered.chars().count();
        output.push_str(&rendered);
        pad(output, self.size.saturating_sub(length));
    }
}

/// Trims the output of a token from the front
#[derive(Debug)]
pub struct MaximumSizeToken {
    token: Box<dyn Token>,
    size: usize,
}

impl MaximumSizeToken {
    pub fn new(token: Box<dyn Token>, size: usize) -> Self {
        Self { token, size }
    }
}

impl Token for MaximumSizeToken {
    fn required_values(&self) -> ValueSet {
        self.token.required_values()
    }

    fn render(&self, entry: &LogEntry, output: &mut String) {
        let rendered = render_child(self.token.as_ref(), entry);
        output.push_str(keep_tail(&rendered, self.size));
    }
}

/// Pads or trims the output of a token to an exact number of characters
#[derive(Debug)]
pub struct SizeToken {
    token: Box<dyn Token>,
    size: usize,
}

impl SizeToken {
    pub fn new(token: Box<dyn Token>, size: usize) -> Self {
        Self { token, size }
    }
}

impl Token for SizeToken {
    fn required_values(&self) -> ValueSet {
        self.token.required_values()
    }

    fn render(&self, entry: &LogEntry, output: &mut String) {
        let rendered = render_child(self.token.as_ref(), entry);
        let trimmed = keep_tail(&rendered, self.size);
        let length = trimmed.chars().count();
        output.push_str(trimmed);
        pad(output, self.size.saturating_sub(length));
    }
}

/// Indents every line of the output of a token
///
/// Each line break is followed by `size` spaces and leading tabs of the
/// following line are replaced by `size` spaces each. The first line is
/// indented as well if the token starts at the beginning of a line.
#[derive(Debug)]
pub struct IndentationToken {
    token: Box<dyn Token>,
    size: usize,
}

impl IndentationToken {
    pub fn new(token: Box<dyn Token>, size: usize) -> Self {
        Self { token, size }
    }
}

impl Token for IndentationToken {
    fn required_values(&self) -> ValueSet {
        self.token.required_values()
    }

    fn render(&self, entry: &LogEntry, output: &mut String) {
        let rendered = render_child(self.token.as_ref(), entry);
        let mut at_line_start = output.is_empty() || output.ends_with('\n') || output.ends_with('\r');
        if at_line_start {
            pad(output, self.size);
        }

        let mut chars = rendered.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\r' | '\n' => {
                    output.push(c);
                    if c == '\r' && chars.peek() == Some(&'\n') {
                        output.push('\n');
                        chars.next();
                    }
                    pad(output, self.size);
                    at_line_start = true;
                }
                '\t' if at_line_start => pad(output, self.size),
                other => {
                    output.push(other);
                    at_line_start = false;
                }
            }
        }
    }
}
