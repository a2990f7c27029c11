//! Message formatting with `{}` placeholders

use std::fmt::{Display, Write};

/// Replaces placeholders in a message with arguments
pub trait MessageFormatter: Send + Sync {
    fn format(&self, message: &str, args: &[&dyn Display]) -> String;
}

/// Formatter for `{}` placeholders
///
/// Each `{...}` group consumes the next argument. Text inside the braces is
/// accepted but the argument is always rendered via `Display`. Surplus
/// placeholders are kept as they are. Text wrapped in single quotes is output
/// literally, and `''` produces a single quote.
#[derive(Debug, Clone, Copy, Default)]
pub struct BraceMessageFormatter;

impl BraceMessageFormatter {
    pub fn new() -> Self {
        Self
    }

    fn find_closing_quote(chars: &[char], start: usize) -> Option<usize> {
        chars[start.min(chars.len())..]
            .iter()
            .position(|c| *c == '\'')
            .map(|offset| start + offset)
    }

    fn find_closing_bracket(chars: &[char], start: usize) -> Option<usize> {
        let mut open = 1;
        let mut index = start;

        while index < chars.len() {
            match chars[index] {
                '\'' => {
                    if let Some(closing) = Self::find_closing_quote(chars, index + 1) {
                        index = closing;
                    }
                }
                '{' => open += 1,
                '}' => {
                    open -= 1;
                    if open == 0 {
                        return Some(index);
                    }
                }
                _ => {}
            }
            index += 1;
        }

        None
    }
}

impl MessageFormatter for BraceMessageFormatter {
    fn format(&self, message: &str, args: &[&dyn Display]) -> String {
        let chars: Vec<char> = message.chars().collect();
        let mut output = String::with_capacity(message.len() + 32);
        let mut next_arg = 0;
        let mut index = 0;

        while index < chars.len() {
            let c = chars[index];

            if c == '\'' {
                match Self::find_closing_quote(&chars, index + 1) {
                    Some(closing) if closing == index + 1 => {
                        output.push('\'');
                        index += 2;
                        continue;
                    }
                    Some(closing) => {
                        output.extend(&chars[index + 1..closing]);
                        index = closing + 1;
                        continue;
                    }
                    None => {}
                }
            } else if c == '{' && next_arg < args.len() {
                if let Some(closing) = Self::find_closing_bracket(&chars, index + 1) {
                    let _ = write!(output, "{}", args[next_arg]);
                    next_arg += 1;
                    index = closing + 1;
                    continue;
                }
            }

            output.push(c);
            index += 1;
        }

        output
    }
}
