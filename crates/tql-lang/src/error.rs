//! Parse errors with source-context rendering.

use crate::span::Span;
use std::fmt::Write;
use thiserror::Error;

/// Error raised while lexing or parsing a TQL expression.
///
/// Parsing never recovers: the first error aborts the whole expression.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    /// Offending token, or a zero-width span past the end of the input.
    pub span: Span,
    pub hint: Option<String>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            hint: None,
        }
    }

    /// Error for input that ended in the middle of an expression.
    pub fn unexpected_end(source: &str, expected: &str) -> Self {
        Self::new(
            format!("unexpected end of input, expected {}", expected),
            Span::at(source.len()),
        )
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Render the error with its line, a caret under the offending token and
    /// the hint, if any:
    ///
    /// ```text
    /// error: expected a quoted value, found 'Charles'
    ///   --> line 1:9
    ///    |
    ///   1| (0001 = Charles)
    ///    |         ^~~~~~~
    ///    = hint: quote the value: 'Charles'
    /// ```
    pub fn format_with_source(&self, source: &str) -> String {
        let (line, col) = self.span.line_col(source);
        let mut out = String::new();
        let _ = writeln!(out, "error: {}", self.message);
        let _ = writeln!(out, "  --> line {}:{}", line, col);

        if let Some(text) = source.lines().nth(line - 1) {
            let width = text.chars().count().saturating_sub(col - 1).max(1);
            let underline = self.span.len().clamp(1, width);
            let _ = writeln!(out, "   |");
            let _ = writeln!(out, "{:3}| {}", line, text);
            let _ = writeln!(
                out,
                "   |{}^{}",
                " ".repeat(col),
                "~".repeat(underline - 1)
            );
        }

        if let Some(hint) = &self.hint {
            let _ = writeln!(out, "   = hint: {}", hint);
        }
        out
    }
}
