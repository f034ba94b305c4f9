//! Shared diagnostic type for the parser and checker.
//!
//! Mirrors the reference's `ParseError`/`Span::to_string`: a message plus an optional
//! source position, rendered as a two-line excerpt with a caret underline via `colored`.

use colored::Colorize;
use std::fmt;

use crate::lexer::Position;

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub message: String,
    pub pos: Option<Position>,
    /// Cloned alongside `pos` so `Display` is self-contained, same tradeoff the reference
    /// makes by embedding `source: String` directly in `Span`.
    pub source: Option<String>,
    pub len: usize,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            pos: None,
            source: None,
            len: 1,
        }
    }

    pub fn at(message: impl Into<String>, pos: Position, source: &str) -> Self {
        Diagnostic {
            message: message.into(),
            pos: Some(pos),
            source: Some(source.to_string()),
            len: 1,
        }
    }

    pub fn spanning(message: impl Into<String>, pos: Position, source: &str, len: usize) -> Self {
        Diagnostic {
            message: message.into(),
            pos: Some(pos),
            source: Some(source.to_string()),
            len: len.max(1),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.pos, &self.source) {
            (Some(pos), Some(source)) => {
                let lines: Vec<&str> = source.lines().collect();
                let line_idx = pos.line.saturating_sub(1);
                let prev_line = if pos.line > 1 {
                    lines.get(line_idx.saturating_sub(1)).copied().unwrap_or("")
                } else {
                    ""
                };
                let line_str = lines.get(line_idx).copied().unwrap_or("");

                let left_margin = format!("{}", pos.line).len();
                let left_margin_fill = " ".repeat(left_margin);
                let left_padding_fill = " ".repeat(pos.column.saturating_sub(1));
                let underline = "^".repeat(self.len).red();

                write!(
                    f,
                    "{left_margin_fill} |{prev_line}\n{} |{line_str}\n{left_margin_fill} |{left_padding_fill}{underline}   {}",
                    pos.line, self.message
                )
            }
            _ => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for Diagnostic {}
