use crate::diagnostics::Diagnostic;
use crate::lexer::{Position, Token, TokenKind};

pub type PResult<T> = Result<T, Diagnostic>;

/// Token cursor with `save`/`restore` for the speculative parses named in §4.1.6
/// (block-vs-expression, tuple-vs-grouped, inherent-vs-trait impl).
pub struct ParseState<'a> {
    tokens: Vec<Token>,
    pos: usize,
    src: &'a str,
    /// Set while parsing an `if`/`while`/`match` scrutinee (§4.1.4) so a bare `{` after a
    /// path is read as a block/arm boundary rather than the start of a struct literal.
    restrict_struct_lit: bool,
}

impl<'a> ParseState<'a> {
    pub fn new(tokens: Vec<Token>, src: &'a str) -> Self {
        ParseState {
            tokens,
            pos: 0,
            src,
            restrict_struct_lit: false,
        }
    }

    pub fn restrict_struct_lit(&self) -> bool {
        self.restrict_struct_lit
    }

    /// Sets the restriction, returning the previous value so callers can restore it.
    pub fn set_restrict_struct_lit(&mut self, value: bool) -> bool {
        std::mem::replace(&mut self.restrict_struct_lit, value)
    }

    pub fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub fn peek_at(&self, offset: usize) -> &Token {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    pub fn at_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    pub fn bump(&mut self) -> Token {
        let tok = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    pub fn pos_mark(&self) -> Position {
        self.peek().pos
    }

    pub fn save(&self) -> usize {
        self.pos
    }

    pub fn restore(&mut self, mark: usize) {
        self.pos = mark;
    }

    pub fn is(&self, text: &str) -> bool {
        self.peek().is(text)
    }

    pub fn is_kind(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    pub fn eat(&mut self, text: &str) -> bool {
        if self.is(text) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub fn expect(&mut self, text: &str) -> PResult<Token> {
        if self.is(text) {
            Ok(self.bump())
        } else {
            Err(self.error(format!(
                "expected `{text}`, found `{}`",
                self.peek().text
            )))
        }
    }

    pub fn expect_identifier(&mut self) -> PResult<String> {
        if self.is_kind(TokenKind::Identifier) {
            Ok(self.bump().text)
        } else {
            Err(self.error(format!(
                "expected an identifier, found `{}`",
                self.peek().text
            )))
        }
    }

    pub fn error(&self, message: impl Into<String>) -> Diagnostic {
        Diagnostic::at(message, self.peek().pos, self.src)
    }

    pub fn eof_error(&self, item: &str) -> Diagnostic {
        Diagnostic::new(format!("hit end of input while parsing {item}"))
    }
}
