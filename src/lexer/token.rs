use std::fmt;

/// A 1-indexed source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The closed tag set a [`Token`] can carry. Mirrors §3.1 / §6.1 of the spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    StrictKeyword,
    ReservedKeyword,
    Identifier,
    Char,
    Str,
    RawStr,
    Byte,
    ByteStr,
    RawByteStr,
    CStr,
    RawCStr,
    Integer,
    Float,
    Lifetime,
    Punctuation,
    Delimiter,
    ReservedToken,
    Unknown,
    Eof,
}

impl TokenKind {
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::Char
                | TokenKind::Str
                | TokenKind::RawStr
                | TokenKind::Byte
                | TokenKind::ByteStr
                | TokenKind::RawByteStr
                | TokenKind::CStr
                | TokenKind::RawCStr
                | TokenKind::Integer
                | TokenKind::Float
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub pos: Position,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, pos: Position) -> Self {
        Token {
            kind,
            text: text.into(),
            pos,
        }
    }

    pub fn is(&self, text: &str) -> bool {
        self.text == text
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?})@{}", self.kind, self.text, self.pos)
    }
}
