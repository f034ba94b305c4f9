//! # Lexer
//!
//! The tokenizer sits at the boundary of the compiler: it turns source text into a flat
//! token stream and otherwise carries no state beyond a position cursor. Per the
//! specification this stage is an external collaborator — its regex catalogue is not part
//! of the redesign surface, so this module stays deliberately small and table-driven,
//! mirroring the "longest match, fixed priority, ties broken by table order" contract of
//! §6.1 rather than reinventing a different tokenization strategy.

pub mod token;

pub use token::{Position, Token, TokenKind};

use once_cell::sync::Lazy;
use regex::Regex;

const STRICT_KEYWORDS: &[&str] = &[
    "fn", "let", "mut", "if", "else", "while", "loop", "match", "return", "break", "continue",
    "struct", "enum", "trait", "impl", "const", "static", "true", "false", "self", "Self", "as",
    "pub", "use", "mod", "type", "where", "for", "in", "ref", "move", "async", "await", "unsafe",
    "extern", "dyn",
];

const RESERVED_KEYWORDS: &[&str] = &[
    "abstract", "become", "do", "final", "macro", "override", "priv", "typeof", "unsized",
    "virtual", "yield", "try",
];

fn keyword_alternation(words: &[&str]) -> String {
    let mut sorted = words.to_vec();
    sorted.sort_by_key(|w| std::cmp::Reverse(w.len()));
    format!(r"\A(?:{})\b", sorted.join("|"))
}

static STRICT_KEYWORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&keyword_alternation(STRICT_KEYWORDS)).unwrap());
static RESERVED_KEYWORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&keyword_alternation(RESERVED_KEYWORDS)).unwrap());
static IDENTIFIER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\A[a-zA-Z_][a-zA-Z0-9_]*").unwrap());
static LIFETIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A'[a-zA-Z_][a-zA-Z0-9_]*(?:'|$)?").unwrap());
static CHAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\A'(?:\\.|[^'\\])'").unwrap());
static STRING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\A"(?:\\.|[^"\\])*""#).unwrap());
static BYTE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\Ab'(?:\\.|[^'\\])'").unwrap());
static BYTE_STRING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\Ab"(?:\\.|[^"\\])*""#).unwrap());
static C_STRING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\Ac"(?:\\.|[^"\\])*""#).unwrap());
static FLOAT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\A[0-9][0-9_]*\.[0-9][0-9_]*(?:[eE][+-]?[0-9]+)?(?:f32|f64)?").unwrap()
});
static INTEGER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\A(?:0x[0-9a-fA-F_]+|0o[0-7_]+|0b[01_]+|[0-9][0-9_]*)(?:u8|u16|u32|u64|u128|usize|i8|i16|i32|i64|i128|isize)?",
    )
    .unwrap()
});
static PUNCTUATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\A(?:<<=|>>=|\.\.=|\.\.\.|==|!=|<=|>=|&&|\|\||<<|>>|\+=|-=|\*=|/=|%=|&=|\|=|\^=|::|->|=>|\.\.|\+|-|\*|/|%|&|\||\^|!|<|>|=|\.|,|;|:|\?|@|#|\$)",
    )
    .unwrap()
});
static DELIMITER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\A[(){}\[\]]").unwrap());
static RESERVED_TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\A`").unwrap());

/// One lexer rule: a tag plus the regex used to test a longest match at the cursor.
struct Rule {
    kind: TokenKind,
    re: &'static Lazy<Regex>,
}

/// Raw-string-family prefixes are handled outside the regex table: `regex` has no
/// backreferences, so matching a variable number of `#` delimiters needs a short
/// hand-written scan instead of a single pattern.
fn try_raw_literal(rest: &str) -> Option<(TokenKind, usize)> {
    let (kind, after_prefix) = if let Some(s) = rest.strip_prefix("br") {
        (TokenKind::RawByteStr, s)
    } else if let Some(s) = rest.strip_prefix("cr") {
        (TokenKind::RawCStr, s)
    } else if let Some(s) = rest.strip_prefix('r') {
        (TokenKind::RawStr, s)
    } else {
        return None;
    };

    let mut chars = after_prefix.char_indices().peekable();
    let mut hashes = 0usize;
    while let Some(&(_, c)) = chars.peek() {
        if c == '#' {
            hashes += 1;
            chars.next();
        } else {
            break;
        }
    }
    match chars.next() {
        Some((_, '"')) => {}
        _ => return None,
    }

    let prefix_len = rest.len() - after_prefix.len() + hashes + 1;
    let body = &rest[prefix_len..];
    let closer = format!("\"{}", "#".repeat(hashes));
    let close_at = body.find(&closer)?;
    Some((kind, prefix_len + close_at + closer.len()))
}

/// Skip whitespace and comments, advancing line/column tracking through both.
fn skip_trivia(src: &str, mut offset: usize, pos: &mut Position) -> usize {
    loop {
        let rest = &src[offset..];
        if rest.is_empty() {
            return offset;
        }
        let mut advanced = false;
        if let Some(ws) = rest.chars().next() {
            if ws == ' ' || ws == '\t' || ws == '\r' {
                pos.column += 1;
                offset += ws.len_utf8();
                advanced = true;
            } else if ws == '\n' {
                pos.line += 1;
                pos.column = 1;
                offset += ws.len_utf8();
                advanced = true;
            }
        }
        if !advanced && rest.starts_with("//") {
            let len = rest.find('\n').unwrap_or(rest.len());
            for _ in rest[..len].chars() {
                pos.column += 1;
            }
            offset += len;
            advanced = true;
        }
        if !advanced && rest.starts_with("/*") {
            if let Some(end) = rest[2..].find("*/") {
                let comment = &rest[..end + 4];
                for c in comment.chars() {
                    if c == '\n' {
                        pos.line += 1;
                        pos.column = 1;
                    } else {
                        pos.column += 1;
                    }
                }
                offset += comment.len();
                advanced = true;
            } else {
                // Unterminated block comment: consume the rest of the input.
                offset = src.len();
                advanced = true;
            }
        }
        if !advanced {
            return offset;
        }
    }
}

/// Tokenizes `src` into a flat stream, always ending with a single `TokenKind::Eof`.
pub fn tokenize(src: &str) -> Vec<Token> {
    let rules: [Rule; 8] = [
        Rule {
            kind: TokenKind::StrictKeyword,
            re: &STRICT_KEYWORD_RE,
        },
        Rule {
            kind: TokenKind::ReservedKeyword,
            re: &RESERVED_KEYWORD_RE,
        },
        Rule {
            kind: TokenKind::Identifier,
            re: &IDENTIFIER_RE,
        },
        Rule {
            kind: TokenKind::Float,
            re: &FLOAT_RE,
        },
        Rule {
            kind: TokenKind::Integer,
            re: &INTEGER_RE,
        },
        Rule {
            kind: TokenKind::Punctuation,
            re: &PUNCTUATION_RE,
        },
        Rule {
            kind: TokenKind::Delimiter,
            re: &DELIMITER_RE,
        },
        Rule {
            kind: TokenKind::ReservedToken,
            re: &RESERVED_TOKEN_RE,
        },
    ];

    let literal_rules: [(TokenKind, &Lazy<Regex>); 5] = [
        (TokenKind::Char, &CHAR_RE),
        (TokenKind::Str, &STRING_RE),
        (TokenKind::Byte, &BYTE_RE),
        (TokenKind::ByteStr, &BYTE_STRING_RE),
        (TokenKind::CStr, &C_STRING_RE),
    ];

    let mut tokens = Vec::new();
    let mut offset = 0usize;
    let mut pos = Position { line: 1, column: 1 };

    loop {
        offset = skip_trivia(src, offset, &mut pos);
        if offset >= src.len() {
            break;
        }
        let rest = &src[offset..];
        let start_pos = pos;

        // Longest match across every category, ties broken by table order.
        let mut best: Option<(TokenKind, usize)> = None;

        if let Some((kind, len)) = try_raw_literal(rest) {
            best = Some((kind, len));
        }
        for (kind, re) in literal_rules {
            if let Some(m) = re.find(rest) {
                let len = m.end();
                if best.as_ref().map(|(_, l)| len > *l).unwrap_or(true) {
                    best = Some((kind, len));
                }
            }
        }
        if let Some(m) = LIFETIME_RE.find(rest) {
            let len = m.end();
            if !rest[..len].ends_with('\'') {
                if best.as_ref().map(|(_, l)| len > *l).unwrap_or(true) {
                    best = Some((TokenKind::Lifetime, len));
                }
            }
        }
        for rule in &rules {
            if let Some(m) = rule.re.find(rest) {
                let len = m.end();
                if best.as_ref().map(|(_, l)| len > *l).unwrap_or(true) {
                    best = Some((rule.kind, len));
                }
            }
        }

        let (kind, len) = match best {
            Some(pair) if pair.1 > 0 => pair,
            _ => {
                let ch = rest.chars().next().unwrap();
                (TokenKind::Unknown, ch.len_utf8())
            }
        };

        let text = rest[..len].to_string();
        tokens.push(Token::new(kind, text, start_pos));

        for c in rest[..len].chars() {
            if c == '\n' {
                pos.line += 1;
                pos.column = 1;
            } else {
                pos.column += 1;
            }
        }
        offset += len;
    }

    tokens.push(Token::new(TokenKind::Eof, "", pos));
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_hello_number() {
        let toks = tokenize("fn main() { printlnInt(42); }");
        let kinds: Vec<_> = toks.iter().map(|t| (t.kind, t.text.as_str())).collect();
        assert_eq!(kinds[0], (TokenKind::StrictKeyword, "fn"));
        assert_eq!(kinds[1], (TokenKind::Identifier, "main"));
        assert!(kinds.iter().any(|(k, t)| *k == TokenKind::Integer && *t == "42"));
        assert_eq!(toks.last().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn skips_comments_and_tracks_position() {
        let toks = tokenize("// a comment\nlet /* block */ x = 1;");
        let let_tok = toks.iter().find(|t| t.text == "let").unwrap();
        assert_eq!(let_tok.pos.line, 2);
    }

    #[test]
    fn keyword_beats_identifier_on_tie() {
        let toks = tokenize("let");
        assert_eq!(toks[0].kind, TokenKind::StrictKeyword);
    }

    #[test]
    fn identifier_survives_keyword_prefix() {
        let toks = tokenize("format");
        assert_eq!(toks[0].kind, TokenKind::Identifier);
        assert_eq!(toks[0].text, "format");
    }

    #[test]
    fn raw_string_with_hashes() {
        let toks = tokenize(r##"r#"hi "there""#"##);
        assert_eq!(toks[0].kind, TokenKind::RawStr);
        assert_eq!(toks[0].text, r##"r#"hi "there""#"##);
    }

    #[test]
    fn unknown_byte_is_isolated() {
        let toks = tokenize("let x = 1 § 2;");
        assert!(toks.iter().any(|t| t.kind == TokenKind::Unknown));
    }
}
