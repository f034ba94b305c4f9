use super::{Literal, Path};
use crate::lexer::Position;

/// One of the six range-pattern flavors named in §3.2: `..`, `..=`, `bound..`, `..bound`,
/// `..=bound`, `bound...bound`. Presence/absence of `start`/`end` plus `inclusive`
/// together enumerate all six.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePatternKind {
    Exclusive,
    Inclusive,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldPattern {
    pub name: String,
    pub pattern: Pattern,
    /// `field` shorthand for `field: field`.
    pub shorthand: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Literal {
        negated: bool,
        value: Literal,
        pos: Position,
    },
    Ident {
        by_ref: bool,
        mutable: bool,
        name: String,
        sub: Option<Box<Pattern>>,
        pos: Position,
    },
    Wildcard(Position),
    Rest(Position),
    Reference {
        double: bool,
        mutable: bool,
        inner: Box<Pattern>,
        pos: Position,
    },
    Struct {
        path: Path,
        fields: Vec<FieldPattern>,
        has_rest: bool,
        pos: Position,
    },
    TupleStruct {
        path: Path,
        elems: Vec<Pattern>,
        pos: Position,
    },
    Tuple {
        elems: Vec<Pattern>,
        pos: Position,
    },
    Paren(Box<Pattern>, Position),
    Slice {
        elems: Vec<Pattern>,
        pos: Position,
    },
    Path(Path, Position),
    Range {
        start: Option<Box<Pattern>>,
        end: Option<Box<Pattern>>,
        kind: RangePatternKind,
        pos: Position,
    },
    /// `p1 | p2 | ...`, valid only at the top pattern level (§4.1.3).
    Or(Vec<Pattern>, Position),
}

impl Pattern {
    pub fn pos(&self) -> Position {
        match self {
            Pattern::Literal { pos, .. }
            | Pattern::Ident { pos, .. }
            | Pattern::Wildcard(pos)
            | Pattern::Rest(pos)
            | Pattern::Reference { pos, .. }
            | Pattern::Struct { pos, .. }
            | Pattern::TupleStruct { pos, .. }
            | Pattern::Tuple { pos, .. }
            | Pattern::Paren(_, pos)
            | Pattern::Slice { pos, .. }
            | Pattern::Path(_, pos)
            | Pattern::Range { pos, .. }
            | Pattern::Or(_, pos) => *pos,
        }
    }

    /// Simple `ident` or `mut ident` pattern, for let/parameter bindings.
    pub fn simple_name(&self) -> Option<&str> {
        match self {
            Pattern::Ident { name, sub: None, .. } => Some(name),
            _ => None,
        }
    }

    /// Whether the outermost pattern position carries `mut` (§4.2.4).
    pub fn declares_mutable(&self) -> bool {
        match self {
            Pattern::Ident { mutable, .. } => *mutable,
            Pattern::Reference { mutable, inner, .. } => *mutable || inner.declares_mutable(),
            Pattern::Paren(inner, _) => inner.declares_mutable(),
            _ => false,
        }
    }
}
