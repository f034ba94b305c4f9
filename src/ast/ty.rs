use super::Path;
use crate::ast::Expr;
use crate::lexer::Position;

/// The Type role (§3.2). Structural equality between two `Ty` values is *not* derived
/// `PartialEq` on this tree — it is the canonical-string comparison of §4.2.5, computed by
/// `crate::checker::types::canonical`.
#[derive(Debug, Clone, PartialEq)]
pub enum Ty {
    Path(Path),
    Reference {
        mutable: bool,
        inner: Box<Ty>,
    },
    Array {
        elem: Box<Ty>,
        len: Box<Expr>,
    },
    Slice(Box<Ty>),
    Tuple(Vec<Ty>),
    Paren(Box<Ty>),
    Never,
    Inferred,
    QualifiedPath {
        ty: Box<Ty>,
        as_path: Option<Path>,
        segments: Vec<String>,
    },
    /// `Fn(T1, T2) -> R`, appearing as a path segment's generic argument in practice but
    /// modeled directly since it is the only higher-order type shape the checker needs.
    Fn {
        params: Vec<Ty>,
        ret: Box<Ty>,
    },
}

impl Ty {
    pub fn unit() -> Ty {
        Ty::Tuple(vec![])
    }

    pub fn path_named(name: impl Into<String>) -> Ty {
        Ty::Path(Path::single(name))
    }

    pub fn is_self(&self) -> bool {
        matches!(self, Ty::Path(p) if p.segments.len() == 1 && (p.last() == "Self" || p.last() == "self"))
    }

    /// Strips any number of leading `&`/`&mut` layers, e.g. for method-receiver mangling
    /// (§4.3.2) where `T` is derived from the impl type with outer references stripped.
    pub fn strip_refs(&self) -> &Ty {
        let mut cur = self;
        while let Ty::Reference { inner, .. } = cur {
            cur = inner;
        }
        cur
    }
}

pub fn dummy_pos() -> Position {
    Position { line: 0, column: 0 }
}
