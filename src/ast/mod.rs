//! # Abstract syntax tree
//!
//! Every node falls into one of five mutually exclusive roles — Item, Statement,
//! Expression, Type, Pattern — and carries the source position of the first token that
//! produced it (§3.4). Each role is a single sum type; there is no `NodeType` tag field
//! and no `dynamic_cast` ladder, since pattern matching on the variant already gives
//! exhaustive, checked dispatch.

pub mod expr;
pub mod item;
pub mod pattern;
pub mod stmt;
pub mod ty;

pub use crate::lexer::Position;
pub use expr::*;
pub use item::*;
pub use pattern::*;
pub use stmt::*;
pub use ty::*;

/// A `::`-separated path, e.g. `std::mem::swap` or a single bare identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    pub leading_colon: bool,
    pub segments: Vec<String>,
}

impl Path {
    pub fn single(name: impl Into<String>) -> Self {
        Path {
            leading_colon: false,
            segments: vec![name.into()],
        }
    }

    /// The last segment, e.g. the struct/enum/function name a path ultimately names.
    pub fn last(&self) -> &str {
        self.segments.last().map(|s| s.as_str()).unwrap_or("")
    }

    pub fn join(&self) -> String {
        self.segments.join("::")
    }
}

/// A node appearing directly in the top-level sequence: an item, a statement, or a bare
/// trailing expression (§3.2).
#[derive(Debug, Clone, PartialEq)]
pub enum TopLevel {
    Item(Item),
    Statement(Stmt),
    Expr(Expr),
}

impl TopLevel {
    pub fn pos(&self) -> Position {
        match self {
            TopLevel::Item(i) => i.pos(),
            TopLevel::Statement(s) => s.pos(),
            TopLevel::Expr(e) => e.pos(),
        }
    }
}
