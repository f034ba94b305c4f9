use super::{Block, Expr, Path, Ty};
use crate::lexer::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FnQualifiers {
    pub is_const: bool,
    pub is_async: bool,
    pub is_unsafe: bool,
}

/// The receiver of a method: `self`, `&self`, `&mut self`, or `mut self`.
#[derive(Debug, Clone, PartialEq)]
pub struct SelfParam {
    pub by_ref: bool,
    pub mutable: bool,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub pattern: super::Pattern,
    pub ty: Ty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub qualifiers: FnQualifiers,
    pub self_param: Option<SelfParam>,
    pub params: Vec<Param>,
    pub ret: Ty,
    /// `None` for a trait-method signature with no default body.
    pub body: Option<Block>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub ty: Ty,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructStruct {
    pub name: String,
    pub fields: Vec<FieldDef>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TupleStruct {
    pub name: String,
    pub fields: Vec<Ty>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnumVariantKind {
    Unit,
    Tuple(Vec<Ty>),
    Struct(Vec<FieldDef>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumVariant {
    pub name: String,
    pub kind: EnumVariantKind,
    pub discriminant: Option<Expr>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enumeration {
    pub name: String,
    pub variants: Vec<EnumVariant>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstantItem {
    pub name: String,
    pub ty: Ty,
    pub value: Expr,
    pub pos: Position,
}

/// An item nested inside a `trait`/`impl` body: associated function, constant, or type.
#[derive(Debug, Clone, PartialEq)]
pub enum AssocItem {
    Function(Function),
    Constant(ConstantItem),
    Type { name: String, pos: Position },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trait {
    pub name: String,
    pub items: Vec<AssocItem>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InherentImpl {
    pub self_ty: Ty,
    pub items: Vec<AssocItem>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraitImpl {
    pub trait_path: Path,
    pub self_ty: Ty,
    pub items: Vec<AssocItem>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub name: String,
    pub items: Vec<Item>,
    pub pos: Position,
}

/// The Item role (§3.2): the nine top-level declaration shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Function(Function),
    StructStruct(StructStruct),
    TupleStruct(TupleStruct),
    /// `struct Unit;`
    UnitStruct { name: String, pos: Position },
    Enumeration(Enumeration),
    Trait(Trait),
    InherentImpl(InherentImpl),
    TraitImpl(TraitImpl),
    Constant(ConstantItem),
    Module(Module),
}

impl Item {
    pub fn pos(&self) -> Position {
        match self {
            Item::Function(f) => f.pos,
            Item::StructStruct(s) => s.pos,
            Item::TupleStruct(s) => s.pos,
            Item::UnitStruct { pos, .. } => *pos,
            Item::Enumeration(e) => e.pos,
            Item::Trait(t) => t.pos,
            Item::InherentImpl(i) => i.pos,
            Item::TraitImpl(i) => i.pos,
            Item::Constant(c) => c.pos,
            Item::Module(m) => m.pos,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Item::Function(f) => Some(&f.name),
            Item::StructStruct(s) => Some(&s.name),
            Item::TupleStruct(s) => Some(&s.name),
            Item::UnitStruct { name, .. } => Some(name),
            Item::Enumeration(e) => Some(&e.name),
            Item::Trait(t) => Some(&t.name),
            Item::Constant(c) => Some(&c.name),
            Item::Module(m) => Some(&m.name),
            Item::InherentImpl(_) | Item::TraitImpl(_) => None,
        }
    }
}
