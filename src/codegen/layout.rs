//! Struct layout and the static function/method signature tables the IR generator needs
//! at emission time (§4.3.4). Built by a single pre-scan of the top-level item list before
//! any instruction is emitted, mirroring the reference's `preScan`.

use std::collections::HashMap;

use crate::ast::{AssocItem, Expr, Item, Literal, Ty, TopLevel};
use crate::checker::types::canonical;

use super::Val;

#[derive(Debug, Clone)]
pub struct FnSig {
    pub params: Vec<Ty>,
    pub ret: Ty,
    pub self_by_ref: Option<bool>,
}

#[derive(Default)]
pub struct Layout {
    pub structs: HashMap<String, Vec<(String, Ty)>>,
    pub functions: HashMap<String, FnSig>,
    pub methods: HashMap<String, FnSig>,
    /// Item-level constants folded at collection time; never emitted as LLVM globals
    /// (§4.3.3's constant folding, not a runtime load).
    pub constants: HashMap<String, Val>,
    pub enum_variants: HashMap<String, i64>,
}

impl Layout {
    pub fn new() -> Self {
        Layout::default()
    }

    pub fn collect(&mut self, program: &[TopLevel]) {
        for node in program {
            if let TopLevel::Item(item) = node {
                self.collect_item(item);
            }
        }
    }

    fn collect_item(&mut self, item: &Item) {
        match item {
            Item::Function(f) => {
                self.functions.insert(
                    f.name.clone(),
                    FnSig {
                        params: f.params.iter().map(|p| p.ty.clone()).collect(),
                        ret: f.ret.clone(),
                        self_by_ref: None,
                    },
                );
            }
            Item::StructStruct(st) => {
                self.structs.insert(
                    st.name.clone(),
                    st.fields.iter().map(|f| (f.name.clone(), f.ty.clone())).collect(),
                );
            }
            Item::TupleStruct(st) => {
                self.structs.insert(
                    st.name.clone(),
                    st.fields
                        .iter()
                        .enumerate()
                        .map(|(i, ty)| (i.to_string(), ty.clone()))
                        .collect(),
                );
            }
            Item::UnitStruct { name, .. } => {
                self.structs.insert(name.clone(), vec![]);
            }
            Item::InherentImpl(im) => self.collect_impl(&im.self_ty, &im.items),
            Item::TraitImpl(im) => self.collect_impl(&im.self_ty, &im.items),
            Item::Module(m) => {
                for inner in &m.items {
                    self.collect_item(inner);
                }
            }
            Item::Enumeration(e) => {
                for (ord, variant) in e.variants.iter().enumerate() {
                    self.enum_variants.insert(format!("{}::{}", e.name, variant.name), ord as i64);
                }
            }
            Item::Constant(c) => {
                if let Some(val) = fold_const(&c.value) {
                    self.constants.insert(c.name.clone(), val);
                }
            }
            Item::Trait(_) => {}
        }
    }

    fn collect_impl(&mut self, self_ty: &Ty, items: &[AssocItem]) {
        let type_name = canonical(self_ty.strip_refs());
        for item in items {
            match item {
                AssocItem::Function(f) => {
                    let qualified = format!("{type_name}::{}", f.name);
                    self.methods.insert(
                        qualified,
                        FnSig {
                            params: f.params.iter().map(|p| p.ty.clone()).collect(),
                            ret: f.ret.clone(),
                            self_by_ref: f.self_param.as_ref().map(|sp| sp.by_ref),
                        },
                    );
                }
                AssocItem::Constant(c) => {
                    if let Some(val) = fold_const(&c.value) {
                        self.constants.insert(format!("{type_name}::{}", c.name), val);
                    }
                }
                AssocItem::Type { .. } => {}
            }
        }
    }

    pub fn constant_value(&self, name: &str) -> Option<Val> {
        self.constants.get(name).cloned()
    }

    pub fn field_index(&self, struct_name: &str, field: &str) -> Option<usize> {
        self.structs.get(struct_name)?.iter().position(|(n, _)| n == field)
    }

    pub fn field_type(&self, struct_name: &str, field: &str) -> Option<&Ty> {
        self.structs.get(struct_name)?.iter().find(|(n, _)| n == field).map(|(_, t)| t)
    }

    /// The struct name and field list for `ty`, if it names a registered by-value struct
    /// type (not a reference/pointer to one). Used for the parameter/argument/self
    /// field-flatten convention of §4.3.1/§4.3.7.
    pub fn struct_fields_for(&self, ty: &Ty) -> Option<(String, Vec<(String, Ty)>)> {
        let Ty::Path(p) = ty else { return None };
        let name = p.last();
        self.structs.get(name).map(|fields| (name.to_string(), fields.clone()))
    }

    /// The LLVM type string for a `Ty`, widening `u32` to `i64` per §4.3.6 and collapsing
    /// unknown/struct paths via the registered struct table.
    pub fn llvm_type(&self, ty: &Ty) -> String {
        match ty {
            Ty::Path(p) => self.llvm_scalar(p.last()),
            Ty::Reference { inner, .. } => format!("{}*", self.llvm_type(inner)),
            Ty::Array { elem, len } => {
                let n = crate::checker::types::array_len_literal(len).max(0);
                format!("[{n} x {}]", self.llvm_type(elem))
            }
            Ty::Slice(inner) => format!("{}*", self.llvm_type(inner)),
            Ty::Tuple(elems) if elems.is_empty() => "void".to_string(),
            Ty::Tuple(elems) => format!(
                "{{{}}}",
                elems.iter().map(|t| self.llvm_type(t)).collect::<Vec<_>>().join(", ")
            ),
            Ty::Never => "void".to_string(),
            Ty::Paren(inner) => self.llvm_type(inner),
            _ => "i32".to_string(),
        }
    }

    fn llvm_scalar(&self, name: &str) -> String {
        match name {
            "i8" | "u8" => "i8".to_string(),
            "i16" | "u16" => "i16".to_string(),
            "i32" => "i32".to_string(),
            // §4.3.6: u32 is represented internally as i64 to avoid overflow.
            "u32" => "i64".to_string(),
            "i64" | "u64" => "i64".to_string(),
            "i128" | "u128" => "i128".to_string(),
            "isize" | "usize" => "i64".to_string(),
            "bool" => "i1".to_string(),
            "char" => "i32".to_string(),
            "f32" => "float".to_string(),
            "f64" => "double".to_string(),
            "str" => "i8".to_string(),
            other => {
                if self.structs.contains_key(other) {
                    format!("%{other}")
                } else {
                    "i32".to_string()
                }
            }
        }
    }
}

/// Folds a constant initializer into an immediate value at collection time. Only literal
/// (optionally negated) expressions resolve; anything else is left for ordinary evaluation
/// at each use site rather than guessed at.
fn fold_const(expr: &Expr) -> Option<Val> {
    match expr {
        Expr::Literal(Literal::Int(v, suffix), _) => {
            let llvm_ty = match suffix.as_deref() {
                Some("u32" | "i64" | "isize" | "u64" | "usize") => "i64",
                Some("i8" | "u8") => "i8",
                Some("i16" | "u16") => "i16",
                _ => "i32",
            };
            let ty_name = suffix.clone().unwrap_or_else(|| "i32".to_string());
            Some(Val::Imm { llvm_ty: llvm_ty.to_string(), text: v.to_string(), ty: Ty::path_named(ty_name) })
        }
        Expr::Literal(Literal::Bool(b), _) => Some(Val::Imm {
            llvm_ty: "i1".to_string(),
            text: if *b { "1".to_string() } else { "0".to_string() },
            ty: Ty::path_named("bool"),
        }),
        Expr::Neg { logical: false, inner, .. } => {
            let inner = fold_const(inner)?;
            if let Val::Imm { llvm_ty, text, ty } = inner {
                let negated = text.strip_prefix('-').map(|s| s.to_string()).unwrap_or_else(|| format!("-{text}"));
                Some(Val::Imm { llvm_ty, text: negated, ty })
            } else {
                None
            }
        }
        Expr::Grouped(inner, _) => fold_const(inner),
        _ => None,
    }
}
