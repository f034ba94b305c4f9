//! # IR generator
//!
//! Walks the checked AST once and emits textual LLVM IR (§4.3). Every local binding is a
//! stack slot; reads reload, writes restore. Control flow lowers without `phi` nodes,
//! reconciling branches through a merge slot instead (§4.3.5). A by-value struct parameter
//! (including a by-value `self`) is never passed as one aggregate argument: it arrives as
//! one scalar argument per field (`%param.<name>.<field>`) and is reassembled inside the
//! callee with a chain of `insertvalue` instructions before being stored into its `alloca`'d
//! slot; call sites mirror this by flattening a by-value struct argument into its fields via
//! `getelementptr`+`load` before the call (§4.3.1, §4.3.7).

pub mod builtins;
pub mod control;
pub mod expr;
pub mod layout;
pub mod mangle;
pub mod stmt;

use std::collections::HashMap;

use crate::ast::*;
use crate::checker::types::canonical;
use crate::diagnostics::Diagnostic;
use layout::Layout;

pub type CgResult<T> = Result<T, Diagnostic>;

#[derive(Debug, Clone)]
pub struct VarSlot {
    pub llvm_ty: String,
    pub addr: String,
    pub ty: Ty,
}

/// A lowered expression: either a materialized value (register or immediate) or the
/// address of a stack slot still awaiting a load.
#[derive(Debug, Clone)]
pub enum Val {
    Imm { llvm_ty: String, text: String, ty: Ty },
    Addr { llvm_ty: String, addr: String, ty: Ty },
}

impl Val {
    pub fn ty(&self) -> &Ty {
        match self {
            Val::Imm { ty, .. } | Val::Addr { ty, .. } => ty,
        }
    }

    pub fn llvm_ty(&self) -> &str {
        match self {
            Val::Imm { llvm_ty, .. } | Val::Addr { llvm_ty, .. } => llvm_ty,
        }
    }
}

pub struct Codegen {
    out: String,
    temp: usize,
    label: usize,
    str_count: usize,
    string_globals: Vec<String>,
    layout: Layout,
    vars: Vec<HashMap<String, VarSlot>>,
    return_slot: Option<String>,
    return_label: Option<String>,
    return_llvm_ty: Option<String>,
    terminated: bool,
    loop_stack: Vec<(String, String)>,
    src: String,
}

/// Entry point: lowers a fully checked program to a complete IR module text (§6.3).
pub fn generate(src: &str, program: &[TopLevel]) -> CgResult<String> {
    let mut nested_items = Vec::new();
    for node in program {
        if let TopLevel::Item(item) = node {
            collect_nested_items(item, &mut nested_items);
        }
    }

    let mut layout = Layout::new();
    layout.collect(program);
    let nested_as_top: Vec<TopLevel> =
        nested_items.iter().cloned().map(TopLevel::Item).collect();
    layout.collect(&nested_as_top);

    let mut cg = Codegen {
        out: String::new(),
        temp: 0,
        label: 0,
        str_count: 0,
        string_globals: Vec::new(),
        layout,
        vars: vec![HashMap::new()],
        return_slot: None,
        return_label: None,
        return_llvm_ty: None,
        terminated: false,
        loop_stack: Vec::new(),
        src: src.to_string(),
    };

    let mut struct_text = String::new();
    for node in program {
        if let TopLevel::Item(item) = node {
            cg.emit_struct_decl(item, &mut struct_text);
        }
    }
    for item in &nested_items {
        cg.emit_struct_decl(item, &mut struct_text);
    }

    for item in &nested_items {
        cg.generate_item(item)?;
    }
    for node in program {
        if let TopLevel::Item(item) = node {
            cg.generate_item(item)?;
        }
    }

    let mut result = String::new();
    result.push_str("; ModuleID = 'generated.ll'\n");
    result.push_str("source_filename = \"generated.ll\"\n");
    result.push_str(
        "target datalayout = \"e-m:e-p270:32:32-p271:32:32-p272:64:64-i64:64-i128:128-f80:128-n8:16:32:64-S128\"\n",
    );
    result.push_str("target triple = \"x86_64-unknown-linux-gnu\"\n\n");
    result.push_str(&struct_text);
    if !struct_text.is_empty() {
        result.push('\n');
    }
    result.push_str(builtins::BUILTIN_IR);
    for g in &cg.string_globals {
        result.push_str(g);
        result.push('\n');
    }
    if !cg.string_globals.is_empty() {
        result.push('\n');
    }
    result.push_str(&cg.out);
    Ok(result)
}

impl Codegen {
    fn emit_struct_decl(&mut self, item: &Item, out: &mut String) {
        match item {
            Item::StructStruct(st) => {
                let fields = st
                    .fields
                    .iter()
                    .map(|f| self.layout.llvm_type(&f.ty))
                    .collect::<Vec<_>>()
                    .join(", ");
                out.push_str(&format!("%{} = type {{ {fields} }}\n", st.name));
            }
            Item::TupleStruct(st) => {
                let fields = st
                    .fields
                    .iter()
                    .map(|ty| self.layout.llvm_type(ty))
                    .collect::<Vec<_>>()
                    .join(", ");
                out.push_str(&format!("%{} = type {{ {fields} }}\n", st.name));
            }
            Item::UnitStruct { name, .. } => {
                out.push_str(&format!("%{name} = type {{}}\n"));
            }
            Item::Module(m) => {
                for inner in &m.items {
                    self.emit_struct_decl(inner, out);
                }
            }
            _ => {}
        }
    }

    fn generate_item(&mut self, item: &Item) -> CgResult<()> {
        match item {
            Item::Function(f) => self.gen_function(f, None),
            Item::InherentImpl(im) => {
                for a in &im.items {
                    if let AssocItem::Function(f) = a {
                        self.gen_function(f, Some(&im.self_ty))?;
                    }
                }
                Ok(())
            }
            Item::TraitImpl(im) => {
                for a in &im.items {
                    if let AssocItem::Function(f) = a {
                        self.gen_function(f, Some(&im.self_ty))?;
                    }
                }
                Ok(())
            }
            Item::Module(m) => {
                for inner in &m.items {
                    self.generate_item(inner)?;
                }
                Ok(())
            }
            Item::StructStruct(_)
            | Item::TupleStruct(_)
            | Item::UnitStruct { .. }
            | Item::Enumeration(_)
            | Item::Trait(_)
            | Item::Constant(_) => Ok(()),
        }
    }

    fn gen_function(&mut self, f: &Function, impl_ty: Option<&Ty>) -> CgResult<()> {
        let Some(body) = &f.body else { return Ok(()) };

        let type_name = impl_ty.map(|t| canonical(t.strip_refs()));
        let symbol = match &type_name {
            Some(tn) => mangle::method(tn, &f.name),
            None => mangle::function(&f.name),
        };
        let is_main = type_name.is_none() && f.name == "main";

        let mut params: Vec<(String, Ty)> = Vec::new();
        if let Some(sp) = &f.self_param {
            let base = impl_ty.cloned().unwrap_or(Ty::path_named("Self"));
            let self_ty = if sp.by_ref {
                Ty::Reference {
                    mutable: sp.mutable,
                    inner: Box::new(base),
                }
            } else {
                base
            };
            params.push(("self".to_string(), self_ty));
        }
        for param in &f.params {
            let Some(name) = param.pattern.simple_name() else {
                return Err(self.error(
                    "destructuring function parameters are not supported by the IR generator",
                    f.pos,
                ));
            };
            params.push((name.to_string(), param.ty.clone()));
        }

        let ret_llvm = if is_main { "i32".to_string() } else { self.layout.llvm_type(&f.ret) };
        let mut arg_frags: Vec<String> = Vec::new();
        for (name, ty) in &params {
            if let Some((_, fields)) = self.layout.struct_fields_for(ty) {
                for (fname, fty) in &fields {
                    let fllvm = self.layout.llvm_type(fty);
                    arg_frags.push(format!("{fllvm} %param.{name}.{fname}"));
                }
            } else {
                arg_frags.push(format!("{} %arg.{name}", self.layout.llvm_type(ty)));
            }
        }
        let arg_list = arg_frags.join(", ");
        self.emit_raw(&format!("define dso_local {ret_llvm} {symbol}({arg_list}) {{\n"));
        self.terminated = false;

        self.enter_scope();
        self.return_llvm_ty = Some(ret_llvm.clone());
        if ret_llvm != "void" {
            let align = align_for(&ret_llvm);
            self.emit(format!("  %retval = alloca {ret_llvm}, align {align}"));
            if is_main {
                self.emit("  store i32 0, i32* %retval".to_string());
            }
            self.return_slot = Some("%retval".to_string());
        } else {
            self.return_slot = None;
        }
        let ret_label = self.new_label("ret");
        self.return_label = Some(ret_label.clone());

        for (name, ty) in &params {
            let llvm_ty = self.layout.llvm_type(ty);
            let align = align_for(&llvm_ty);
            let addr = self.new_slot(name);
            self.emit(format!("  {addr} = alloca {llvm_ty}, align {align}"));
            if let Some((_, fields)) = self.layout.struct_fields_for(ty) {
                let mut agg_val = "undef".to_string();
                for (i, (fname, fty)) in fields.iter().enumerate() {
                    let fllvm = self.layout.llvm_type(fty);
                    let t = self.new_temp();
                    self.emit(format!(
                        "  {t} = insertvalue {llvm_ty} {agg_val}, {fllvm} %param.{name}.{fname}, {i}"
                    ));
                    agg_val = t;
                }
                self.emit(format!("  store {llvm_ty} {agg_val}, {llvm_ty}* {addr}, align {align}"));
            } else {
                self.emit(format!("  store {llvm_ty} %arg.{name}, {llvm_ty}* {addr}, align {align}"));
            }
            self.declare_var(name, VarSlot { llvm_ty, addr, ty: ty.clone() });
        }

        let tail = self.gen_block(body)?;
        if !self.terminated {
            if let (Some(tail_val), true) = (tail, ret_llvm != "void") {
                let (_, operand) = self.load_value(&tail_val)?;
                let converted = self.convert(tail_val.llvm_ty(), &operand, &ret_llvm);
                self.emit(format!("  store {ret_llvm} {converted}, {ret_llvm}* %retval, align {}", align_for(&ret_llvm)));
            }
            self.emit_terminator(format!("  br label %{ret_label}"));
        }

        self.emit_label(&ret_label);
        if is_main {
            self.emit_terminator("  ret i32 0".to_string());
        } else if ret_llvm == "void" {
            self.emit_terminator("  ret void".to_string());
        } else {
            let loaded = self.new_temp();
            self.emit(format!("  {loaded} = load {ret_llvm}, {ret_llvm}* %retval, align {}", align_for(&ret_llvm)));
            self.emit_terminator(format!("  ret {ret_llvm} {loaded}"));
        }
        self.emit_raw("}\n\n");
        self.exit_scope();
        self.return_slot = None;
        self.return_label = None;
        Ok(())
    }

    // ---- low-level emission ----

    pub(crate) fn new_temp(&mut self) -> String {
        let n = self.temp;
        self.temp += 1;
        format!("%t{n}")
    }

    pub(crate) fn new_slot(&mut self, base: &str) -> String {
        let n = self.temp;
        self.temp += 1;
        format!("%{base}.{n}")
    }

    pub(crate) fn new_label(&mut self, prefix: &str) -> String {
        let n = self.label;
        self.label += 1;
        format!("L{prefix}{n}")
    }

    pub(crate) fn new_string_global(&mut self, bytes: &[u8]) -> (String, usize) {
        let idx = self.str_count;
        self.str_count += 1;
        let name = if idx == 0 {
            "@.ustr".to_string()
        } else {
            format!("@.ustr.{idx}")
        };
        let len = bytes.len() + 1;
        let escaped: String = bytes
            .iter()
            .map(|b| format!("\\{:02X}", b))
            .collect::<Vec<_>>()
            .join("");
        self.string_globals.push(format!(
            "{name} = private unnamed_addr constant [{len} x i8] c\"{escaped}\\00\", align 1"
        ));
        (name, len)
    }

    pub(crate) fn emit(&mut self, line: impl AsRef<str>) {
        if self.terminated {
            return;
        }
        self.out.push_str(line.as_ref());
        self.out.push('\n');
    }

    pub(crate) fn emit_terminator(&mut self, line: impl AsRef<str>) {
        if self.terminated {
            return;
        }
        self.out.push_str(line.as_ref());
        self.out.push('\n');
        self.terminated = true;
    }

    pub(crate) fn emit_label(&mut self, label: &str) {
        self.out.push_str(label);
        self.out.push_str(":\n");
        self.terminated = false;
    }

    fn emit_raw(&mut self, text: &str) {
        self.out.push_str(text);
    }

    pub(crate) fn error(&self, message: impl Into<String>, pos: Position) -> Diagnostic {
        Diagnostic::at(message, pos, &self.src)
    }

    // ---- scopes ----

    pub(crate) fn enter_scope(&mut self) {
        self.vars.push(HashMap::new());
    }

    pub(crate) fn exit_scope(&mut self) {
        self.vars.pop();
    }

    pub(crate) fn declare_var(&mut self, name: &str, slot: VarSlot) {
        self.vars.last_mut().unwrap().insert(name.to_string(), slot);
    }

    pub(crate) fn lookup_var(&self, name: &str) -> Option<&VarSlot> {
        self.vars.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Materializes any `Val` to a loaded (llvm_ty, operand) pair, issuing a `load` for an
    /// address-typed value (§4.3.6's "implicit load").
    pub(crate) fn load_value(&mut self, val: &Val) -> CgResult<(String, String)> {
        match val {
            Val::Imm { llvm_ty, text, .. } => Ok((llvm_ty.clone(), text.clone())),
            Val::Addr { llvm_ty, addr, .. } => {
                let t = self.new_temp();
                let align = align_for(llvm_ty);
                self.emit(format!("  {t} = load {llvm_ty}, {llvm_ty}* {addr}, align {align}"));
                Ok((llvm_ty.clone(), t))
            }
        }
    }

    /// Implicit widening/narrowing between scalar LLVM types (§4.3.6).
    pub(crate) fn convert(&mut self, from_ty: &str, operand: &str, to_ty: &str) -> String {
        if from_ty == to_ty {
            return operand.to_string();
        }
        let t = self.new_temp();
        match (from_ty, to_ty) {
            ("i32", "i64") => self.emit(format!("  {t} = sext i32 {operand} to i64")),
            ("i64", "i32") => self.emit(format!("  {t} = trunc i64 {operand} to i32")),
            ("i1", "i32") => self.emit(format!("  {t} = zext i1 {operand} to i32")),
            ("i1", "i64") => self.emit(format!("  {t} = zext i1 {operand} to i64")),
            ("i32", "i1") => self.emit(format!("  {t} = trunc i32 {operand} to i1")),
            ("float", "double") => self.emit(format!("  {t} = fpext float {operand} to double")),
            ("double", "float") => self.emit(format!("  {t} = fptrunc double {operand} to float")),
            _ => return operand.to_string(),
        }
        t
    }
}

/// Items declared inside a function body (nested fns, local structs) are emitted exactly
/// like top-level ones, since there is no real module system distinguishing their scope at
/// the LLVM-symbol level (no-goal: nested name resolution beyond flat flattening).
fn collect_nested_items(item: &Item, out: &mut Vec<Item>) {
    match item {
        Item::Function(f) => {
            if let Some(body) = &f.body {
                for stmt in &body.stmts {
                    if let Stmt::Item(inner) = stmt {
                        out.push(inner.clone());
                        collect_nested_items(inner, out);
                    }
                }
            }
        }
        Item::InherentImpl(im) => {
            for a in &im.items {
                if let AssocItem::Function(f) = a {
                    collect_nested_items(&Item::Function(f.clone()), out);
                }
            }
        }
        Item::TraitImpl(im) => {
            for a in &im.items {
                if let AssocItem::Function(f) = a {
                    collect_nested_items(&Item::Function(f.clone()), out);
                }
            }
        }
        Item::Module(m) => {
            for inner in &m.items {
                collect_nested_items(inner, out);
            }
        }
        Item::StructStruct(_)
        | Item::TupleStruct(_)
        | Item::UnitStruct { .. }
        | Item::Enumeration(_)
        | Item::Trait(_)
        | Item::Constant(_) => {}
    }
}

fn align_for(llvm_ty: &str) -> usize {
    match llvm_ty {
        "i1" | "i8" => 1,
        "i16" => 2,
        "i32" | "float" => 4,
        "i64" | "double" => 8,
        t if t.ends_with('*') => 8,
        _ => 8,
    }
}
