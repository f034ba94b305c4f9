//! # Semantic checker
//!
//! Two-phase walk over the AST (§4.2.2): forward declaration populates the scope stack's
//! symbol tables without looking at any body, then a second pass checks every body in
//! place. The checker's external contract is a single boolean; diagnostics are side effects
//! delivered through `log`, not part of the return value.

pub mod scope;
pub mod types;

use crate::ast::*;
use crate::diagnostics::Diagnostic;
use scope::{ConstEntry, FunctionEntry, ScopeStack, StructEntry, TraitEntry, VarEntry};

pub struct Checker<'a> {
    src: &'a str,
    scopes: ScopeStack,
    accepted: bool,
    /// The enclosing function's declared return type, or `None` when it names `Self`/`self`
    /// and the return-type check is disabled for the whole body (§4.2.6).
    current_return_ty: Option<Ty>,
}

impl<'a> Checker<'a> {
    pub fn new(src: &'a str) -> Self {
        Checker {
            src,
            scopes: ScopeStack::new(),
            accepted: true,
            current_return_ty: None,
        }
    }

    fn fail_at(&mut self, message: impl Into<String>, pos: Position) {
        self.accepted = false;
        log::error!("{}", Diagnostic::at(message, pos, self.src));
    }

    fn warn_at(&mut self, message: impl Into<String>, pos: Position) {
        log::warn!("{}", Diagnostic::at(message, pos, self.src));
    }

    pub fn check(&mut self, program: &[TopLevel]) -> bool {
        self.forward_declare_top(program);
        for node in program {
            match node {
                TopLevel::Item(item) => self.check_item(item),
                TopLevel::Statement(stmt) => self.check_stmt(stmt),
                TopLevel::Expr(expr) => {
                    self.check_expr(expr);
                }
            }
        }
        self.accepted
    }

    // ---- Phase 1: forward declaration (§4.2.2) ----

    fn forward_declare_top(&mut self, program: &[TopLevel]) {
        for node in program {
            if let TopLevel::Item(item) = node {
                self.forward_declare_item(item);
            }
        }
    }

    fn forward_declare_item(&mut self, item: &Item) {
        match item {
            Item::Function(f) => {
                self.scopes.current_mut().functions.insert(
                    f.name.clone(),
                    FunctionEntry {
                        params: f.params.iter().map(|p| p.ty.clone()).collect(),
                        ret: f.ret.clone(),
                        impl_type: None,
                        self_by_ref: None,
                        self_mutable: None,
                    },
                );
            }
            Item::StructStruct(st) => {
                self.scopes.current_mut().structs.insert(
                    st.name.clone(),
                    StructEntry {
                        name: st.name.clone(),
                        fields: st.fields.iter().map(|f| (f.name.clone(), f.ty.clone())).collect(),
                    },
                );
            }
            Item::TupleStruct(st) => {
                self.scopes.current_mut().structs.insert(
                    st.name.clone(),
                    StructEntry {
                        name: st.name.clone(),
                        fields: st
                            .fields
                            .iter()
                            .enumerate()
                            .map(|(i, ty)| (i.to_string(), ty.clone()))
                            .collect(),
                    },
                );
            }
            Item::UnitStruct { name, .. } => {
                self.scopes.current_mut().structs.insert(
                    name.clone(),
                    StructEntry {
                        name: name.clone(),
                        fields: vec![],
                    },
                );
            }
            Item::Enumeration(en) => {
                self.scopes
                    .current_mut()
                    .types
                    .insert(en.name.clone(), en.name.clone());
                for variant in &en.variants {
                    let qualified = format!("{}::{}", en.name, variant.name);
                    self.scopes.current_mut().variables.insert(
                        qualified,
                        VarEntry {
                            ty: Ty::path_named(en.name.clone()),
                            is_mutable: false,
                            is_ref: false,
                            is_initialized: true,
                        },
                    );
                }
            }
            Item::Trait(tr) => {
                let functions = tr
                    .items
                    .iter()
                    .filter_map(|a| match a {
                        AssocItem::Function(f) => Some(f.name.clone()),
                        _ => None,
                    })
                    .collect();
                self.scopes.current_mut().traits.insert(
                    tr.name.clone(),
                    TraitEntry {
                        name: tr.name.clone(),
                        is_unsafe: false,
                        functions,
                        super_traits: vec![],
                    },
                );
            }
            Item::InherentImpl(im) => self.forward_declare_impl_items(&im.self_ty, &im.items),
            Item::TraitImpl(im) => self.forward_declare_impl_items(&im.self_ty, &im.items),
            Item::Constant(c) => {
                self.scopes
                    .current_mut()
                    .constants
                    .insert(c.name.clone(), ConstEntry { ty: c.ty.clone() });
            }
            Item::Module(m) => {
                // No module system beyond flat item lists (non-goal): contents are
                // forward-declared straight into the enclosing scope.
                for inner in &m.items {
                    self.forward_declare_item(inner);
                }
            }
        }
    }

    fn forward_declare_impl_items(&mut self, self_ty: &Ty, items: &[AssocItem]) {
        let type_name = types::canonical(self_ty.strip_refs());
        for item in items {
            match item {
                AssocItem::Function(f) => {
                    let qualified = format!("{type_name}::{}", f.name);
                    self.scopes.current_mut().struct_functions.insert(
                        qualified,
                        FunctionEntry {
                            params: f.params.iter().map(|p| p.ty.clone()).collect(),
                            ret: f.ret.clone(),
                            impl_type: Some(type_name.clone()),
                            self_by_ref: f.self_param.as_ref().map(|sp| sp.by_ref),
                            self_mutable: f.self_param.as_ref().map(|sp| sp.mutable),
                        },
                    );
                }
                AssocItem::Constant(c) => {
                    let qualified = format!("{type_name}::{}", c.name);
                    self.scopes
                        .current_mut()
                        .constants
                        .insert(qualified, ConstEntry { ty: c.ty.clone() });
                }
                AssocItem::Type { .. } => {}
            }
        }
    }

    // ---- Phase 2: check ----

    fn check_item(&mut self, item: &Item) {
        match item {
            Item::Function(f) => self.check_function(f, None),
            Item::InherentImpl(im) => {
                self.scopes.enter();
                self.scopes.current_mut().possible_self = Some(types::canonical(im.self_ty.strip_refs()));
                for assoc in &im.items {
                    if let AssocItem::Function(f) = assoc {
                        self.check_function(f, Some(&im.self_ty));
                    }
                }
                self.scopes.exit();
            }
            Item::TraitImpl(im) => {
                self.check_trait_impl_completeness(im);
                self.scopes.enter();
                self.scopes.current_mut().possible_self = Some(types::canonical(im.self_ty.strip_refs()));
                for assoc in &im.items {
                    if let AssocItem::Function(f) = assoc {
                        self.check_function(f, Some(&im.self_ty));
                    }
                }
                self.scopes.exit();
            }
            Item::Module(m) => {
                for inner in &m.items {
                    self.check_item(inner);
                }
            }
            Item::Constant(c) => {
                self.check_expr(&c.value);
            }
            Item::StructStruct(_) | Item::TupleStruct(_) | Item::UnitStruct { .. } | Item::Enumeration(_) | Item::Trait(_) => {}
        }
    }

    fn check_trait_impl_completeness(&mut self, im: &TraitImpl) {
        let trait_name = im.trait_path.last();
        let Some(trait_entry) = self.scopes.find_trait(trait_name).cloned() else {
            self.fail_at(format!("unknown trait `{trait_name}`"), im.pos);
            return;
        };
        let impl_fns: Vec<&str> = im
            .items
            .iter()
            .filter_map(|a| match a {
                AssocItem::Function(f) => Some(f.name.as_str()),
                _ => None,
            })
            .collect();
        for required in &trait_entry.functions {
            if !impl_fns.contains(&required.as_str()) {
                self.fail_at(
                    format!("missing implementation of `{required}` required by trait `{trait_name}`"),
                    im.pos,
                );
            }
        }
        for present in &impl_fns {
            if !trait_entry.functions.iter().any(|f| f == present) {
                self.warn_at(
                    format!("`{present}` is not declared by trait `{trait_name}`"),
                    im.pos,
                );
            }
        }
    }

    fn check_function(&mut self, f: &Function, impl_ty: Option<&Ty>) {
        let Some(body) = &f.body else { return };
        self.scopes.enter();
        if let Some(sp) = &f.self_param {
            let self_ty = impl_ty.cloned().unwrap_or(Ty::path_named("Self"));
            let ty = if sp.by_ref {
                Ty::Reference {
                    mutable: sp.mutable,
                    inner: Box::new(self_ty),
                }
            } else {
                self_ty
            };
            self.scopes.declare_variable(
                "self",
                VarEntry {
                    ty,
                    is_mutable: sp.mutable,
                    is_ref: sp.by_ref,
                    is_initialized: true,
                },
            );
        }
        for param in &f.params {
            if let Some(name) = param.pattern.simple_name() {
                self.scopes.declare_variable(
                    name,
                    VarEntry {
                        ty: param.ty.clone(),
                        is_mutable: param.pattern.declares_mutable(),
                        is_ref: matches!(param.ty, Ty::Reference { .. }),
                        is_initialized: true,
                    },
                );
            }
        }

        let prev_return_ty = self.current_return_ty.take();
        self.current_return_ty = if f.ret.is_self() { None } else { Some(f.ret.clone()) };

        let block_ty = self.check_block(body);
        if has_trailing_expr(body) {
            self.check_return_compatible(&block_ty, f.pos);
        }

        self.current_return_ty = prev_return_ty;
        self.scopes.exit();
    }

    /// §4.2.6: every `return e` plus the trailing expression, canonicalized, must collapse
    /// to the single declared return type (`Self`/`self` disables the check). `!` (from a
    /// diverging `return`/`break`/`continue` used as the trailing expression) is always
    /// compatible, since control never actually falls through it.
    fn check_return_compatible(&mut self, actual: &Ty, pos: Position) {
        let Some(expected) = self.current_return_ty.clone() else {
            return;
        };
        if matches!(actual, Ty::Never) {
            return;
        }
        if !types::compatible(actual, &expected) {
            self.fail_at(
                format!(
                    "expected return type `{}`, found `{}`",
                    types::canonical(&expected),
                    types::canonical(actual)
                ),
                pos,
            );
        }
    }

    // ---- Statements (§4.2.3) ----

    fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Empty(_) => {}
            Stmt::Item(item) => {
                self.forward_declare_item(item);
                self.check_item(item);
            }
            Stmt::Let {
                pattern,
                ty,
                init,
                else_block,
                pos,
            } => self.check_let(pattern, ty.as_ref(), init.as_ref(), else_block.as_ref(), *pos),
            Stmt::Expr { expr, .. } => {
                self.check_expr(expr);
            }
        }
    }

    fn check_let(
        &mut self,
        pattern: &Pattern,
        declared_ty: Option<&Ty>,
        init: Option<&Expr>,
        else_block: Option<&Block>,
        pos: Position,
    ) {
        let init_ty = init.map(|e| self.check_expr(e));

        if let (Some(declared), Some(init_expr)) = (declared_ty, init) {
            if matches!(declared, Ty::Array { .. }) {
                self.check_array_length_compat(declared, init_expr, pos);
            } else if let Some(inferred) = &init_ty {
                let literal_widens = is_unsuffixed_int_literal(init_expr)
                    && WIDENABLE_INT_TYPES.contains(&types::canonical(declared).as_str());
                if !types::compatible(declared, inferred)
                    && !matches!(init_expr, Expr::Call { .. })
                    && !literal_widens
                {
                    self.fail_at(
                        format!(
                            "expected `{}`, found `{}`",
                            types::canonical(declared),
                            types::canonical(inferred)
                        ),
                        pos,
                    );
                }
            }
        }

        if else_block.is_some() && init.is_none() {
            self.fail_at("a `let else` requires an initializer", pos);
        }
        if let Some(block) = else_block {
            self.check_block(block);
        }

        let bound_ty = declared_ty.cloned().or(init_ty).unwrap_or(Ty::Inferred);
        self.declare_pattern(pattern, bound_ty, init.is_some());
    }

    fn declare_pattern(&mut self, pattern: &Pattern, ty: Ty, initialized: bool) {
        match pattern {
            Pattern::Ident { name, mutable, by_ref, .. } => {
                let mutable = *mutable || matches!(&ty, Ty::Reference { mutable: true, .. });
                self.scopes.declare_variable(
                    name,
                    VarEntry {
                        ty,
                        is_mutable: mutable,
                        is_ref: *by_ref,
                        is_initialized: initialized,
                    },
                );
            }
            Pattern::Tuple { elems, .. } => {
                for elem in elems {
                    self.declare_pattern(elem, Ty::Inferred, initialized);
                }
            }
            Pattern::Reference { inner, .. } | Pattern::Paren(inner, _) => {
                self.declare_pattern(inner, ty, initialized);
            }
            _ => {}
        }
    }

    fn check_array_length_compat(&mut self, declared: &Ty, init: &Expr, pos: Position) {
        let Ty::Array { elem, len } = declared else { return };
        let expected_len = types::array_len_literal(len);
        match init {
            Expr::Array(ArrayExpr::Literal(elems), _) => {
                if expected_len >= 0 && elems.len() as i64 != expected_len {
                    self.fail_at(
                        format!(
                            "expected an array of length {expected_len}, found one of length {}",
                            elems.len()
                        ),
                        pos,
                    );
                }
                for e in elems {
                    let ty = self.check_expr(e);
                    if !types::compatible(&ty, elem) {
                        self.fail_at(
                            format!(
                                "array element has type `{}`, expected `{}`",
                                types::canonical(&ty),
                                types::canonical(elem)
                            ),
                            pos,
                        );
                    }
                }
            }
            Expr::Array(ArrayExpr::Repeat(value, count), _) => {
                let count_len = self.resolve_const_usize(count);
                if let (Some(c), true) = (count_len, expected_len >= 0) {
                    if c != expected_len {
                        self.fail_at(
                            format!("expected a repeat count of {expected_len}, found {c}"),
                            pos,
                        );
                    }
                }
                let ty = self.check_expr(value);
                if !types::compatible(&ty, elem) {
                    self.fail_at("array repeat value type mismatch", pos);
                }
            }
            Expr::Call { .. } => {}
            other => {
                self.check_expr(other);
            }
        }
    }

    /// A literal repeat count, or `None` if it's a named constant (no constant folding
    /// happens in the checker; the array-length check is skipped rather than guessed).
    fn resolve_const_usize(&self, expr: &Expr) -> Option<i64> {
        match expr {
            Expr::Literal(Literal::Int(v, _), _) => Some(*v as i64),
            _ => None,
        }
    }

    // ---- Expressions ----

    fn check_block(&mut self, block: &Block) -> Ty {
        self.scopes.enter();
        // Items nested in a block are visible to every statement in it, not just the ones
        // after their textual position (matches top-level forward declaration).
        for stmt in &block.stmts {
            if let Stmt::Item(item) = stmt {
                self.forward_declare_item(item);
            }
        }
        let mut tail_ty = Ty::unit();
        for (i, stmt) in block.stmts.iter().enumerate() {
            let is_last = i + 1 == block.stmts.len();
            match stmt {
                Stmt::Expr { expr, semi } if is_last && !semi => {
                    tail_ty = self.check_expr(expr);
                }
                _ => self.check_stmt(stmt),
            }
        }
        self.scopes.exit();
        tail_ty
    }

    fn check_expr(&mut self, expr: &Expr) -> Ty {
        match expr {
            Expr::Literal(lit, _) => literal_type(lit),
            Expr::Path(path, pos) => self.check_path(path, *pos),
            Expr::Block(b, _) => self.check_block(b),
            Expr::If(if_expr) => self.check_if(if_expr),
            Expr::While { cond, body, .. } => {
                self.check_cond(cond);
                self.check_block(body);
                Ty::unit()
            }
            Expr::Loop { body, .. } => {
                self.check_block(body);
                Ty::unit()
            }
            Expr::Match { scrutinee, arms, .. } => self.check_match(scrutinee, arms),
            Expr::Return(value, pos) => {
                let actual = match value {
                    Some(v) => self.check_expr(v),
                    None => Ty::unit(),
                };
                self.check_return_compatible(&actual, *pos);
                Ty::Never
            }
            Expr::Break(value, _) => {
                if let Some(v) = value {
                    self.check_expr(v);
                }
                Ty::Never
            }
            Expr::Continue(_) => Ty::Never,
            Expr::Call { callee, args, pos } => self.check_call(callee, args, *pos),
            Expr::MethodCall { receiver, method, args, pos } => {
                self.check_method_call(receiver, method, args, *pos)
            }
            Expr::Field { base, name, pos } => self.check_field(base, name, *pos),
            Expr::Index { base, index, .. } => {
                self.check_expr(index);
                match self.check_expr(base) {
                    Ty::Array { elem, .. } | Ty::Slice(elem) => *elem,
                    Ty::Reference { inner, .. } => match *inner {
                        Ty::Array { elem, .. } | Ty::Slice(elem) => *elem,
                        other => other,
                    },
                    other => other,
                }
            }
            Expr::Tuple(elems, _) => Ty::Tuple(elems.iter().map(|e| self.check_expr(e)).collect()),
            Expr::TupleIndex { base, index, pos } => self.check_tuple_index(base, *index, *pos),
            Expr::StructLiteral { path, fields, base, pos } => {
                self.check_struct_literal(path, fields, base.as_deref(), *pos)
            }
            Expr::Array(arr, _) => self.check_array_expr(arr),
            Expr::Range { start, end, .. } => {
                if let Some(s) = start {
                    self.check_expr(s);
                }
                if let Some(e) = end {
                    self.check_expr(e);
                }
                Ty::path_named("Range")
            }
            Expr::Arith { lhs, rhs, pos, .. } => self.check_arith(lhs, rhs, *pos),
            Expr::Cmp { lhs, rhs, .. } => {
                self.check_expr(lhs);
                self.check_expr(rhs);
                Ty::path_named("bool")
            }
            Expr::Lazy { lhs, rhs, pos, .. } => {
                let lt = self.check_expr(lhs);
                let rt = self.check_expr(rhs);
                if !types::is_bool(&lt) || !types::is_bool(&rt) {
                    self.fail_at("lazy-boolean operands must be `bool`", *pos);
                }
                Ty::path_named("bool")
            }
            Expr::Assign { target, value, pos } => {
                self.check_assign_target(target, *pos);
                self.check_expr(value);
                Ty::unit()
            }
            Expr::CompoundAssign { target, value, pos, .. } => {
                self.check_assign_target(target, *pos);
                self.check_expr(value);
                Ty::unit()
            }
            Expr::Borrow { mutable, inner, pos, .. } => {
                let inner_ty = self.check_expr(inner);
                if *mutable {
                    if let Some(root) = inner.lvalue_root() {
                        if !self.is_mutable_binding(root) {
                            self.fail_at(
                                format!("cannot borrow `{root}` as mutable, as it is not declared `mut`"),
                                *pos,
                            );
                        }
                    }
                }
                Ty::Reference {
                    mutable: *mutable,
                    inner: Box::new(inner_ty),
                }
            }
            Expr::Deref { inner, .. } => match self.check_expr(inner) {
                Ty::Reference { inner, .. } => *inner,
                other => other,
            },
            Expr::Neg { inner, .. } => self.check_expr(inner),
            Expr::Cast { inner, ty, .. } => {
                self.check_expr(inner);
                ty.clone()
            }
            Expr::Grouped(inner, _) => self.check_expr(inner),
            Expr::Underscore(_) => Ty::Inferred,
        }
    }

    fn check_path(&mut self, path: &Path, pos: Position) -> Ty {
        if path.segments.len() == 1 {
            let name = path.last();
            if let Some(var) = self.scopes.find_variable(name) {
                return var.ty.clone();
            }
            if let Some(f) = self.scopes.find_function(name) {
                return Ty::Fn {
                    params: f.params.clone(),
                    ret: Box::new(f.ret.clone()),
                };
            }
            if let Some(c) = self.scopes.find_constant(name) {
                return c.ty.clone();
            }
            self.fail_at(format!("cannot find `{name}` in this scope"), pos);
            return Ty::Inferred;
        }
        let qualified = path.join();
        if let Some(var) = self.scopes.find_variable(&qualified) {
            return var.ty.clone();
        }
        if let Some(c) = self.scopes.find_constant(&qualified) {
            return c.ty.clone();
        }
        if let Some(f) = self.scopes.find_struct_function(&qualified) {
            return Ty::Fn {
                params: f.params.clone(),
                ret: Box::new(f.ret.clone()),
            };
        }
        self.fail_at(format!("cannot find `{qualified}` in this scope"), pos);
        Ty::Inferred
    }

    fn check_if(&mut self, if_expr: &IfExpr) -> Ty {
        self.check_cond(&if_expr.cond);
        let then_ty = self.check_block(&if_expr.then_branch);
        match &if_expr.else_branch {
            Some(branch) => match branch.as_ref() {
                ElseBranch::If(nested) => self.check_if(nested),
                ElseBranch::Block(block) => self.check_block(block),
            },
            None => Ty::unit(),
        };
        then_ty
    }

    fn check_cond(&mut self, cond: &Cond) {
        match cond {
            Cond::Expr(e) => {
                self.check_expr(e);
            }
            Cond::LetChain(arms) => {
                for arm in arms {
                    let ty = self.check_expr(&arm.scrutinee);
                    self.declare_pattern(&arm.pattern, ty, true);
                }
            }
        }
    }

    fn check_match(&mut self, scrutinee: &Expr, arms: &[MatchArm]) -> Ty {
        self.check_expr(scrutinee);
        let mut result = Ty::unit();
        for (i, arm) in arms.iter().enumerate() {
            self.scopes.enter();
            self.declare_pattern(&arm.pattern, Ty::Inferred, true);
            if let Some(guard) = &arm.guard {
                self.check_expr(guard);
            }
            let ty = self.check_expr(&arm.body);
            if i == 0 {
                result = ty;
            }
            self.scopes.exit();
        }
        result
    }

    fn check_call(&mut self, callee: &Expr, args: &[Expr], pos: Position) -> Ty {
        let callee_ty = self.check_expr(callee);
        for arg in args {
            self.check_expr(arg);
        }
        match callee_ty {
            Ty::Fn { ret, .. } => *ret,
            _ => {
                if !matches!(callee, Expr::Path(..)) {
                    self.fail_at("expression is not callable", pos);
                }
                Ty::Inferred
            }
        }
    }

    fn check_method_call(&mut self, receiver: &Expr, method: &str, args: &[Expr], pos: Position) -> Ty {
        let recv_ty = self.check_expr(receiver);
        for arg in args {
            self.check_expr(arg);
        }
        let type_name = types::canonical(recv_ty.strip_refs());
        let qualified = format!("{type_name}::{method}");
        let Some(entry) = self.scopes.find_struct_function(&qualified).cloned() else {
            self.fail_at(format!("no method named `{method}` found for type `{type_name}`"), pos);
            return Ty::Inferred;
        };
        if entry.self_by_ref == Some(true) && entry.self_mutable == Some(true) {
            if let Some(root) = receiver.lvalue_root() {
                if !self.is_mutable_binding(root) {
                    self.fail_at(
                        format!("cannot borrow `{root}` as mutable, as it is not declared `mut`"),
                        pos,
                    );
                }
            }
        }
        entry.ret
    }

    fn check_field(&mut self, base: &Expr, name: &str, pos: Position) -> Ty {
        let base_ty = self.check_expr(base);
        let type_name = types::canonical(base_ty.strip_refs());
        let Some(st) = self.scopes.find_struct(&type_name).cloned() else {
            self.fail_at(format!("no field named `{name}` on type `{type_name}`"), pos);
            return Ty::Inferred;
        };
        match st.fields.iter().find(|(n, _)| n == name) {
            Some((_, ty)) => ty.clone(),
            None => {
                self.fail_at(format!("no field `{name}` on struct `{type_name}`"), pos);
                Ty::Inferred
            }
        }
    }

    fn check_tuple_index(&mut self, base: &Expr, index: u32, pos: Position) -> Ty {
        match self.check_expr(base) {
            Ty::Tuple(elems) => elems.into_iter().nth(index as usize).unwrap_or(Ty::Inferred),
            other => {
                let type_name = types::canonical(other.strip_refs());
                match self.scopes.find_struct(&type_name) {
                    Some(st) => st
                        .fields
                        .get(index as usize)
                        .map(|(_, ty)| ty.clone())
                        .unwrap_or(Ty::Inferred),
                    None => {
                        self.fail_at("tuple index on a non-tuple value", pos);
                        Ty::Inferred
                    }
                }
            }
        }
    }

    fn check_struct_literal(
        &mut self,
        path: &Path,
        fields: &[StructLitField],
        base: Option<&Expr>,
        pos: Position,
    ) -> Ty {
        let name = path.last().to_string();
        if let Some(b) = base {
            self.check_expr(b);
        }
        let Some(st) = self.scopes.find_struct(&name).cloned() else {
            self.fail_at(format!("cannot find struct `{name}` in this scope"), pos);
            return Ty::path_named(name);
        };
        for field in fields {
            let field_name = match &field.name {
                FieldName::Named(n) => n.clone(),
                FieldName::Index(i) => i.to_string(),
            };
            let expected = st.fields.iter().find(|(n, _)| *n == field_name).map(|(_, t)| t.clone());
            let actual = match &field.value {
                Some(v) => Some(self.check_expr(v)),
                None => self.scopes.find_variable(&field_name).map(|v| v.ty.clone()),
            };
            if let (Some(exp), Some(act)) = (expected, actual) {
                if !types::compatible(&exp, &act) {
                    self.fail_at(
                        format!("field `{field_name}` has type `{}`, expected `{}`", types::canonical(&act), types::canonical(&exp)),
                        pos,
                    );
                }
            }
        }
        Ty::path_named(name)
    }

    fn check_array_expr(&mut self, arr: &ArrayExpr) -> Ty {
        match arr {
            ArrayExpr::Literal(elems) => {
                let elem_ty = elems.first().map(|e| self.check_expr(e)).unwrap_or(Ty::Inferred);
                for e in elems.iter().skip(1) {
                    self.check_expr(e);
                }
                Ty::Array {
                    elem: Box::new(elem_ty),
                    len: Box::new(Expr::Literal(Literal::Int(elems.len() as i128, None), Position::default())),
                }
            }
            ArrayExpr::Repeat(value, count) => {
                let elem_ty = self.check_expr(value);
                let count = (**count).clone();
                self.check_expr(&count);
                Ty::Array {
                    elem: Box::new(elem_ty),
                    len: Box::new(count),
                }
            }
        }
    }

    fn check_arith(&mut self, lhs: &Expr, rhs: &Expr, pos: Position) -> Ty {
        let lhs_ty = self.check_expr(lhs);
        let rhs_ty = self.check_expr(rhs);
        if !types::compatible(&lhs_ty, &rhs_ty)
            && !is_widenable_pair(&lhs_ty, &rhs_ty)
        {
            self.fail_at(
                format!(
                    "cannot apply arithmetic between `{}` and `{}`",
                    types::canonical(&lhs_ty),
                    types::canonical(&rhs_ty)
                ),
                pos,
            );
        }
        lhs_ty
    }

    fn check_assign_target(&mut self, target: &Expr, pos: Position) {
        self.check_expr(target);
        if let Some(root) = target.lvalue_root() {
            if !self.is_mutable_binding(root) {
                self.fail_at(format!("cannot assign to `{root}`, as it is not declared `mut`"), pos);
            }
        }
    }

    fn is_mutable_binding(&self, name: &str) -> bool {
        self.scopes.find_variable(name).map(|v| v.is_mutable).unwrap_or(true)
    }
}

fn is_widenable_pair(a: &Ty, b: &Ty) -> bool {
    let widenable = ["i32", "i64", "u32"];
    let ca = types::canonical(a);
    let cb = types::canonical(b);
    widenable.contains(&ca.as_str()) && widenable.contains(&cb.as_str())
}

/// Integer types an unsuffixed literal (itself inferred as `i32`, `literal_type`) may settle
/// into at a `let` site, mirroring `is_widenable_pair`'s relaxation for arithmetic.
const WIDENABLE_INT_TYPES: [&str; 4] = ["i32", "i64", "u32", "usize"];

fn is_unsuffixed_int_literal(expr: &Expr) -> bool {
    match expr {
        Expr::Literal(Literal::Int(_, None), _) => true,
        Expr::Grouped(inner, _) => is_unsuffixed_int_literal(inner),
        _ => false,
    }
}

fn literal_type(lit: &Literal) -> Ty {
    match lit {
        Literal::Int(_, Some(suffix)) => Ty::path_named(suffix.clone()),
        Literal::Int(_, None) => Ty::path_named("i32"),
        Literal::Float(_, Some(suffix)) => Ty::path_named(suffix.clone()),
        Literal::Float(_, None) => Ty::path_named("f64"),
        Literal::Bool(_) => Ty::path_named("bool"),
        Literal::Char(_) => Ty::path_named("char"),
        Literal::Str(_) | Literal::RawStr(_) => Ty::Reference {
            mutable: false,
            inner: Box::new(Ty::path_named("str")),
        },
        Literal::Byte(_) => Ty::path_named("u8"),
        Literal::ByteStr(_) | Literal::RawByteStr(_) => Ty::Reference {
            mutable: false,
            inner: Box::new(Ty::Slice(Box::new(Ty::path_named("u8")))),
        },
        Literal::CStr(_) | Literal::RawCStr(_) => Ty::Reference {
            mutable: false,
            inner: Box::new(Ty::path_named("CStr")),
        },
    }
}

/// Whether a block ends in a semicolon-less expression statement, i.e. actually produces a
/// trailing value rather than falling off the end as `()` (§4.2.6).
fn has_trailing_expr(block: &Block) -> bool {
    matches!(block.stmts.last(), Some(Stmt::Expr { semi: false, .. }))
}
