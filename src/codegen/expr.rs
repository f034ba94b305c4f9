//! Expression lowering (§4.3.1, §4.3.6, §4.3.7, §4.3.8).
//!
//! Every lowering produces a [`Val`]: either a materialized r-value or the address of a
//! stack slot still awaiting a load. Types travel alongside the generated code rather than
//! being looked up from a separate table, since nothing upstream of codegen retains them
//! once the checker has accepted the tree.

use crate::ast::*;
use crate::checker::types::canonical;

use super::{builtins, mangle, CgResult, Val};

impl super::Codegen {
    pub(crate) fn gen_expr(&mut self, expr: &Expr) -> CgResult<Val> {
        match expr {
            Expr::Literal(lit, pos) => self.gen_literal(lit, *pos),
            Expr::Path(path, pos) => self.gen_path(path, *pos),
            Expr::Block(block, _) => {
                let tail = self.gen_block(block)?;
                Ok(tail.unwrap_or_else(unit_val))
            }
            Expr::If(if_expr) => self.gen_if(if_expr),
            Expr::While { cond, body, pos } => self.gen_while(cond, body, *pos),
            Expr::Loop { body, pos } => self.gen_loop(body, *pos),
            Expr::Match { .. } => Err(self.error(
                "match expressions are not supported by the IR generator",
                expr.pos(),
            )),
            Expr::Return(value, pos) => self.gen_return(value.as_deref(), *pos),
            Expr::Break(value, pos) => self.gen_break(value.as_deref(), *pos),
            Expr::Continue(pos) => self.gen_continue(*pos),
            Expr::Call { callee, args, pos } => self.gen_call(callee, args, *pos),
            Expr::MethodCall { receiver, method, args, pos } => {
                self.gen_method_call(receiver, method, args, *pos)
            }
            Expr::Field { base, name, pos } => self.gen_field(base, name, *pos),
            Expr::Index { base, index, pos } => self.gen_index(base, index, *pos),
            Expr::Tuple(elems, pos) => self.gen_tuple(elems, *pos),
            Expr::TupleIndex { base, index, pos } => self.gen_tuple_index(base, *index, *pos),
            Expr::StructLiteral { path, fields, base, pos } => {
                self.gen_struct_literal(path, fields, base.as_deref(), *pos)
            }
            Expr::Array(arr, pos) => self.gen_array(arr, *pos),
            Expr::Range { .. } => {
                Err(self.error("range expressions are not supported by the IR generator", expr.pos()))
            }
            Expr::Arith { op, lhs, rhs, pos } => self.gen_arith(*op, lhs, rhs, *pos),
            Expr::Cmp { op, lhs, rhs, pos } => self.gen_cmp(*op, lhs, rhs, *pos),
            Expr::Lazy { op, lhs, rhs, pos } => self.gen_lazy(*op, lhs, rhs, *pos),
            Expr::Assign { target, value, pos } => self.gen_assign(target, value, *pos),
            Expr::CompoundAssign { op, target, value, pos } => {
                self.gen_compound_assign(*op, target, value, *pos)
            }
            Expr::Borrow { inner, .. } => self.gen_borrow(inner),
            Expr::Deref { inner, pos } => self.gen_deref(inner, *pos),
            Expr::Neg { logical, inner, pos } => self.gen_neg(*logical, inner, *pos),
            Expr::Cast { inner, ty, pos } => self.gen_cast(inner, ty, *pos),
            Expr::Grouped(inner, _) => self.gen_expr(inner),
            Expr::Underscore(pos) => Err(self.error("`_` has no value", *pos)),
        }
    }

    fn gen_literal(&mut self, lit: &Literal, _pos: Position) -> CgResult<Val> {
        let val = match lit {
            Literal::Int(v, suffix) => {
                let (llvm_ty, ty) = int_literal_ty(suffix.as_deref());
                Val::Imm { llvm_ty, text: v.to_string(), ty }
            }
            Literal::Float(v, suffix) => {
                let llvm_ty = match suffix.as_deref() {
                    Some("f32") => "float",
                    _ => "double",
                };
                let ty = Ty::path_named(if llvm_ty == "float" { "f32" } else { "f64" });
                Val::Imm { llvm_ty: llvm_ty.to_string(), text: format!("{:?}", v), ty }
            }
            Literal::Bool(b) => Val::Imm {
                llvm_ty: "i1".to_string(),
                text: if *b { "1".to_string() } else { "0".to_string() },
                ty: Ty::path_named("bool"),
            },
            Literal::Char(c) => Val::Imm {
                llvm_ty: "i32".to_string(),
                text: (*c as u32).to_string(),
                ty: Ty::path_named("char"),
            },
            Literal::Byte(b) => Val::Imm {
                llvm_ty: "i8".to_string(),
                text: b.to_string(),
                ty: Ty::path_named("u8"),
            },
            Literal::Str(s) | Literal::RawStr(s) | Literal::CStr(s) | Literal::RawCStr(s) => {
                self.gen_str_literal(s.as_bytes())
            }
            Literal::ByteStr(bytes) | Literal::RawByteStr(bytes) => self.gen_str_literal(bytes),
        };
        Ok(val)
    }

    fn gen_str_literal(&mut self, bytes: &[u8]) -> Val {
        let (name, len) = self.new_string_global(bytes);
        let text = format!(
            "getelementptr inbounds ([{len} x i8], [{len} x i8]* {name}, i64 0, i64 0)"
        );
        Val::Imm { llvm_ty: "i8*".to_string(), text, ty: Ty::path_named("str") }
    }

    fn gen_path(&mut self, path: &Path, pos: Position) -> CgResult<Val> {
        if path.segments.len() == 1 {
            let name = path.last();
            if let Some(slot) = self.lookup_var(name) {
                return Ok(Val::Addr {
                    llvm_ty: slot.llvm_ty.clone(),
                    addr: slot.addr.clone(),
                    ty: slot.ty.clone(),
                });
            }
            if let Some(val) = self.layout.constant_value(name) {
                return Ok(val);
            }
            return Err(self.error(format!("unresolved name `{name}`"), pos));
        }
        let qualified = path.segments.join("::");
        if let Some(val) = self.layout.constant_value(&qualified) {
            return Ok(val);
        }
        if let Some(ord) = self.layout.enum_variants.get(&qualified) {
            return Ok(Val::Imm {
                llvm_ty: "i64".to_string(),
                text: ord.to_string(),
                ty: Ty::path_named(path.segments[0].clone()),
            });
        }
        Err(self.error(format!("unresolved path `{qualified}`"), pos))
    }

    fn gen_call(&mut self, callee: &Expr, args: &[Expr], pos: Position) -> CgResult<Val> {
        let Expr::Path(path, _) = callee else {
            return Err(self.error("only direct function calls are supported", pos));
        };
        if path.segments.len() == 1 {
            let name = path.last();
            if let Some((param_tys, ret_ty)) = builtins::signature(name) {
                return self.emit_call(&mangle::function(name), args, &param_tys, ret_ty, pos);
            }
            if let Some(sig) = self.layout.functions.get(name).cloned() {
                let ret = self.layout.llvm_type(&sig.ret);
                return self.emit_call_with_tys(
                    &mangle::function(name),
                    args,
                    &sig.params,
                    ret,
                    sig.ret,
                    pos,
                );
            }
            return Err(self.error(format!("unresolved function `{name}`"), pos));
        }
        let qualified = path.segments.join("::");
        if let Some(sig) = self.layout.methods.get(&qualified).cloned() {
            let type_name = path.segments[0].clone();
            let fn_name = path.last().to_string();
            let ret = self.layout.llvm_type(&sig.ret);
            return self.emit_call_with_tys(
                &mangle::method(&type_name, &fn_name),
                args,
                &sig.params,
                ret,
                sig.ret,
                pos,
            );
        }
        Err(self.error(format!("unresolved path `{qualified}`"), pos))
    }

    fn emit_call(
        &mut self,
        symbol: &str,
        args: &[Expr],
        param_tys: &[&'static str],
        ret_ty: &'static str,
        pos: Position,
    ) -> CgResult<Val> {
        let param_tys: Vec<String> = param_tys.iter().map(|s| s.to_string()).collect();
        let ty = llvm_scalar_to_ty(ret_ty);
        self.emit_call_typed(symbol, args, &param_tys, ret_ty.to_string(), ty, pos)
    }

    fn emit_call_typed(
        &mut self,
        symbol: &str,
        args: &[Expr],
        param_tys: &[String],
        ret_llvm: String,
        ret_ty: Ty,
        pos: Position,
    ) -> CgResult<Val> {
        if args.len() != param_tys.len() {
            return Err(self.error("argument count mismatch", pos));
        }
        let mut operands = Vec::new();
        for (arg, want) in args.iter().zip(param_tys.iter()) {
            let val = self.gen_expr(arg)?;
            let (from_ty, op) = self.load_value(&val)?;
            let converted = self.convert(&from_ty, &op, want);
            operands.push(format!("{want} {converted}"));
        }
        let joined = operands.join(", ");
        if ret_llvm == "void" {
            self.emit(format!("  call void {symbol}({joined})"));
            Ok(unit_val())
        } else {
            let t = self.new_temp();
            self.emit(format!("  {t} = call {ret_llvm} {symbol}({joined})"));
            Ok(Val::Imm { llvm_ty: ret_llvm, text: t, ty: ret_ty })
        }
    }

    /// Like [`Codegen::emit_call_typed`], but keeps the real parameter `Ty`s instead of
    /// pre-stringified LLVM types, so a by-value struct parameter can be recognized and
    /// flattened into scalar field arguments (§4.3.1) before the call is emitted. Used for
    /// every free-function and method call with a real, non-builtin signature.
    fn emit_call_with_tys(
        &mut self,
        symbol: &str,
        args: &[Expr],
        param_tys: &[Ty],
        ret_llvm: String,
        ret_ty: Ty,
        pos: Position,
    ) -> CgResult<Val> {
        if args.len() != param_tys.len() {
            return Err(self.error("argument count mismatch", pos));
        }
        let mut operands = Vec::new();
        for (arg, want) in args.iter().zip(param_tys.iter()) {
            operands.extend(self.call_operand(arg, want)?);
        }
        let joined = operands.join(", ");
        if ret_llvm == "void" {
            self.emit(format!("  call void {symbol}({joined})"));
            Ok(unit_val())
        } else {
            let t = self.new_temp();
            self.emit(format!("  {t} = call {ret_llvm} {symbol}({joined})"));
            Ok(Val::Imm { llvm_ty: ret_llvm, text: t, ty: ret_ty })
        }
    }

    /// Lowers one call argument against its declared parameter type, producing one `"ty val"`
    /// operand fragment for a scalar parameter or one fragment per field (in declaration
    /// order) for a by-value struct parameter (§4.3.1's flatten convention).
    fn call_operand(&mut self, arg: &Expr, want: &Ty) -> CgResult<Vec<String>> {
        if let Some((struct_name, fields)) = self.layout.struct_fields_for(want) {
            let val = self.gen_expr(arg)?;
            let flattened = self.flatten_val(&val, &struct_name, &fields)?;
            Ok(flattened.into_iter().map(|(ty, op)| format!("{ty} {op}")).collect())
        } else {
            let want_llvm = self.layout.llvm_type(want);
            let val = self.gen_expr(arg)?;
            let (from_ty, op) = self.load_value(&val)?;
            let converted = self.convert(&from_ty, &op, &want_llvm);
            Ok(vec![format!("{want_llvm} {converted}")])
        }
    }

    /// Breaks a struct value down into its fields, one `getelementptr`+`load` per field in
    /// declaration order, mirroring `extractvalue` (§4.3.1/§4.3.7's flatten convention).
    fn flatten_val(
        &mut self,
        val: &Val,
        struct_name: &str,
        fields: &[(String, Ty)],
    ) -> CgResult<Vec<(String, String)>> {
        let addr = self.addr_of(val)?;
        let mut out = Vec::new();
        for (i, (_, fty)) in fields.iter().enumerate() {
            let fllvm = self.layout.llvm_type(fty);
            let gep = self.new_temp();
            self.emit(format!(
                "  {gep} = getelementptr inbounds %{struct_name}, %{struct_name}* {addr}, i32 0, i32 {i}"
            ));
            let loaded = self.new_temp();
            self.emit(format!("  {loaded} = load {fllvm}, {fllvm}* {gep}"));
            out.push((fllvm, loaded));
        }
        Ok(out)
    }

    fn gen_method_call(
        &mut self,
        receiver: &Expr,
        method: &str,
        args: &[Expr],
        pos: Position,
    ) -> CgResult<Val> {
        let recv = self.gen_expr(receiver)?;
        let type_name = canonical(recv.ty().strip_refs());
        let qualified = format!("{type_name}::{method}");
        let Some(sig) = self.layout.methods.get(&qualified).cloned() else {
            return Err(self.error(format!("unresolved method `{qualified}`"), pos));
        };
        let mut operands = if sig.self_by_ref == Some(true) {
            vec![format!("%{}* {}", type_name, self.addr_of(&recv)?)]
        } else if let Some((struct_name, fields)) =
            self.layout.struct_fields_for(&Ty::path_named(type_name.clone()))
        {
            self.flatten_val(&recv, &struct_name, &fields)?
                .into_iter()
                .map(|(ty, op)| format!("{ty} {op}"))
                .collect()
        } else {
            let (ty, op) = self.load_value(&recv)?;
            vec![format!("{ty} {op}")]
        };
        for (arg, want) in args.iter().zip(sig.params.iter()) {
            operands.extend(self.call_operand(arg, want)?);
        }
        let joined = operands.join(", ");
        let symbol = mangle::method(&type_name, method);
        let ret_llvm = self.layout.llvm_type(&sig.ret);
        if ret_llvm == "void" {
            self.emit(format!("  call void {symbol}({joined})"));
            Ok(unit_val())
        } else {
            let t = self.new_temp();
            self.emit(format!("  {t} = call {ret_llvm} {symbol}({joined})"));
            Ok(Val::Imm { llvm_ty: ret_llvm, text: t, ty: sig.ret })
        }
    }

    /// Spills an r-value into a fresh stack slot so methods taking `&self`/`&mut self` can
    /// be invoked on a temporary (autoref, §4.3.7).
    pub(crate) fn addr_of(&mut self, val: &Val) -> CgResult<String> {
        match val {
            Val::Addr { addr, .. } => Ok(addr.clone()),
            Val::Imm { llvm_ty, text, .. } => {
                let addr = self.new_slot("tmp");
                let align = super::align_for(llvm_ty);
                self.emit(format!("  {addr} = alloca {llvm_ty}, align {align}"));
                self.emit(format!("  store {llvm_ty} {text}, {llvm_ty}* {addr}, align {align}"));
                Ok(addr)
            }
        }
    }

    fn gen_field(&mut self, base: &Expr, name: &str, pos: Position) -> CgResult<Val> {
        let base_val = self.gen_expr(base)?;
        let struct_name = canonical(base_val.ty().strip_refs());
        let Some(idx) = self.layout.field_index(&struct_name, name) else {
            return Err(self.error(format!("unknown field `{name}` on `{struct_name}`"), pos));
        };
        let field_ty = self.layout.field_type(&struct_name, name).cloned().unwrap_or(Ty::Inferred);
        let field_llvm = self.layout.llvm_type(&field_ty);
        let base_addr = self.addr_of(&base_val)?;
        let t = self.new_temp();
        self.emit(format!(
            "  {t} = getelementptr inbounds %{struct_name}, %{struct_name}* {base_addr}, i32 0, i32 {idx}"
        ));
        Ok(Val::Addr { llvm_ty: field_llvm, addr: t, ty: field_ty })
    }

    fn gen_tuple_index(&mut self, base: &Expr, index: u32, pos: Position) -> CgResult<Val> {
        self.gen_field(base, &index.to_string(), pos)
    }

    fn gen_index(&mut self, base: &Expr, index: &Expr, pos: Position) -> CgResult<Val> {
        let base_val = self.gen_expr(base)?;
        let elem_ty = match base_val.ty() {
            Ty::Array { elem, .. } | Ty::Slice(elem) => (**elem).clone(),
            _ => return Err(self.error("indexing requires an array or slice", pos)),
        };
        let elem_llvm = self.layout.llvm_type(&elem_ty);
        let base_addr = self.addr_of(&base_val)?;
        let idx_val = self.gen_expr(index)?;
        let (idx_ty, idx_op) = self.load_value(&idx_val)?;
        let idx_i64 = self.convert(&idx_ty, &idx_op, "i64");
        let t = self.new_temp();
        self.emit(format!(
            "  {t} = getelementptr inbounds {}, {}* {base_addr}, i64 0, i64 {idx_i64}",
            base_val.llvm_ty(),
            base_val.llvm_ty()
        ));
        Ok(Val::Addr { llvm_ty: elem_llvm, addr: t, ty: elem_ty })
    }

    fn gen_tuple(&mut self, elems: &[Expr], _pos: Position) -> CgResult<Val> {
        let ty = Ty::Tuple(elems.iter().map(|_| Ty::Inferred).collect());
        let mut vals = Vec::new();
        for e in elems {
            vals.push(self.gen_expr(e)?);
        }
        let llvm_tys: Vec<String> = vals.iter().map(|v| v.llvm_ty().to_string()).collect();
        let agg = format!("{{{}}}", llvm_tys.join(", "));
        let addr = self.new_slot("tuple");
        self.emit(format!("  {addr} = alloca {agg}, align 8"));
        for (i, v) in vals.iter().enumerate() {
            let (from_ty, op) = self.load_value(v)?;
            let field_ty = &llvm_tys[i];
            let converted = self.convert(&from_ty, &op, field_ty);
            let gep = self.new_temp();
            self.emit(format!("  {gep} = getelementptr inbounds {agg}, {agg}* {addr}, i32 0, i32 {i}"));
            self.emit(format!("  store {field_ty} {converted}, {field_ty}* {gep}"));
        }
        Ok(Val::Addr { llvm_ty: agg, addr, ty })
    }

    fn gen_struct_literal(
        &mut self,
        path: &Path,
        fields: &[StructLitField],
        base: Option<&Expr>,
        pos: Position,
    ) -> CgResult<Val> {
        let struct_name = path.last().to_string();
        let Some(layout_fields) = self.layout.structs.get(&struct_name).cloned() else {
            return Err(self.error(format!("unknown struct `{struct_name}`"), pos));
        };
        let addr = self.new_slot(&struct_name.to_lowercase());
        self.emit(format!("  {addr} = alloca %{struct_name}, align 8"));

        if let Some(base_expr) = base {
            let base_val = self.gen_expr(base_expr)?;
            let base_addr = self.addr_of(&base_val)?;
            for (i, (_, fty)) in layout_fields.iter().enumerate() {
                let fllvm = self.layout.llvm_type(fty);
                let src = self.new_temp();
                self.emit(format!(
                    "  {src} = getelementptr inbounds %{struct_name}, %{struct_name}* {base_addr}, i32 0, i32 {i}"
                ));
                let loaded = self.new_temp();
                self.emit(format!("  {loaded} = load {fllvm}, {fllvm}* {src}"));
                let dst = self.new_temp();
                self.emit(format!(
                    "  {dst} = getelementptr inbounds %{struct_name}, %{struct_name}* {addr}, i32 0, i32 {i}"
                ));
                self.emit(format!("  store {fllvm} {loaded}, {fllvm}* {dst}"));
            }
        }

        for field in fields {
            let name = match &field.name {
                FieldName::Named(n) => n.clone(),
                FieldName::Index(i) => i.to_string(),
            };
            let Some(idx) = self.layout.field_index(&struct_name, &name) else {
                return Err(self.error(format!("unknown field `{name}` on `{struct_name}`"), pos));
            };
            let fty = self.layout.field_type(&struct_name, &name).cloned().unwrap_or(Ty::Inferred);
            let fllvm = self.layout.llvm_type(&fty);
            let val = match &field.value {
                Some(e) => self.gen_expr(e)?,
                None => self.gen_path(&Path::single(name.clone()), pos)?,
            };
            let (from_ty, op) = self.load_value(&val)?;
            let converted = self.convert(&from_ty, &op, &fllvm);
            let gep = self.new_temp();
            self.emit(format!(
                "  {gep} = getelementptr inbounds %{struct_name}, %{struct_name}* {addr}, i32 0, i32 {idx}"
            ));
            self.emit(format!("  store {fllvm} {converted}, {fllvm}* {gep}"));
        }

        Ok(Val::Addr {
            llvm_ty: format!("%{struct_name}"),
            addr,
            ty: Ty::path_named(struct_name),
        })
    }

    fn gen_array(&mut self, arr: &ArrayExpr, pos: Position) -> CgResult<Val> {
        match arr {
            ArrayExpr::Literal(elems) => {
                if elems.is_empty() {
                    return Err(self.error("empty array literals need an explicit type", pos));
                }
                let vals: Vec<Val> =
                    elems.iter().map(|e| self.gen_expr(e)).collect::<CgResult<_>>()?;
                let elem_llvm = vals[0].llvm_ty().to_string();
                let elem_ty = vals[0].ty().clone();
                let n = vals.len();
                let arr_llvm = format!("[{n} x {elem_llvm}]");
                let addr = self.new_slot("arr");
                self.emit(format!("  {addr} = alloca {arr_llvm}, align 8"));
                for (i, v) in vals.iter().enumerate() {
                    let (from_ty, op) = self.load_value(v)?;
                    let converted = self.convert(&from_ty, &op, &elem_llvm);
                    let gep = self.new_temp();
                    self.emit(format!(
                        "  {gep} = getelementptr inbounds {arr_llvm}, {arr_llvm}* {addr}, i64 0, i64 {i}"
                    ));
                    self.emit(format!("  store {elem_llvm} {converted}, {elem_llvm}* {gep}"));
                }
                Ok(Val::Addr {
                    llvm_ty: arr_llvm,
                    addr,
                    ty: Ty::Array { elem: Box::new(elem_ty), len: Box::new(int_lit(n as i128)) },
                })
            }
            ArrayExpr::Repeat(value, count) => {
                let n: usize = crate::checker::types::array_len_literal(count).max(0) as usize;
                let val = self.gen_expr(value)?;
                let elem_llvm = val.llvm_ty().to_string();
                let elem_ty = val.ty().clone();
                let arr_llvm = format!("[{n} x {elem_llvm}]");
                let addr = self.new_slot("arr");
                self.emit(format!("  {addr} = alloca {arr_llvm}, align 8"));
                let (from_ty, op) = self.load_value(&val)?;
                let converted = self.convert(&from_ty, &op, &elem_llvm);
                for i in 0..n {
                    let gep = self.new_temp();
                    self.emit(format!(
                        "  {gep} = getelementptr inbounds {arr_llvm}, {arr_llvm}* {addr}, i64 0, i64 {i}"
                    ));
                    self.emit(format!("  store {elem_llvm} {converted}, {elem_llvm}* {gep}"));
                }
                Ok(Val::Addr {
                    llvm_ty: arr_llvm,
                    addr,
                    ty: Ty::Array { elem: Box::new(elem_ty), len: Box::new(int_lit(n as i128)) },
                })
            }
        }
    }

    fn gen_arith(&mut self, op: ArithOp, lhs: &Expr, rhs: &Expr, pos: Position) -> CgResult<Val> {
        let lv = self.gen_expr(lhs)?;
        let rv = self.gen_expr(rhs)?;
        let (lty, lop) = self.load_value(&lv)?;
        let (rty, rop) = self.load_value(&rv)?;
        let is_float = lty == "float" || lty == "double" || rty == "float" || rty == "double";
        let result_ty = wider(&lty, &rty);
        let lop = self.convert(&lty, &lop, &result_ty);
        let rop = self.convert(&rty, &rop, &result_ty);
        let mnemonic = if is_float {
            match op {
                ArithOp::Add => "fadd",
                ArithOp::Sub => "fsub",
                ArithOp::Mul => "fmul",
                ArithOp::Div => "fdiv",
                ArithOp::Mod => "frem",
                _ => return Err(self.error("bitwise ops are not defined on floats", pos)),
            }
        } else {
            op.mnemonic()
        };
        let t = self.new_temp();
        self.emit(format!("  {t} = {mnemonic} {result_ty} {lop}, {rop}"));
        let ty = if is_float && result_ty == "float" {
            Ty::path_named("f32")
        } else if is_float {
            Ty::path_named("f64")
        } else {
            wider_source_ty(lv.ty(), rv.ty())
        };
        Ok(Val::Imm { llvm_ty: result_ty, text: t, ty })
    }

    fn gen_cmp(&mut self, op: CmpOp, lhs: &Expr, rhs: &Expr, _pos: Position) -> CgResult<Val> {
        let lv = self.gen_expr(lhs)?;
        let rv = self.gen_expr(rhs)?;
        let (lty, lop) = self.load_value(&lv)?;
        let (rty, rop) = self.load_value(&rv)?;
        let is_float = lty == "float" || lty == "double";
        let cmp_ty = wider(&lty, &rty);
        let lop = self.convert(&lty, &lop, &cmp_ty);
        let rop = self.convert(&rty, &rop, &cmp_ty);
        let t = self.new_temp();
        if is_float {
            let code = match op {
                CmpOp::Eq => "oeq",
                CmpOp::Ne => "one",
                CmpOp::Lt => "olt",
                CmpOp::Le => "ole",
                CmpOp::Gt => "ogt",
                CmpOp::Ge => "oge",
            };
            self.emit(format!("  {t} = fcmp {code} {cmp_ty} {lop}, {rop}"));
        } else {
            self.emit(format!("  {t} = icmp {} {cmp_ty} {lop}, {rop}", op.icmp_code()));
        }
        Ok(Val::Imm { llvm_ty: "i1".to_string(), text: t, ty: Ty::path_named("bool") })
    }

    fn gen_lazy(&mut self, op: LazyOp, lhs: &Expr, rhs: &Expr, _pos: Position) -> CgResult<Val> {
        let merge = self.new_slot("lazy");
        self.emit(format!("  {merge} = alloca i1, align 1"));
        let lv = self.gen_expr(lhs)?;
        let (_, lop) = self.load_value(&lv)?;
        let rhs_label = self.new_label("lazy.rhs");
        let short_label = self.new_label("lazy.short");
        let end_label = self.new_label("lazy.end");
        match op {
            LazyOp::And => self.emit_terminator(format!(
                "  br i1 {lop}, label %{rhs_label}, label %{short_label}"
            )),
            LazyOp::Or => self.emit_terminator(format!(
                "  br i1 {lop}, label %{short_label}, label %{rhs_label}"
            )),
        }

        self.emit_label(&short_label);
        let short_value = matches!(op, LazyOp::Or);
        self.emit(format!("  store i1 {}, i1* {merge}, align 1", short_value as i32));
        self.emit_terminator(format!("  br label %{end_label}"));

        self.emit_label(&rhs_label);
        let rv = self.gen_expr(rhs)?;
        let (_, rop) = self.load_value(&rv)?;
        self.emit(format!("  store i1 {rop}, i1* {merge}, align 1"));
        self.emit_terminator(format!("  br label %{end_label}"));

        self.emit_label(&end_label);
        let t = self.new_temp();
        self.emit(format!("  {t} = load i1, i1* {merge}, align 1"));
        Ok(Val::Imm { llvm_ty: "i1".to_string(), text: t, ty: Ty::path_named("bool") })
    }

    fn gen_assign(&mut self, target: &Expr, value: &Expr, pos: Position) -> CgResult<Val> {
        if matches!(target, Expr::Underscore(_)) {
            self.gen_expr(value)?;
            return Ok(unit_val());
        }
        let target_val = self.gen_expr(target)?;
        let Val::Addr { llvm_ty, addr, .. } = &target_val else {
            return Err(self.error("assignment target is not an l-value", pos));
        };
        let val = self.gen_expr(value)?;
        let (from_ty, op) = self.load_value(&val)?;
        let converted = self.convert(&from_ty, &op, llvm_ty);
        self.emit(format!("  store {llvm_ty} {converted}, {llvm_ty}* {addr}"));
        Ok(unit_val())
    }

    fn gen_compound_assign(
        &mut self,
        op: ArithOp,
        target: &Expr,
        value: &Expr,
        pos: Position,
    ) -> CgResult<Val> {
        let target_val = self.gen_expr(target)?;
        let Val::Addr { llvm_ty, addr, .. } = &target_val else {
            return Err(self.error("assignment target is not an l-value", pos));
        };
        let llvm_ty = llvm_ty.clone();
        let addr = addr.clone();
        let cur = self.new_temp();
        let align = super::align_for(&llvm_ty);
        self.emit(format!("  {cur} = load {llvm_ty}, {llvm_ty}* {addr}, align {align}"));
        let rv = self.gen_expr(value)?;
        let (rty, rop) = self.load_value(&rv)?;
        let rop = self.convert(&rty, &rop, &llvm_ty);
        let is_float = llvm_ty == "float" || llvm_ty == "double";
        let mnemonic = if is_float {
            match op {
                ArithOp::Add => "fadd",
                ArithOp::Sub => "fsub",
                ArithOp::Mul => "fmul",
                ArithOp::Div => "fdiv",
                ArithOp::Mod => "frem",
                _ => return Err(self.error("bitwise ops are not defined on floats", pos)),
            }
        } else {
            op.mnemonic()
        };
        let t = self.new_temp();
        self.emit(format!("  {t} = {mnemonic} {llvm_ty} {cur}, {rop}"));
        self.emit(format!("  store {llvm_ty} {t}, {llvm_ty}* {addr}, align {align}"));
        Ok(unit_val())
    }

    fn gen_borrow(&mut self, inner: &Expr) -> CgResult<Val> {
        let val = self.gen_expr(inner)?;
        let addr = self.addr_of(&val)?;
        let inner_ty = val.ty().clone();
        Ok(Val::Imm {
            llvm_ty: format!("{}*", val.llvm_ty()),
            text: addr,
            ty: Ty::Reference { mutable: false, inner: Box::new(inner_ty) },
        })
    }

    fn gen_deref(&mut self, inner: &Expr, pos: Position) -> CgResult<Val> {
        let val = self.gen_expr(inner)?;
        let (from_ty, op) = self.load_value(&val)?;
        let pointee_ty = match val.ty() {
            Ty::Reference { inner, .. } => (**inner).clone(),
            _ => return Err(self.error("cannot dereference a non-reference value", pos)),
        };
        let pointee_llvm = from_ty.strip_suffix('*').unwrap_or(&from_ty).to_string();
        Ok(Val::Addr { llvm_ty: pointee_llvm, addr: op, ty: pointee_ty })
    }

    fn gen_neg(&mut self, logical: bool, inner: &Expr, pos: Position) -> CgResult<Val> {
        let val = self.gen_expr(inner)?;
        let (llvm_ty, op) = self.load_value(&val)?;
        let ty = val.ty().clone();
        let t = self.new_temp();
        if logical {
            if llvm_ty != "i1" {
                return Err(self.error("`!` requires a bool operand", pos));
            }
            self.emit(format!("  {t} = xor i1 {op}, 1"));
        } else if llvm_ty == "float" || llvm_ty == "double" {
            self.emit(format!("  {t} = fneg {llvm_ty} {op}"));
        } else {
            self.emit(format!("  {t} = sub {llvm_ty} 0, {op}"));
        }
        Ok(Val::Imm { llvm_ty, text: t, ty })
    }

    fn gen_cast(&mut self, inner: &Expr, ty: &Ty, _pos: Position) -> CgResult<Val> {
        let val = self.gen_expr(inner)?;
        let (from_ty, op) = self.load_value(&val)?;
        let to_llvm = self.layout.llvm_type(ty);
        let converted = self.convert(&from_ty, &op, &to_llvm);
        Ok(Val::Imm { llvm_ty: to_llvm, text: converted, ty: ty.clone() })
    }

    /// Infers an expression's static type without emitting any instructions, so control-flow
    /// lowering can size a merge slot before generating the branches that feed it (§4.3.5).
    pub(crate) fn static_type(&self, expr: &Expr) -> Ty {
        match expr {
            Expr::Literal(lit, _) => match lit {
                Literal::Int(_, suffix) => int_literal_ty(suffix.as_deref()).1,
                Literal::Float(_, suffix) => {
                    Ty::path_named(if suffix.as_deref() == Some("f32") { "f32" } else { "f64" })
                }
                Literal::Bool(_) => Ty::path_named("bool"),
                Literal::Char(_) => Ty::path_named("char"),
                Literal::Byte(_) => Ty::path_named("u8"),
                _ => Ty::path_named("str"),
            },
            Expr::Path(path, _) => {
                if path.segments.len() == 1 {
                    let name = path.last();
                    if let Some(slot) = self.lookup_var(name) {
                        return slot.ty.clone();
                    }
                    if let Some(v) = self.layout.constant_value(name) {
                        return v.ty().clone();
                    }
                    return Ty::unit();
                }
                let qualified = path.segments.join("::");
                if let Some(v) = self.layout.constant_value(&qualified) {
                    return v.ty().clone();
                }
                Ty::path_named(path.segments[0].clone())
            }
            Expr::Block(b, _) => block_tail_expr(b).map(|e| self.static_type(e)).unwrap_or(Ty::unit()),
            Expr::If(if_expr) => block_tail_expr(&if_expr.then_branch)
                .map(|e| self.static_type(e))
                .unwrap_or(Ty::unit()),
            Expr::Match { .. } => Ty::unit(),
            Expr::Return(..) | Expr::Break(..) | Expr::Continue(_) => Ty::Never,
            Expr::Call { callee, .. } => {
                let Expr::Path(path, _) = callee.as_ref() else { return Ty::unit() };
                if path.segments.len() == 1 {
                    let name = path.last();
                    if let Some((_, ret)) = builtins::signature(name) {
                        return llvm_scalar_to_ty(ret);
                    }
                    if let Some(sig) = self.layout.functions.get(name) {
                        return sig.ret.clone();
                    }
                } else if let Some(sig) = self.layout.methods.get(&path.segments.join("::")) {
                    return sig.ret.clone();
                }
                Ty::unit()
            }
            Expr::MethodCall { receiver, method, .. } => {
                let recv_ty = canonical(self.static_type(receiver).strip_refs());
                self.layout
                    .methods
                    .get(&format!("{recv_ty}::{method}"))
                    .map(|sig| sig.ret.clone())
                    .unwrap_or(Ty::unit())
            }
            Expr::Field { base, name, .. } => {
                let struct_name = canonical(self.static_type(base).strip_refs());
                self.layout.field_type(&struct_name, name).cloned().unwrap_or(Ty::Inferred)
            }
            Expr::TupleIndex { base, index, .. } => {
                let struct_name = canonical(self.static_type(base).strip_refs());
                self.layout.field_type(&struct_name, &index.to_string()).cloned().unwrap_or(Ty::Inferred)
            }
            Expr::Index { base, .. } => match self.static_type(base) {
                Ty::Array { elem, .. } | Ty::Slice(elem) => *elem,
                _ => Ty::Inferred,
            },
            Expr::Tuple(elems, _) => Ty::Tuple(elems.iter().map(|e| self.static_type(e)).collect()),
            Expr::StructLiteral { path, .. } => Ty::path_named(path.last().to_string()),
            Expr::Array(ArrayExpr::Literal(elems), _) if !elems.is_empty() => Ty::Array {
                elem: Box::new(self.static_type(&elems[0])),
                len: Box::new(int_lit(elems.len() as i128)),
            },
            Expr::Array(ArrayExpr::Repeat(value, count), _) => Ty::Array {
                elem: Box::new(self.static_type(value)),
                len: Box::new(int_lit(crate::checker::types::array_len_literal(count).max(0) as i128)),
            },
            Expr::Array(..) => Ty::Inferred,
            Expr::Range { .. } => Ty::Inferred,
            Expr::Arith { lhs, rhs, .. } => wider_source_ty(&self.static_type(lhs), &self.static_type(rhs)),
            Expr::Cmp { .. } | Expr::Lazy { .. } => Ty::path_named("bool"),
            Expr::Assign { .. } | Expr::CompoundAssign { .. } => Ty::unit(),
            Expr::Borrow { mutable, inner, .. } => {
                Ty::Reference { mutable: *mutable, inner: Box::new(self.static_type(inner)) }
            }
            Expr::Deref { inner, .. } => match self.static_type(inner) {
                Ty::Reference { inner, .. } => *inner,
                other => other,
            },
            Expr::Neg { inner, .. } => self.static_type(inner),
            Expr::Cast { ty, .. } => ty.clone(),
            Expr::Grouped(inner, _) => self.static_type(inner),
            Expr::While { .. } | Expr::Loop { .. } | Expr::Underscore(_) => Ty::unit(),
        }
    }
}

/// The last statement of a block, if it is a trailing (semicolon-less) expression.
pub(crate) fn block_tail_expr(block: &Block) -> Option<&Expr> {
    match block.stmts.last() {
        Some(Stmt::Expr { expr, semi: false }) => Some(expr),
        _ => None,
    }
}

pub(crate) fn llvm_scalar_to_ty(llvm: &str) -> Ty {
    match llvm {
        "void" => Ty::unit(),
        "i1" => Ty::path_named("bool"),
        "i8*" => Ty::path_named("str"),
        "i32" => Ty::path_named("i32"),
        "i64" => Ty::path_named("i64"),
        _ => Ty::Inferred,
    }
}

pub(crate) fn unit_val() -> Val {
    Val::Imm { llvm_ty: "void".to_string(), text: String::new(), ty: Ty::unit() }
}

fn int_lit(v: i128) -> Expr {
    Expr::Literal(Literal::Int(v, None), Position::default())
}

fn int_literal_ty(suffix: Option<&str>) -> (String, Ty) {
    match suffix {
        Some("u32") => ("i64".to_string(), Ty::path_named("u32")),
        Some("i64") | Some("isize") => ("i64".to_string(), Ty::path_named("i64")),
        Some("u64") | Some("usize") => ("i64".to_string(), Ty::path_named("usize")),
        Some("i8") | Some("u8") => ("i8".to_string(), Ty::path_named(suffix.unwrap())),
        Some("i16") | Some("u16") => ("i16".to_string(), Ty::path_named(suffix.unwrap())),
        Some(other) => ("i32".to_string(), Ty::path_named(other)),
        None => ("i32".to_string(), Ty::path_named("i32")),
    }
}

fn wider(a: &str, b: &str) -> String {
    fn rank(t: &str) -> i32 {
        match t {
            "i1" => 0,
            "i8" => 1,
            "i16" => 2,
            "i32" => 3,
            "i64" => 4,
            "float" => 5,
            "double" => 6,
            _ => 3,
        }
    }
    if rank(a) >= rank(b) {
        a.to_string()
    } else {
        b.to_string()
    }
}

fn wider_source_ty(a: &Ty, b: &Ty) -> Ty {
    if canonical(a) == "i64" || canonical(b) == "i64" || canonical(a) == "u32" || canonical(b) == "u32" {
        if canonical(a) == "u32" && canonical(b) == "u32" {
            return Ty::path_named("u32");
        }
        return Ty::path_named("i64");
    }
    a.clone()
}
