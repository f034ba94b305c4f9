//! Statement and block lowering.

use crate::ast::*;

use super::{CgResult, Val, VarSlot};

impl super::Codegen {
    /// Lowers a block's statements in order, returning the trailing expression's value (if
    /// the block ends in one without a semicolon) so the caller can use it as the block's
    /// result (§4.1.2).
    pub(crate) fn gen_block(&mut self, block: &Block) -> CgResult<Option<Val>> {
        self.enter_scope();
        let mut tail = None;
        for (i, stmt) in block.stmts.iter().enumerate() {
            if self.terminated {
                break;
            }
            let is_last = i + 1 == block.stmts.len();
            if is_last {
                if let Stmt::Expr { expr, semi: false } = stmt {
                    tail = Some(self.gen_expr(expr)?);
                    continue;
                }
            }
            self.gen_stmt(stmt)?;
        }
        self.exit_scope();
        Ok(tail)
    }

    fn gen_stmt(&mut self, stmt: &Stmt) -> CgResult<()> {
        match stmt {
            Stmt::Empty(_) => Ok(()),
            Stmt::Item(_) => Ok(()), // nested items are generated once, ahead of their enclosing function
            Stmt::Let { pattern, ty, init, else_block, pos } => {
                self.gen_let(pattern, ty.as_ref(), init.as_ref(), else_block.as_ref(), *pos)
            }
            Stmt::Expr { expr, .. } => {
                self.gen_expr(expr)?;
                Ok(())
            }
        }
    }

    fn gen_let(
        &mut self,
        pattern: &Pattern,
        declared_ty: Option<&Ty>,
        init: Option<&Expr>,
        else_block: Option<&Block>,
        pos: Position,
    ) -> CgResult<()> {
        let Some(name) = pattern.simple_name() else {
            return Err(self.error(
                "destructuring let-bindings are not supported by the IR generator",
                pos,
            ));
        };

        let Some(init_expr) = init else {
            let Some(declared) = declared_ty else {
                return Err(self.error("let binding needs a type or an initializer", pos));
            };
            let llvm_ty = self.layout.llvm_type(declared);
            let align = super::align_for(&llvm_ty);
            let addr = self.new_slot(name);
            self.emit(format!("  {addr} = alloca {llvm_ty}, align {align}"));
            self.declare_var(name, VarSlot { llvm_ty, addr, ty: declared.clone() });
            return Ok(());
        };

        // An unsuffixed integer literal takes its width from the declared type directly
        // instead of lowering as `i32` and converting, so a value like `3000000000` assigned
        // to a `u32`/`i64` target never gets truncated through an intermediate 32-bit literal.
        let init_val = match (declared_ty, unsuffixed_int_literal(init_expr)) {
            (Some(declared), Some(v)) => {
                Val::Imm { llvm_ty: self.layout.llvm_type(declared), text: v.to_string(), ty: declared.clone() }
            }
            _ => self.gen_expr(init_expr)?,
        };

        if let Some(else_body) = else_block {
            // `let Some(x) = opt else { .. }`: only the trivial always-matching case
            // (a plain binding pattern) reaches here, so the else branch is dead;
            // still emit it for source-position fidelity in diagnostics-only builds.
            let saved_terminated = self.terminated;
            self.terminated = true;
            let _ = self.gen_block(else_body);
            self.terminated = saved_terminated;
        }

        let (llvm_ty, ty) = match declared_ty {
            Some(t) => (self.layout.llvm_type(t), t.clone()),
            None => (init_val.llvm_ty().to_string(), init_val.ty().clone()),
        };
        let align = super::align_for(&llvm_ty);
        let addr = self.new_slot(name);
        self.emit(format!("  {addr} = alloca {llvm_ty}, align {align}"));
        let (from_ty, op) = self.load_value(&init_val)?;
        let converted = self.convert(&from_ty, &op, &llvm_ty);
        self.emit(format!("  store {llvm_ty} {converted}, {llvm_ty}* {addr}, align {align}"));
        self.declare_var(name, VarSlot { llvm_ty, addr, ty });
        Ok(())
    }
}

/// The value of an unsuffixed integer literal, unwrapping `(...)` grouping. `None` for a
/// suffixed literal (whose own width already governs its lowering) or any other expression.
fn unsuffixed_int_literal(expr: &Expr) -> Option<i128> {
    match expr {
        Expr::Literal(Literal::Int(v, None), _) => Some(*v),
        Expr::Grouped(inner, _) => unsuffixed_int_literal(inner),
        _ => None,
    }
}
