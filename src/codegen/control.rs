//! `if`/`while`/`loop` lowering without `phi` nodes (§4.3.5): each branch stores its result
//! into a merge slot allocated ahead of time, then jumps to a shared join label that reloads
//! it. `break`/`continue` resolve against a stack of `(header, end)` label pairs.

use crate::ast::*;

use super::expr::{block_tail_expr, unit_val};
use super::{CgResult, Val, VarSlot};

impl super::Codegen {
    pub(crate) fn gen_if(&mut self, if_expr: &IfExpr) -> CgResult<Val> {
        let result_ty = block_tail_expr(&if_expr.then_branch)
            .map(|e| self.static_type(e))
            .unwrap_or(Ty::unit());
        let result_llvm = self.layout.llvm_type(&result_ty);
        let wants_value = result_llvm != "void";
        let merge_slot = if wants_value {
            let addr = self.new_slot("ifval");
            let align = super::align_for(&result_llvm);
            self.emit(format!("  {addr} = alloca {result_llvm}, align {align}"));
            Some(addr)
        } else {
            None
        };

        let cond_val = self.gen_cond(&if_expr.cond)?;
        let (_, cond_op) = self.load_value(&cond_val)?;
        let then_label = self.new_label("then");
        let end_label = self.new_label("ifend");
        let else_label = if if_expr.else_branch.is_some() {
            self.new_label("else")
        } else {
            end_label.clone()
        };
        self.emit_terminator(format!(
            "  br i1 {cond_op}, label %{then_label}, label %{else_label}"
        ));

        self.emit_label(&then_label);
        let then_tail = self.gen_block(&if_expr.then_branch)?;
        if !self.terminated {
            self.store_branch_result(&merge_slot, &result_llvm, then_tail.as_ref())?;
            self.emit_terminator(format!("  br label %{end_label}"));
        }

        if let Some(else_branch) = &if_expr.else_branch {
            self.emit_label(&else_label);
            match else_branch.as_ref() {
                ElseBranch::Block(b) => {
                    let else_tail = self.gen_block(b)?;
                    if !self.terminated {
                        self.store_branch_result(&merge_slot, &result_llvm, else_tail.as_ref())?;
                        self.emit_terminator(format!("  br label %{end_label}"));
                    }
                }
                ElseBranch::If(nested) => {
                    let nested_val = self.gen_if(nested)?;
                    if !self.terminated {
                        self.store_branch_result(&merge_slot, &result_llvm, Some(&nested_val))?;
                        self.emit_terminator(format!("  br label %{end_label}"));
                    }
                }
            }
        }

        self.emit_label(&end_label);
        match merge_slot {
            Some(addr) => {
                let t = self.new_temp();
                let align = super::align_for(&result_llvm);
                self.emit(format!("  {t} = load {result_llvm}, {result_llvm}* {addr}, align {align}"));
                Ok(Val::Imm { llvm_ty: result_llvm, text: t, ty: result_ty })
            }
            None => Ok(unit_val()),
        }
    }

    fn store_branch_result(
        &mut self,
        merge_slot: &Option<String>,
        result_llvm: &str,
        tail: Option<&Val>,
    ) -> CgResult<()> {
        if let (Some(addr), Some(val)) = (merge_slot, tail) {
            let (from_ty, op) = self.load_value(val)?;
            let converted = self.convert(&from_ty, &op, result_llvm);
            self.emit(format!("  store {result_llvm} {converted}, {result_llvm}* {addr}"));
        }
        Ok(())
    }

    fn gen_cond(&mut self, cond: &Cond) -> CgResult<Val> {
        match cond {
            Cond::Expr(e) => self.gen_expr(e),
            Cond::LetChain(arms) => {
                if let [arm] = arms.as_slice() {
                    if let Some(name) = arm.pattern.simple_name() {
                        let val = self.gen_expr(&arm.scrutinee)?;
                        let llvm_ty = val.llvm_ty().to_string();
                        let ty = val.ty().clone();
                        let addr = self.addr_of(&val)?;
                        self.declare_var(name, VarSlot { llvm_ty, addr, ty });
                        return Ok(Val::Imm {
                            llvm_ty: "i1".to_string(),
                            text: "1".to_string(),
                            ty: Ty::path_named("bool"),
                        });
                    }
                }
                let pos = arms.first().map(|a| a.scrutinee.pos()).unwrap_or_default();
                Err(self.error("if-let with a refutable pattern is not supported by the IR generator", pos))
            }
        }
    }

    pub(crate) fn gen_while(&mut self, cond: &Cond, body: &Block, _pos: Position) -> CgResult<Val> {
        let header = self.new_label("while.cond");
        let body_label = self.new_label("while.body");
        let end_label = self.new_label("while.end");
        self.emit_terminator(format!("  br label %{header}"));

        self.emit_label(&header);
        let cond_val = self.gen_cond(cond)?;
        let (_, cond_op) = self.load_value(&cond_val)?;
        self.emit_terminator(format!("  br i1 {cond_op}, label %{body_label}, label %{end_label}"));

        self.emit_label(&body_label);
        self.loop_stack.push((header.clone(), end_label.clone()));
        self.gen_block(body)?;
        self.loop_stack.pop();
        if !self.terminated {
            self.emit_terminator(format!("  br label %{header}"));
        }

        self.emit_label(&end_label);
        Ok(unit_val())
    }

    pub(crate) fn gen_loop(&mut self, body: &Block, _pos: Position) -> CgResult<Val> {
        let body_label = self.new_label("loop.body");
        let end_label = self.new_label("loop.end");
        self.emit_terminator(format!("  br label %{body_label}"));

        self.emit_label(&body_label);
        self.loop_stack.push((body_label.clone(), end_label.clone()));
        self.gen_block(body)?;
        self.loop_stack.pop();
        if !self.terminated {
            self.emit_terminator(format!("  br label %{body_label}"));
        }

        self.emit_label(&end_label);
        Ok(unit_val())
    }

    pub(crate) fn gen_return(&mut self, value: Option<&Expr>, pos: Position) -> CgResult<Val> {
        let ret_llvm = self.return_llvm_ty.clone().unwrap_or_else(|| "void".to_string());
        if let Some(v) = value {
            let val = self.gen_expr(v)?;
            if ret_llvm != "void" {
                if let Some(slot) = self.return_slot.clone() {
                    let (from_ty, op) = self.load_value(&val)?;
                    let converted = self.convert(&from_ty, &op, &ret_llvm);
                    self.emit(format!("  store {ret_llvm} {converted}, {ret_llvm}* {slot}"));
                }
            }
        }
        let Some(label) = self.return_label.clone() else {
            return Err(self.error("return outside function", pos));
        };
        self.emit_terminator(format!("  br label %{label}"));
        Ok(Val::Imm { llvm_ty: "void".to_string(), text: String::new(), ty: Ty::Never })
    }

    pub(crate) fn gen_break(&mut self, value: Option<&Expr>, pos: Position) -> CgResult<Val> {
        let Some((_, end_label)) = self.loop_stack.last().cloned() else {
            return Err(self.error("break outside loop", pos));
        };
        if value.is_some() {
            return Err(self.error("break with a value is not supported by the IR generator", pos));
        }
        self.emit_terminator(format!("  br label %{end_label}"));
        Ok(Val::Imm { llvm_ty: "void".to_string(), text: String::new(), ty: Ty::Never })
    }

    pub(crate) fn gen_continue(&mut self, pos: Position) -> CgResult<Val> {
        let Some((header, _)) = self.loop_stack.last().cloned() else {
            return Err(self.error("continue outside loop", pos));
        };
        self.emit_terminator(format!("  br label %{header}"));
        Ok(Val::Imm { llvm_ty: "void".to_string(), text: String::new(), ty: Ty::Never })
    }
}
