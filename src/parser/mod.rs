//! # Parser
//!
//! Recursive descent carries the structural skeleton — items, statements, types, patterns —
//! while expressions are driven by a Pratt (operator-precedence) loop over the table in
//! `expr.rs`. The two styles meet at block boundaries: a block is parsed by descent, each
//! statement inside it dispatches back into the Pratt loop for its expression.

pub mod expr;
pub mod item;
pub mod pattern;
pub mod state;
pub mod stmt;
pub mod ty;

pub use state::{PResult, ParseState};

use crate::ast::TopLevel;
use crate::diagnostics::Diagnostic;

/// Parses `src` into the top-level node sequence (§4.1.5): at each position, item then
/// statement then expression are tried in turn, the cursor rolled back between attempts.
pub fn parse(src: &str) -> Result<Vec<TopLevel>, Diagnostic> {
    let tokens = crate::lexer::tokenize(src);
    let mut s = ParseState::new(tokens, src);
    let mut out = Vec::new();

    while !s.at_eof() {
        if item::is_item_start(&s) {
            out.push(TopLevel::Item(item::parse_item(&mut s)?));
            continue;
        }

        let save = s.save();
        match stmt::parse_stmt(&mut s) {
            // A bare trailing expression statement with no `;` is promoted to a top-level
            // expression node rather than wrapped as a statement, matching the
            // Expr/Statement split in `TopLevel`.
            Ok(crate::ast::Stmt::Expr { expr, semi: false }) => out.push(TopLevel::Expr(expr)),
            Ok(other) => out.push(TopLevel::Statement(other)),
            Err(_) => {
                s.restore(save);
                let expr = expr::parse_expr(&mut s, 0)?;
                s.eat(";");
                out.push(TopLevel::Expr(expr));
            }
        }
    }

    Ok(out)
}
