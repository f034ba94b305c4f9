use super::expr::{parse_block, parse_expr};
use super::item::{is_item_start, parse_item};
use super::state::{PResult, ParseState};
use super::ty::parse_type;
use crate::ast::{Expr, Stmt};

/// A statement: empty, item, let, or expression (§3.2). The reference's statement-vs-
/// expression dance (§4.1.6) shows up here as `;`-or-trailing-value bookkeeping rather than
/// backtracking, since the leading token always disambiguates which of the four this is.
pub fn parse_stmt(s: &mut ParseState) -> PResult<Stmt> {
    let pos = s.pos_mark();

    if s.eat(";") {
        return Ok(Stmt::Empty(pos));
    }

    if is_item_start(s) {
        return Ok(Stmt::Item(parse_item(s)?));
    }

    if s.is("let") {
        return parse_let(s, pos);
    }

    let expr = parse_expr(s, 0)?;
    let semi = s.eat(";");
    if !semi && requires_semi(&expr) && !s.is("}") {
        return Err(s.error("expected `;` after this expression"));
    }
    Ok(Stmt::Expr { expr, semi })
}

/// Block-like expressions (`if`, `match`, `while`, `loop`, bare `{}`) can stand alone as a
/// statement without a trailing `;`; anything else needs one unless it's the block's final
/// (unterminated) trailing-value expression.
fn requires_semi(expr: &Expr) -> bool {
    !matches!(
        expr,
        Expr::If(_) | Expr::Match { .. } | Expr::While { .. } | Expr::Loop { .. } | Expr::Block(..)
    )
}

fn parse_let(s: &mut ParseState, pos: crate::lexer::Position) -> PResult<Stmt> {
    s.expect("let")?;
    let pattern = super::pattern::parse_pattern(s)?;
    let ty = if s.eat(":") {
        Some(parse_type(s)?)
    } else {
        None
    };
    let init = if s.eat("=") {
        Some(parse_expr(s, 0)?)
    } else {
        None
    };
    let else_block = if s.eat("else") {
        Some(parse_block(s)?)
    } else {
        None
    };
    s.expect(";")?;
    Ok(Stmt::Let {
        pattern,
        ty,
        init,
        else_block,
        pos,
    })
}
