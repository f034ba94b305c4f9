use super::state::{PResult, ParseState};
use super::ty::{parse_path, parse_type};
use crate::ast::{
    ArithOp, ArrayExpr, Block, CmpOp, Cond, ElseBranch, Expr, FieldName, IfExpr, LazyOp,
    LetChainArm, Literal, MatchArm, StructLitField,
};
use crate::lexer::TokenKind;

// Precedences doubled from §4.1.2 so the `^` rank (21.5) stays integral.
const PREC_CALL: u8 = 100;
const PREC_FIELD: u8 = 80;
const PREC_CAST: u8 = 78;
const PREC_INDEX: u8 = 60;
const PREC_MUL: u8 = 50;
const PREC_ADD: u8 = 48;
const PREC_SHIFT: u8 = 46;
const PREC_CMP: u8 = 44;
const PREC_BITAND: u8 = 44;
const PREC_BITXOR: u8 = 43;
const PREC_BITOR: u8 = 42;
const PREC_EQ: u8 = 40;
const PREC_AND: u8 = 34;
const PREC_OR: u8 = 32;
const PREC_ASSIGN: u8 = 20;
const PREC_RANGE: u8 = 12;

pub fn decode_int_literal(text: &str) -> Literal {
    let (digits, radix) = if let Some(h) = text.strip_prefix("0x") {
        (h, 16)
    } else if let Some(o) = text.strip_prefix("0o") {
        (o, 8)
    } else if let Some(b) = text.strip_prefix("0b") {
        (b, 2)
    } else {
        (text, 10)
    };
    let suffixes = [
        "u8", "u16", "u32", "u64", "u128", "usize", "i8", "i16", "i32", "i64", "i128", "isize",
    ];
    let mut body = digits;
    let mut suffix = None;
    for suf in suffixes {
        if let Some(stripped) = body.strip_suffix(suf) {
            body = stripped;
            suffix = Some(suf.to_string());
            break;
        }
    }
    let cleaned: String = body.chars().filter(|c| *c != '_').collect();
    let value = i128::from_str_radix(&cleaned, radix).unwrap_or(0);
    Literal::Int(value, suffix)
}

pub fn decode_float_literal(text: &str) -> Literal {
    let mut body = text;
    let mut suffix = None;
    for suf in ["f32", "f64"] {
        if let Some(stripped) = body.strip_suffix(suf) {
            body = stripped;
            suffix = Some(suf.to_string());
            break;
        }
    }
    let cleaned: String = body.chars().filter(|c| *c != '_').collect();
    let value = cleaned.parse::<f64>().unwrap_or(0.0);
    Literal::Float(value, suffix)
}

fn strip_quotes<'a>(text: &'a str, quote: char, prefix_len: usize) -> &'a str {
    let inner = &text[prefix_len..];
    inner.strip_suffix(quote).unwrap_or(inner)
}

pub fn decode_char_literal(text: &str) -> char {
    let body = strip_quotes(text, '\'', 1);
    unescape::unescape(body)
        .and_then(|s| s.chars().next())
        .unwrap_or_else(|| body.chars().next().unwrap_or('\0'))
}

pub fn decode_str_literal(text: &str) -> String {
    let body = strip_quotes(text, '"', 1);
    unescape::unescape(body).unwrap_or_else(|| body.to_string())
}

fn decode_byte_literal(text: &str) -> u8 {
    let body = strip_quotes(text, '\'', 2);
    unescape::unescape(body)
        .and_then(|s| s.bytes().next())
        .unwrap_or_else(|| body.bytes().next().unwrap_or(0))
}

fn decode_byte_str_literal(text: &str) -> Vec<u8> {
    let body = strip_quotes(text, '"', 2);
    unescape::unescape(body)
        .unwrap_or_else(|| body.to_string())
        .into_bytes()
}

fn decode_c_str_literal(text: &str) -> String {
    let body = strip_quotes(text, '"', 1);
    unescape::unescape(body).unwrap_or_else(|| body.to_string())
}

fn decode_raw_literal(kind: TokenKind, text: &str) -> Literal {
    // Skip the `r`/`br`/`cr` prefix and however many `#` delimiters precede the `"`.
    let after_quote_prefix = text
        .char_indices()
        .find(|(_, c)| *c == '"')
        .map(|(i, _)| i + 1)
        .unwrap_or(text.len());
    let hashes = text[..after_quote_prefix].matches('#').count();
    let end = text.len() - hashes - 1;
    let body = if after_quote_prefix <= end {
        &text[after_quote_prefix..end]
    } else {
        ""
    };
    match kind {
        TokenKind::RawStr => Literal::RawStr(body.to_string()),
        TokenKind::RawByteStr => Literal::RawByteStr(body.as_bytes().to_vec()),
        TokenKind::RawCStr => Literal::RawCStr(body.to_string()),
        _ => unreachable!(),
    }
}

/// Top-level expression entry point, §4.1.1/§4.1.2: Pratt loop over prefix/infix parselets.
pub fn parse_expr(s: &mut ParseState, min_bp: u8) -> PResult<Expr> {
    let mut lhs = parse_prefix(s)?;
    loop {
        let Some(lbp) = infix_lbp(s) else { break };
        if lbp <= min_bp {
            break;
        }
        lhs = parse_infix(s, lhs, lbp)?;
    }
    Ok(lhs)
}

fn infix_lbp(s: &ParseState) -> Option<u8> {
    let t = s.peek();
    if t.kind == TokenKind::Eof {
        return None;
    }
    Some(match t.text.as_str() {
        "(" => PREC_CALL,
        "." => PREC_FIELD,
        "as" => PREC_CAST,
        "[" => PREC_INDEX,
        "*" | "/" | "%" => PREC_MUL,
        "+" | "-" => PREC_ADD,
        "<<" | ">>" => PREC_SHIFT,
        "<" | "<=" | ">" | ">=" => PREC_CMP,
        "&" => PREC_BITAND,
        "^" => PREC_BITXOR,
        "|" => PREC_BITOR,
        "==" | "!=" => PREC_EQ,
        "&&" => PREC_AND,
        "||" => PREC_OR,
        "=" | "+=" | "-=" | "*=" | "/=" | "%=" | "&=" | "|=" | "^=" | "<<=" | ">>=" => {
            PREC_ASSIGN
        }
        ".." | "..=" => PREC_RANGE,
        _ => return None,
    })
}

fn parse_infix(s: &mut ParseState, lhs: Expr, lbp: u8) -> PResult<Expr> {
    let pos = s.pos_mark();
    let op_text = s.peek().text.clone();

    match op_text.as_str() {
        "(" => {
            s.bump();
            let was_restricted = s.set_restrict_struct_lit(false);
            let mut args = Vec::new();
            while !s.is(")") {
                args.push(parse_expr(s, 0)?);
                if !s.eat(",") {
                    break;
                }
            }
            s.set_restrict_struct_lit(was_restricted);
            s.expect(")")?;
            Ok(Expr::Call {
                callee: Box::new(lhs),
                args,
                pos,
            })
        }
        "." => {
            s.bump();
            if s.is_kind(TokenKind::Integer) {
                let idx_text = s.bump().text;
                let index: u32 = idx_text.parse().unwrap_or(0);
                return Ok(Expr::TupleIndex {
                    base: Box::new(lhs),
                    index,
                    pos,
                });
            }
            let name = s.expect_identifier()?;
            if s.eat("(") {
                let mut args = Vec::new();
                while !s.is(")") {
                    args.push(parse_expr(s, 0)?);
                    if !s.eat(",") {
                        break;
                    }
                }
                s.expect(")")?;
                return Ok(Expr::MethodCall {
                    receiver: Box::new(lhs),
                    method: name,
                    args,
                    pos,
                });
            }
            Ok(Expr::Field {
                base: Box::new(lhs),
                name,
                pos,
            })
        }
        "as" => {
            s.bump();
            let ty = parse_type(s)?;
            Ok(Expr::Cast {
                inner: Box::new(lhs),
                ty,
                pos,
            })
        }
        "[" => {
            s.bump();
            let was_restricted = s.set_restrict_struct_lit(false);
            let index = parse_expr(s, 0);
            s.set_restrict_struct_lit(was_restricted);
            s.expect("]")?;
            Ok(Expr::Index {
                base: Box::new(lhs),
                index: Box::new(index?),
                pos,
            })
        }
        "*" | "/" | "%" | "+" | "-" | "<<" | ">>" | "&" | "^" | "|" => {
            s.bump();
            let op = arith_op(&op_text);
            let rhs = parse_expr(s, lbp)?;
            Ok(Expr::Arith {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                pos,
            })
        }
        "<" | "<=" | ">" | ">=" | "==" | "!=" => {
            s.bump();
            let op = cmp_op(&op_text);
            let rhs = parse_expr(s, lbp + 1)?; // non-associative: forbid chaining
            Ok(Expr::Cmp {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                pos,
            })
        }
        "&&" => {
            s.bump();
            let rhs = parse_expr(s, lbp)?;
            Ok(Expr::Lazy {
                op: LazyOp::And,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                pos,
            })
        }
        "||" => {
            s.bump();
            let rhs = parse_expr(s, lbp)?;
            Ok(Expr::Lazy {
                op: LazyOp::Or,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                pos,
            })
        }
        "=" => {
            s.bump();
            let rhs = parse_expr(s, lbp - 1)?; // right-associative
            Ok(Expr::Assign {
                target: Box::new(lhs),
                value: Box::new(rhs),
                pos,
            })
        }
        "+=" | "-=" | "*=" | "/=" | "%=" | "&=" | "|=" | "^=" | "<<=" | ">>=" => {
            s.bump();
            let op = compound_op(&op_text);
            let rhs = parse_expr(s, lbp - 1)?;
            Ok(Expr::CompoundAssign {
                op,
                target: Box::new(lhs),
                value: Box::new(rhs),
                pos,
            })
        }
        ".." | "..=" => {
            let inclusive = op_text == "..=";
            s.bump();
            let end = if can_start_expr(s) {
                Some(Box::new(parse_expr(s, lbp)?))
            } else {
                None
            };
            Ok(Expr::Range {
                start: Some(Box::new(lhs)),
                end,
                inclusive,
                pos,
            })
        }
        _ => unreachable!("infix_lbp and parse_infix must agree"),
    }
}

fn arith_op(text: &str) -> ArithOp {
    match text {
        "+" => ArithOp::Add,
        "-" => ArithOp::Sub,
        "*" => ArithOp::Mul,
        "/" => ArithOp::Div,
        "%" => ArithOp::Mod,
        "&" => ArithOp::BitAnd,
        "|" => ArithOp::BitOr,
        "^" => ArithOp::BitXor,
        "<<" => ArithOp::Shl,
        ">>" => ArithOp::Shr,
        _ => unreachable!(),
    }
}

fn compound_op(text: &str) -> ArithOp {
    arith_op(text.trim_end_matches('='))
}

fn cmp_op(text: &str) -> CmpOp {
    match text {
        "<" => CmpOp::Lt,
        "<=" => CmpOp::Le,
        ">" => CmpOp::Gt,
        ">=" => CmpOp::Ge,
        "==" => CmpOp::Eq,
        "!=" => CmpOp::Ne,
        _ => unreachable!(),
    }
}

fn parse_prefix(s: &mut ParseState) -> PResult<Expr> {
    let pos = s.pos_mark();
    let tok = s.peek().clone();

    match tok.kind {
        TokenKind::Integer => {
            s.bump();
            Ok(Expr::Literal(decode_int_literal(&tok.text), pos))
        }
        TokenKind::Float => {
            s.bump();
            Ok(Expr::Literal(decode_float_literal(&tok.text), pos))
        }
        TokenKind::Char => {
            s.bump();
            Ok(Expr::Literal(Literal::Char(decode_char_literal(&tok.text)), pos))
        }
        TokenKind::Str => {
            s.bump();
            Ok(Expr::Literal(Literal::Str(decode_str_literal(&tok.text)), pos))
        }
        TokenKind::Byte => {
            s.bump();
            Ok(Expr::Literal(Literal::Byte(decode_byte_literal(&tok.text)), pos))
        }
        TokenKind::ByteStr => {
            s.bump();
            Ok(Expr::Literal(Literal::ByteStr(decode_byte_str_literal(&tok.text)), pos))
        }
        TokenKind::RawByteStr => {
            s.bump();
            Ok(Expr::Literal(decode_raw_literal(tok.kind, &tok.text), pos))
        }
        TokenKind::CStr => {
            s.bump();
            Ok(Expr::Literal(Literal::CStr(decode_c_str_literal(&tok.text)), pos))
        }
        TokenKind::RawCStr | TokenKind::RawStr => {
            s.bump();
            Ok(Expr::Literal(decode_raw_literal(tok.kind, &tok.text), pos))
        }
        _ => parse_prefix_keyword_or_symbol(s, pos),
    }
}

fn parse_prefix_keyword_or_symbol(s: &mut ParseState, pos: crate::lexer::Position) -> PResult<Expr> {
    if s.is("true") {
        s.bump();
        return Ok(Expr::Literal(Literal::Bool(true), pos));
    }
    if s.is("false") {
        s.bump();
        return Ok(Expr::Literal(Literal::Bool(false), pos));
    }
    if s.is("_") {
        s.bump();
        return Ok(Expr::Underscore(pos));
    }
    if s.is("return") {
        s.bump();
        let value = if can_start_expr(s) {
            Some(Box::new(parse_expr(s, 0)?))
        } else {
            None
        };
        return Ok(Expr::Return(value, pos));
    }
    if s.is("break") {
        s.bump();
        let value = if can_start_expr(s) {
            Some(Box::new(parse_expr(s, 0)?))
        } else {
            None
        };
        return Ok(Expr::Break(value, pos));
    }
    if s.is("continue") {
        s.bump();
        return Ok(Expr::Continue(pos));
    }
    if s.is("if") {
        return Ok(Expr::If(parse_if(s)?));
    }
    if s.is("while") {
        s.bump();
        let cond = parse_cond(s)?;
        let body = parse_block(s)?;
        return Ok(Expr::While {
            cond: Box::new(cond),
            body,
            pos,
        });
    }
    if s.is("loop") {
        s.bump();
        let body = parse_block(s)?;
        return Ok(Expr::Loop { body, pos });
    }
    if s.is("match") {
        return parse_match(s, pos);
    }
    if s.is("{") {
        let block = parse_block(s)?;
        return Ok(Expr::Block(block, pos));
    }
    if s.eat("-") {
        let inner = parse_expr(s, PREC_MUL)?;
        return Ok(Expr::Neg {
            logical: false,
            inner: Box::new(inner),
            pos,
        });
    }
    if s.eat("!") {
        let inner = parse_expr(s, PREC_MUL)?;
        return Ok(Expr::Neg {
            logical: true,
            inner: Box::new(inner),
            pos,
        });
    }
    if s.eat("*") {
        let inner = parse_expr(s, PREC_CALL)?;
        return Ok(Expr::Deref {
            inner: Box::new(inner),
            pos,
        });
    }
    if s.is("&") {
        s.bump();
        let raw = s.is("raw") && (s.peek_at(1).is("const") || s.peek_at(1).is("mut"));
        if raw {
            s.bump();
            let mutable = s.eat("mut") || !s.eat("const");
            let inner = parse_expr(s, 0)?;
            return Ok(Expr::Borrow {
                mutable,
                raw: true,
                depth: 1,
                inner: Box::new(inner),
                pos,
            });
        }
        let mutable = s.eat("mut");
        let inner = parse_expr(s, 0)?;
        return Ok(Expr::Borrow {
            mutable,
            raw: false,
            depth: 1,
            inner: Box::new(inner),
            pos,
        });
    }
    if s.eat("&&") {
        let mutable = s.eat("mut");
        let inner = parse_expr(s, 0)?;
        return Ok(Expr::Borrow {
            mutable,
            raw: false,
            depth: 2,
            inner: Box::new(inner),
            pos,
        });
    }
    if s.is("..") || s.is("..=") {
        let inclusive = s.is("..=");
        s.bump();
        let end = if can_start_expr(s) {
            Some(Box::new(parse_expr(s, PREC_RANGE)?))
        } else {
            None
        };
        return Ok(Expr::Range {
            start: None,
            end,
            inclusive,
            pos,
        });
    }
    if s.eat("(") {
        return parse_grouped_or_tuple(s, pos);
    }
    if s.eat("[") {
        return parse_array(s, pos);
    }
    if s.is_kind(TokenKind::Identifier) || s.is("::") || s.is("Self") || s.is("self") {
        return parse_path_or_struct_literal(s, pos);
    }

    Err(s.error(format!("unexpected token `{}` in expression", s.peek().text)))
}

fn can_start_expr(s: &ParseState) -> bool {
    !(s.peek().kind == TokenKind::Eof
        || s.is(";")
        || s.is("}")
        || s.is(")")
        || s.is(",")
        || s.is("]"))
}

fn parse_grouped_or_tuple(s: &mut ParseState, pos: crate::lexer::Position) -> PResult<Expr> {
    let was_restricted = s.set_restrict_struct_lit(false);
    let result = parse_grouped_or_tuple_inner(s, pos);
    s.set_restrict_struct_lit(was_restricted);
    result
}

fn parse_grouped_or_tuple_inner(s: &mut ParseState, pos: crate::lexer::Position) -> PResult<Expr> {
    if s.eat(")") {
        return Ok(Expr::Tuple(vec![], pos));
    }
    let first = parse_expr(s, 0)?;
    if s.eat(",") {
        let mut elems = vec![first];
        while !s.is(")") {
            elems.push(parse_expr(s, 0)?);
            if !s.eat(",") {
                break;
            }
        }
        s.expect(")")?;
        return Ok(Expr::Tuple(elems, pos));
    }
    s.expect(")")?;
    Ok(Expr::Grouped(Box::new(first), pos))
}

fn parse_array(s: &mut ParseState, pos: crate::lexer::Position) -> PResult<Expr> {
    let was_restricted = s.set_restrict_struct_lit(false);
    let result = parse_array_inner(s, pos);
    s.set_restrict_struct_lit(was_restricted);
    result
}

fn parse_array_inner(s: &mut ParseState, pos: crate::lexer::Position) -> PResult<Expr> {
    if s.eat("]") {
        return Ok(Expr::Array(ArrayExpr::Literal(vec![]), pos));
    }
    let first = parse_expr(s, 0)?;
    if s.eat(";") {
        let count = parse_expr(s, 0)?;
        s.expect("]")?;
        return Ok(Expr::Array(
            ArrayExpr::Repeat(Box::new(first), Box::new(count)),
            pos,
        ));
    }
    let mut elems = vec![first];
    while s.eat(",") {
        if s.is("]") {
            break;
        }
        elems.push(parse_expr(s, 0)?);
    }
    s.expect("]")?;
    Ok(Expr::Array(ArrayExpr::Literal(elems), pos))
}

fn parse_path_or_struct_literal(s: &mut ParseState, pos: crate::lexer::Position) -> PResult<Expr> {
    let path = parse_path(s)?;
    if s.is("{") && !s.restrict_struct_lit() {
        return parse_struct_literal(s, path, pos);
    }
    Ok(Expr::Path(path, pos))
}

fn parse_struct_literal(
    s: &mut ParseState,
    path: crate::ast::Path,
    pos: crate::lexer::Position,
) -> PResult<Expr> {
    s.expect("{")?;
    let mut fields = Vec::new();
    let mut base = None;
    while !s.is("}") {
        if s.eat("..") {
            base = Some(Box::new(parse_expr(s, 0)?));
            break;
        }
        let name = if s.is_kind(TokenKind::Integer) {
            FieldName::Index(s.bump().text.parse().unwrap_or(0))
        } else {
            FieldName::Named(s.expect_identifier()?)
        };
        let value = if s.eat(":") {
            Some(parse_expr(s, 0)?)
        } else {
            None
        };
        fields.push(StructLitField { name, value });
        if !s.eat(",") {
            break;
        }
    }
    s.expect("}")?;
    Ok(Expr::StructLiteral {
        path,
        fields,
        base,
        pos,
    })
}

pub fn parse_block(s: &mut ParseState) -> PResult<Block> {
    let pos = s.pos_mark();
    s.expect("{")?;
    let mut stmts = Vec::new();
    while !s.is("}") {
        if s.at_eof() {
            return Err(s.eof_error("block"));
        }
        stmts.push(super::stmt::parse_stmt(s)?);
    }
    s.expect("}")?;
    Ok(Block { stmts, pos })
}

fn parse_if(s: &mut ParseState) -> PResult<IfExpr> {
    let pos = s.pos_mark();
    s.expect("if")?;
    let cond = parse_cond(s)?;
    let then_branch = parse_block(s)?;
    let else_branch = if s.eat("else") {
        if s.is("if") {
            Some(Box::new(ElseBranch::If(parse_if(s)?)))
        } else {
            Some(Box::new(ElseBranch::Block(parse_block(s)?)))
        }
    } else {
        None
    };
    Ok(IfExpr {
        cond: Box::new(cond),
        then_branch,
        else_branch,
        pos,
    })
}

fn parse_match(s: &mut ParseState, pos: crate::lexer::Position) -> PResult<Expr> {
    s.expect("match")?;
    let was_restricted = s.set_restrict_struct_lit(true);
    let scrutinee = parse_expr(s, 0);
    s.set_restrict_struct_lit(was_restricted);
    let scrutinee = scrutinee?;
    s.expect("{")?;
    let mut arms = Vec::new();
    while !s.is("}") {
        let pattern = super::pattern::parse_pattern(s)?;
        let guard = if s.eat("if") {
            Some(parse_expr(s, 0)?)
        } else {
            None
        };
        s.expect("=>")?;
        let body = parse_expr(s, 0)?;
        arms.push(MatchArm {
            pattern,
            guard,
            body,
        });
        // A block-bodied arm doesn't require a trailing comma.
        s.eat(",");
    }
    s.expect("}")?;
    Ok(Expr::Match {
        scrutinee: Box::new(scrutinee),
        arms,
        pos,
    })
}

/// §4.1.4: a condition is either a let-chain or a restricted expression (no top-level
/// struct-literal, assignment, lazy-boolean, or range).
pub fn parse_cond(s: &mut ParseState) -> PResult<Cond> {
    if s.is("let") {
        let mut arms = vec![parse_let_chain_arm(s)?];
        while s.eat("&&") {
            arms.push(parse_let_chain_arm(s)?);
        }
        return Ok(Cond::LetChain(arms));
    }
    let was_restricted = s.set_restrict_struct_lit(true);
    let e = parse_expr(s, 0);
    s.set_restrict_struct_lit(was_restricted);
    let e = e?;
    if e.forbidden_in_condition() {
        return Err(s.error(
            "struct literals, assignments, lazy-booleans, and ranges are not allowed directly in a condition",
        ));
    }
    Ok(Cond::Expr(e))
}

fn parse_let_chain_arm(s: &mut ParseState) -> PResult<LetChainArm> {
    s.expect("let")?;
    let pattern = super::pattern::parse_pattern(s)?;
    s.expect("=")?;
    let was_restricted = s.set_restrict_struct_lit(true);
    // Stop before the chain's own `&&` separator (§4.1.4); see state.rs for precedence.
    let scrutinee = parse_expr(s, PREC_AND);
    s.set_restrict_struct_lit(was_restricted);
    Ok(LetChainArm {
        pattern,
        scrutinee: scrutinee?,
    })
}
