use super::state::{PResult, ParseState};
use super::ty::parse_path;
use crate::ast::{FieldPattern, Literal, Pattern, RangePatternKind};
use crate::lexer::TokenKind;

/// `Pattern → PatternNoTopAlt (| PatternNoTopAlt)*` (§4.1.3): `|` is only ever consumed
/// here, never inside `parse_pattern_no_alt`.
pub fn parse_pattern(s: &mut ParseState) -> PResult<Pattern> {
    s.eat("|");
    let pos = s.pos_mark();
    let first = parse_pattern_no_alt(s)?;
    if !s.is("|") {
        return Ok(first);
    }
    let mut alts = vec![first];
    while s.eat("|") {
        alts.push(parse_pattern_no_alt(s)?);
    }
    Ok(Pattern::Or(alts, pos))
}

fn literal_token(s: &mut ParseState) -> Option<Literal> {
    let tok = s.peek().clone();
    let lit = match tok.kind {
        TokenKind::Integer => Some(super::expr::decode_int_literal(&tok.text)),
        TokenKind::Float => Some(super::expr::decode_float_literal(&tok.text)),
        TokenKind::Char => Some(Literal::Char(super::expr::decode_char_literal(&tok.text))),
        TokenKind::Str => Some(Literal::Str(super::expr::decode_str_literal(&tok.text))),
        _ if tok.is("true") => Some(Literal::Bool(true)),
        _ if tok.is("false") => Some(Literal::Bool(false)),
        _ => None,
    };
    if lit.is_some() {
        s.bump();
    }
    lit
}

fn parse_range_tail(s: &mut ParseState, start: Option<Pattern>, pos: crate::lexer::Position) -> PResult<Pattern> {
    let inclusive = if s.eat("..=") {
        true
    } else if s.eat("...") {
        true
    } else {
        s.expect("..")?;
        false
    };
    let end = if can_start_pattern(s) {
        Some(Box::new(parse_pattern_no_alt(s)?))
    } else {
        None
    };
    Ok(Pattern::Range {
        start: start.map(Box::new),
        end,
        kind: if inclusive {
            RangePatternKind::Inclusive
        } else {
            RangePatternKind::Exclusive
        },
        pos,
    })
}

fn can_start_pattern(s: &ParseState) -> bool {
    !(s.peek().kind == TokenKind::Eof
        || s.is(",")
        || s.is(")")
        || s.is("]")
        || s.is("}")
        || s.is("=")
        || s.is("if"))
}

pub fn parse_pattern_no_alt(s: &mut ParseState) -> PResult<Pattern> {
    let pos = s.pos_mark();

    if s.is("..") || s.is("..=") || s.is("...") {
        return parse_range_tail(s, None, pos);
    }

    if s.eat("_") {
        return Ok(Pattern::Wildcard(pos));
    }

    if s.is("-") || s.peek().kind.is_literal() || s.is("true") || s.is("false") {
        let negated = s.eat("-");
        if let Some(lit) = literal_token(s) {
            let pat = Pattern::Literal { negated, value: lit, pos };
            if s.is("..") || s.is("..=") || s.is("...") {
                return parse_range_tail(s, Some(pat), pos);
            }
            return Ok(pat);
        }
        return Err(s.error("expected a literal pattern"));
    }

    if s.eat("&") {
        let mutable = s.eat("mut");
        let inner = parse_pattern_no_alt(s)?;
        return Ok(Pattern::Reference {
            double: false,
            mutable,
            inner: Box::new(inner),
            pos,
        });
    }
    if s.eat("&&") {
        let mutable = s.eat("mut");
        let inner = parse_pattern_no_alt(s)?;
        return Ok(Pattern::Reference {
            double: true,
            mutable,
            inner: Box::new(inner),
            pos,
        });
    }

    if s.eat("(") {
        if s.eat(")") {
            return Ok(Pattern::Tuple { elems: vec![], pos });
        }
        let first = parse_pattern(s)?;
        if s.eat(",") {
            let mut elems = vec![first];
            while !s.is(")") {
                elems.push(parse_pattern(s)?);
                if !s.eat(",") {
                    break;
                }
            }
            s.expect(")")?;
            return Ok(Pattern::Tuple { elems, pos });
        }
        s.expect(")")?;
        return Ok(Pattern::Paren(Box::new(first), pos));
    }

    if s.eat("[") {
        let mut elems = Vec::new();
        while !s.is("]") {
            elems.push(parse_pattern(s)?);
            if !s.eat(",") {
                break;
            }
        }
        s.expect("]")?;
        return Ok(Pattern::Slice { elems, pos });
    }

    if s.is("ref") || s.is("mut") {
        let by_ref = s.eat("ref");
        let mutable = s.eat("mut");
        let name = s.expect_identifier()?;
        let sub = if s.eat("@") {
            Some(Box::new(parse_pattern_no_alt(s)?))
        } else {
            None
        };
        return Ok(Pattern::Ident {
            by_ref,
            mutable,
            name,
            sub,
            pos,
        });
    }

    if s.is_kind(TokenKind::Identifier) {
        let path = parse_path(s)?;
        if path.segments.len() == 1 && !path.leading_colon {
            if s.eat("(") {
                let mut elems = Vec::new();
                while !s.is(")") {
                    elems.push(parse_pattern(s)?);
                    if !s.eat(",") {
                        break;
                    }
                }
                s.expect(")")?;
                return Ok(Pattern::TupleStruct { path, elems, pos });
            }
            if s.is("{") {
                return parse_struct_pattern_body(s, path, pos);
            }
            if s.eat("@") {
                let sub = parse_pattern_no_alt(s)?;
                return Ok(Pattern::Ident {
                    by_ref: false,
                    mutable: false,
                    name: path.segments[0].clone(),
                    sub: Some(Box::new(sub)),
                    pos,
                });
            }
            // Bare lowercase identifier with no path/struct/tuple continuation: a binding.
            return Ok(Pattern::Ident {
                by_ref: false,
                mutable: false,
                name: path.segments[0].clone(),
                sub: None,
                pos,
            });
        }
        if s.eat("(") {
            let mut elems = Vec::new();
            while !s.is(")") {
                elems.push(parse_pattern(s)?);
                if !s.eat(",") {
                    break;
                }
            }
            s.expect(")")?;
            return Ok(Pattern::TupleStruct { path, elems, pos });
        }
        if s.is("{") {
            return parse_struct_pattern_body(s, path, pos);
        }
        return Ok(Pattern::Path(path, pos));
    }

    Err(s.error(format!("unexpected token `{}` in pattern", s.peek().text)))
}

fn parse_struct_pattern_body(
    s: &mut ParseState,
    path: crate::ast::Path,
    pos: crate::lexer::Position,
) -> PResult<Pattern> {
    s.expect("{")?;
    let mut fields = Vec::new();
    let mut has_rest = false;
    while !s.is("}") {
        if s.eat("..") {
            has_rest = true;
            break;
        }
        let field_pos_shorthand_name = s.expect_identifier()?;
        if s.eat(":") {
            let pat = parse_pattern(s)?;
            fields.push(FieldPattern {
                name: field_pos_shorthand_name,
                pattern: pat,
                shorthand: false,
            });
        } else {
            fields.push(FieldPattern {
                name: field_pos_shorthand_name.clone(),
                pattern: Pattern::Ident {
                    by_ref: false,
                    mutable: false,
                    name: field_pos_shorthand_name,
                    sub: None,
                    pos,
                },
                shorthand: true,
            });
        }
        if !s.eat(",") {
            break;
        }
    }
    s.expect("}")?;
    Ok(Pattern::Struct {
        path,
        fields,
        has_rest,
        pos,
    })
}
