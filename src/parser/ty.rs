use super::state::{PResult, ParseState};
use crate::ast::{Path, Ty};
use crate::lexer::TokenKind;

/// Consumes a balanced `<...>` generic-argument list without recording its contents.
/// Generics are never instantiated (non-goal), so the parser only needs to stay in sync
/// with the token stream past them.
fn skip_generic_args(s: &mut ParseState) {
    if !s.is("<") {
        return;
    }
    let mut depth = 0i32;
    loop {
        if s.is("<") {
            depth += 1;
            s.bump();
        } else if s.is(">") {
            depth -= 1;
            s.bump();
            if depth <= 0 {
                return;
            }
        } else if s.is(">>") {
            depth -= 2;
            s.bump();
            if depth <= 0 {
                return;
            }
        } else if s.at_eof() {
            return;
        } else {
            s.bump();
        }
    }
}

pub fn parse_path(s: &mut ParseState) -> PResult<Path> {
    let leading_colon = s.eat("::");
    let mut segments = vec![s.expect_identifier()?];
    skip_generic_args(s);
    while s.is("::") {
        s.bump();
        segments.push(s.expect_identifier()?);
        skip_generic_args(s);
    }
    Ok(Path {
        leading_colon,
        segments,
    })
}

pub fn parse_type(s: &mut ParseState) -> PResult<Ty> {
    if s.eat("&") {
        let mutable = s.eat("mut");
        let inner = parse_type(s)?;
        return Ok(Ty::Reference {
            mutable,
            inner: Box::new(inner),
        });
    }
    if s.eat("!") {
        return Ok(Ty::Never);
    }
    if s.is("_") {
        s.bump();
        return Ok(Ty::Inferred);
    }
    if s.eat("(") {
        if s.eat(")") {
            return Ok(Ty::unit());
        }
        let first = parse_type(s)?;
        if s.eat(",") {
            let mut elems = vec![first];
            while !s.is(")") {
                elems.push(parse_type(s)?);
                if !s.eat(",") {
                    break;
                }
            }
            s.expect(")")?;
            return Ok(Ty::Tuple(elems));
        }
        s.expect(")")?;
        return Ok(Ty::Paren(Box::new(first)));
    }
    if s.eat("[") {
        let elem = parse_type(s)?;
        if s.eat(";") {
            let len = super::expr::parse_expr(s, 0)?;
            s.expect("]")?;
            return Ok(Ty::Array {
                elem: Box::new(elem),
                len: Box::new(len),
            });
        }
        s.expect("]")?;
        return Ok(Ty::Slice(Box::new(elem)));
    }

    if s.is_kind(TokenKind::Identifier) && s.peek().text == "Fn" && s.peek_at(1).is("(") {
        s.bump();
        s.bump();
        let mut params = Vec::new();
        while !s.is(")") {
            params.push(parse_type(s)?);
            if !s.eat(",") {
                break;
            }
        }
        s.expect(")")?;
        let ret = if s.eat("->") {
            parse_type(s)?
        } else {
            Ty::unit()
        };
        return Ok(Ty::Fn {
            params,
            ret: Box::new(ret),
        });
    }

    if s.eat("<") {
        let ty = parse_type(s)?;
        let as_path = if s.eat("as") {
            Some(parse_path(s)?)
        } else {
            None
        };
        s.expect(">")?;
        s.expect("::")?;
        let mut segments = vec![s.expect_identifier()?];
        while s.is("::") {
            s.bump();
            segments.push(s.expect_identifier()?);
        }
        return Ok(Ty::QualifiedPath {
            ty: Box::new(ty),
            as_path,
            segments,
        });
    }

    let path = parse_path(s)?;
    Ok(Ty::Path(path))
}
