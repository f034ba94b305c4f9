use super::expr::parse_expr;
use super::pattern::parse_pattern_no_alt;
use super::state::{PResult, ParseState};
use super::ty::{parse_path, parse_type};
use crate::ast::{
    AssocItem, ConstantItem, EnumVariant, EnumVariantKind, Enumeration, FieldDef, FnQualifiers,
    Function, InherentImpl, Item, Module, Param, SelfParam, StructStruct, Trait, TraitImpl,
    TupleStruct,
};

const ITEM_KEYWORDS: &[&str] = &["fn", "struct", "enum", "trait", "impl", "const", "mod"];

pub fn is_item_start(s: &ParseState) -> bool {
    let mut offset = 0;
    if s.peek_at(offset).is("pub") {
        offset += 1;
    }
    for _ in 0..3 {
        if ["const", "async", "unsafe"].contains(&s.peek_at(offset).text.as_str()) {
            offset += 1;
        } else {
            break;
        }
    }
    let tok = s.peek_at(offset);
    ITEM_KEYWORDS.contains(&tok.text.as_str())
}

pub fn parse_item(s: &mut ParseState) -> PResult<Item> {
    s.eat("pub");

    if s.is("fn") || is_fn_qualifier_ahead(s) {
        return Ok(Item::Function(parse_function(s)?));
    }
    if s.is("struct") {
        return parse_struct(s);
    }
    if s.is("enum") {
        return Ok(Item::Enumeration(parse_enum(s)?));
    }
    if s.is("trait") {
        return Ok(Item::Trait(parse_trait(s)?));
    }
    if s.is("impl") {
        return parse_impl(s);
    }
    if s.is("const") {
        return Ok(Item::Constant(parse_constant(s)?));
    }
    if s.is("mod") {
        return Ok(Item::Module(parse_module(s)?));
    }

    Err(s.error(format!("expected an item, found `{}`", s.peek().text)))
}

fn is_fn_qualifier_ahead(s: &ParseState) -> bool {
    let mut offset = 0;
    while ["const", "async", "unsafe"].contains(&s.peek_at(offset).text.as_str()) {
        offset += 1;
    }
    offset > 0 && s.peek_at(offset).is("fn")
}

fn parse_fn_qualifiers(s: &mut ParseState) -> FnQualifiers {
    let mut q = FnQualifiers::default();
    loop {
        if s.eat("const") {
            q.is_const = true;
        } else if s.eat("async") {
            q.is_async = true;
        } else if s.eat("unsafe") {
            q.is_unsafe = true;
        } else {
            break;
        }
    }
    q
}

fn parse_function(s: &mut ParseState) -> PResult<Function> {
    let pos = s.pos_mark();
    let qualifiers = parse_fn_qualifiers(s);
    s.expect("fn")?;
    let name = s.expect_identifier()?;
    s.expect("(")?;

    let mut self_param = None;
    let mut params = Vec::new();
    if !s.is(")") {
        if let Some(sp) = try_parse_self_param(s) {
            self_param = Some(sp);
            s.eat(",");
        }
        while !s.is(")") {
            let pattern = parse_pattern_no_alt(s)?;
            s.expect(":")?;
            let ty = parse_type(s)?;
            params.push(Param { pattern, ty });
            if !s.eat(",") {
                break;
            }
        }
    }
    s.expect(")")?;

    let ret = if s.eat("->") {
        parse_type(s)?
    } else {
        crate::ast::Ty::unit()
    };

    let body = if s.is("{") {
        Some(super::expr::parse_block(s)?)
    } else {
        s.expect(";")?;
        None
    };

    Ok(Function {
        name,
        qualifiers,
        self_param,
        params,
        ret,
        body,
        pos,
    })
}

fn try_parse_self_param(s: &mut ParseState) -> Option<SelfParam> {
    let save = s.save();
    let pos = s.pos_mark();
    let by_ref = s.eat("&");
    let mutable = s.eat("mut");
    if s.is("self") {
        s.bump();
        Some(SelfParam {
            by_ref,
            mutable,
            pos,
        })
    } else {
        s.restore(save);
        None
    }
}

fn parse_struct(s: &mut ParseState) -> PResult<Item> {
    let pos = s.pos_mark();
    s.expect("struct")?;
    let name = s.expect_identifier()?;

    if s.eat(";") {
        return Ok(Item::UnitStruct { name, pos });
    }

    if s.eat("(") {
        let mut fields = Vec::new();
        while !s.is(")") {
            fields.push(parse_type(s)?);
            if !s.eat(",") {
                break;
            }
        }
        s.expect(")")?;
        s.expect(";")?;
        return Ok(Item::TupleStruct(TupleStruct { name, fields, pos }));
    }

    s.expect("{")?;
    let mut fields = Vec::new();
    while !s.is("}") {
        let fpos = s.pos_mark();
        s.eat("pub");
        let fname = s.expect_identifier()?;
        s.expect(":")?;
        let ty = parse_type(s)?;
        fields.push(FieldDef {
            name: fname,
            ty,
            pos: fpos,
        });
        if !s.eat(",") {
            break;
        }
    }
    s.expect("}")?;
    Ok(Item::StructStruct(StructStruct { name, fields, pos }))
}

fn parse_enum(s: &mut ParseState) -> PResult<Enumeration> {
    let pos = s.pos_mark();
    s.expect("enum")?;
    let name = s.expect_identifier()?;
    s.expect("{")?;
    let mut variants = Vec::new();
    while !s.is("}") {
        variants.push(parse_enum_variant(s)?);
        if !s.eat(",") {
            break;
        }
    }
    s.expect("}")?;
    Ok(Enumeration {
        name,
        variants,
        pos,
    })
}

fn parse_enum_variant(s: &mut ParseState) -> PResult<EnumVariant> {
    let pos = s.pos_mark();
    let name = s.expect_identifier()?;
    let kind = if s.eat("(") {
        let mut fields = Vec::new();
        while !s.is(")") {
            fields.push(parse_type(s)?);
            if !s.eat(",") {
                break;
            }
        }
        s.expect(")")?;
        EnumVariantKind::Tuple(fields)
    } else if s.eat("{") {
        let mut fields = Vec::new();
        while !s.is("}") {
            let fpos = s.pos_mark();
            let fname = s.expect_identifier()?;
            s.expect(":")?;
            let ty = parse_type(s)?;
            fields.push(FieldDef {
                name: fname,
                ty,
                pos: fpos,
            });
            if !s.eat(",") {
                break;
            }
        }
        s.expect("}")?;
        EnumVariantKind::Struct(fields)
    } else {
        EnumVariantKind::Unit
    };
    let discriminant = if s.eat("=") {
        Some(parse_expr(s, 0)?)
    } else {
        None
    };
    Ok(EnumVariant {
        name,
        kind,
        discriminant,
        pos,
    })
}

fn parse_assoc_items(s: &mut ParseState) -> PResult<Vec<AssocItem>> {
    s.expect("{")?;
    let mut items = Vec::new();
    while !s.is("}") {
        s.eat("pub");
        let pos = s.pos_mark();
        if s.is("type") {
            s.bump();
            let name = s.expect_identifier()?;
            s.eat(";");
            items.push(AssocItem::Type { name, pos });
        } else if s.is("const") && !is_fn_qualifier_ahead(s) {
            items.push(AssocItem::Constant(parse_constant(s)?));
        } else {
            items.push(AssocItem::Function(parse_function(s)?));
        }
    }
    s.expect("}")?;
    Ok(items)
}

fn parse_trait(s: &mut ParseState) -> PResult<Trait> {
    let pos = s.pos_mark();
    s.expect("trait")?;
    let name = s.expect_identifier()?;
    if s.eat(":") {
        parse_path(s)?;
        while s.eat("+") {
            parse_path(s)?;
        }
    }
    let items = parse_assoc_items(s)?;
    Ok(Trait { name, items, pos })
}

fn parse_impl(s: &mut ParseState) -> PResult<Item> {
    let pos = s.pos_mark();
    s.expect("impl")?;
    let save = s.save();
    let first = parse_type(s)?;
    if s.eat("for") {
        let self_ty = parse_type(s)?;
        let trait_path = match first {
            crate::ast::Ty::Path(p) => p,
            _ => {
                s.restore(save);
                return Err(s.error("trait in `impl Trait for Type` must be a path"));
            }
        };
        let items = parse_assoc_items(s)?;
        return Ok(Item::TraitImpl(TraitImpl {
            trait_path,
            self_ty,
            items,
            pos,
        }));
    }
    let items = parse_assoc_items(s)?;
    Ok(Item::InherentImpl(InherentImpl {
        self_ty: first,
        items,
        pos,
    }))
}

fn parse_constant(s: &mut ParseState) -> PResult<ConstantItem> {
    let pos = s.pos_mark();
    s.expect("const")?;
    let name = s.expect_identifier()?;
    s.expect(":")?;
    let ty = parse_type(s)?;
    s.expect("=")?;
    let value = parse_expr(s, 0)?;
    s.expect(";")?;
    Ok(ConstantItem {
        name,
        ty,
        value,
        pos,
    })
}

fn parse_module(s: &mut ParseState) -> PResult<Module> {
    let pos = s.pos_mark();
    s.expect("mod")?;
    let name = s.expect_identifier()?;
    s.expect("{")?;
    let mut items = Vec::new();
    while !s.is("}") {
        items.push(parse_item(s)?);
    }
    s.expect("}")?;
    Ok(Module { name, items, pos })
}
