use crate::ast::{Expr, Literal, Ty};

/// Canonical string form of a type (§4.2.5). Structural equality between two `Ty` trees is
/// defined as equality of this string, not derived `PartialEq` on the tree.
pub fn canonical(ty: &Ty) -> String {
    match ty {
        Ty::Path(p) => p.join(),
        Ty::Reference { mutable, inner } => {
            format!("&{}{}", if *mutable { "mut " } else { "" }, canonical(inner))
        }
        Ty::Array { elem, len } => format!("[{}; {}]", canonical(elem), array_len_literal(len)),
        Ty::Slice(inner) => format!("[{}]", canonical(inner)),
        Ty::Tuple(elems) => format!(
            "({})",
            elems.iter().map(canonical).collect::<Vec<_>>().join(", ")
        ),
        Ty::Paren(inner) => format!("({})", canonical(inner)),
        Ty::Never => "!".to_string(),
        Ty::Inferred => "_".to_string(),
        Ty::QualifiedPath { ty, segments, .. } => {
            format!("<{}>::{}", canonical(ty), segments.join("::"))
        }
        Ty::Fn { params, ret } => format!(
            "fn({}) -> {}",
            params.iter().map(canonical).collect::<Vec<_>>().join(", "),
            canonical(ret)
        ),
    }
}

/// The array-length `N` extracted from an integer-literal sub-expression, or `-1` if the
/// length isn't a literal the checker can read directly (§4.2.5).
pub fn array_len_literal(expr: &Expr) -> i64 {
    match expr {
        Expr::Literal(Literal::Int(v, _), _) => *v as i64,
        Expr::Grouped(inner, _) => array_len_literal(inner),
        _ => -1,
    }
}

const USIZE_I32_PAIR: [&str; 2] = ["usize", "i32"];

/// Structural equality with the `usize`/`i32` relaxation named in §4.2.5.
pub fn compatible(a: &Ty, b: &Ty) -> bool {
    let ca = canonical(a);
    let cb = canonical(b);
    if ca == cb {
        return true;
    }
    USIZE_I32_PAIR.contains(&ca.as_str()) && USIZE_I32_PAIR.contains(&cb.as_str())
}

pub fn is_bool(ty: &Ty) -> bool {
    canonical(ty) == "bool"
}
