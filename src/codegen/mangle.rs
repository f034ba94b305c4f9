//! Symbol-name mangling (§4.3.2).

fn is_plain_llvm_ident(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

fn quoted(symbol: &str) -> String {
    if is_plain_llvm_ident(symbol) {
        format!("@{symbol}")
    } else {
        format!("@\"{symbol}\"")
    }
}

/// A plain function `f` emits as `@f`.
pub fn function(name: &str) -> String {
    quoted(name)
}

/// A method `m` inside `impl T { .. }` emits as `@T_m`.
pub fn method(impl_type: &str, name: &str) -> String {
    quoted(&format!("{impl_type}_{name}"))
}

/// Path expressions containing `::` are joined with `_` for symbol construction.
pub fn path(segments: &[String]) -> String {
    quoted(&segments.join("_"))
}
