//! # ferrite
//!
//! A single-pass front-end for a statically-typed, Rust-like source language: lex, parse,
//! check, then lower straight to textual LLVM IR. There is no intermediate high-level IR —
//! the checker walks the same tree the parser produced, and the generator walks it again.

pub mod ast;
pub mod checker;
pub mod codegen;
pub mod diagnostics;
pub mod lexer;
pub mod parser;

use diagnostics::Diagnostic;

/// Runs the full pipeline over `src`, returning the generated IR module text or the first
/// diagnostic that stopped it. Parse and generation failures carry a single `Diagnostic`;
/// a failed check has already logged every error it found and returns a plain message here.
pub fn compile(src: &str) -> Result<String, Diagnostic> {
    let program = parser::parse(src)?;

    let mut checker = checker::Checker::new(src);
    if !checker.check(&program) {
        return Err(Diagnostic::new("compilation failed"));
    }

    codegen::generate(src, &program)
}
