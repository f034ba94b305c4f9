//! Integration tests for the complete lex -> parse -> check -> lower pipeline.
//!
//! These exercise `ferrite::compile` end to end and assert on fragments of the emitted
//! LLVM IR text, since the generator's output is otherwise only consumable by an external
//! LLVM toolchain this crate doesn't invoke.

#[test]
fn hello_number() {
    let src = "fn main() { printlnInt(42); }";
    let ir = ferrite::compile(src).expect("expected successful compilation");

    assert!(ir.contains("call void @printlnInt(i32 42)"));
    assert!(ir.contains("ret i32 0"));
}

#[test]
fn return_type_mismatch_fails_checking() {
    let src = "fn f() -> i32 { true }";
    assert!(ferrite::compile(src).is_err());
}

#[test]
fn array_length_mismatch_fails_checking() {
    let src = "fn main() { let a: [i32; 3] = [1, 2]; }";
    assert!(ferrite::compile(src).is_err());
}

#[test]
fn method_autoref_spills_receiver_and_dispatches() {
    let src = r#"
        struct P { x: i32 }
        impl P {
            fn get(&self) -> i32 { self.x }
        }
        fn main() {
            let p = P { x: 7 };
            printlnInt(p.get());
        }
    "#;
    let ir = ferrite::compile(src).expect("expected successful compilation");

    assert!(ir.contains("%P = type"));
    assert!(ir.contains("call i32 @P_get("));
    assert!(ir.contains("getelementptr"));
}

#[test]
fn while_loop_with_continue_has_three_labels() {
    let src = r#"
        fn main() {
            let mut i: i32 = 0;
            while i < 3 {
                i = i + 1;
                continue;
            }
            printlnInt(i);
        }
    "#;
    let ir = ferrite::compile(src).expect("expected successful compilation");

    assert!(ir.contains("while.cond"));
    assert!(ir.contains("while.body"));
    assert!(ir.contains("while.end"));
    assert!(ir.contains("br i1"));
    // labels are `L`-prefixed (`new_label` formats them as `L<prefix><n>`), so `continue`
    // branches to `%Lwhile.cond<n>`, not a bare `%while.cond`.
    assert!(ir.matches("br label %Lwhile.cond").count() >= 1);
}

#[test]
fn u32_arithmetic_widens_to_i64() {
    let src = r#"
        fn main() {
            let x: u32 = 3000000000;
            let y: u32 = x + 100;
            printlnInt(y as i32);
        }
    "#;
    let ir = ferrite::compile(src).expect("expected successful compilation");

    assert!(ir.contains("alloca i64"));
    assert!(ir.contains("add i64"));
    assert!(ir.contains("trunc i64"));
}

#[test]
fn scope_discipline_rejects_leaked_inner_binding() {
    let src = r#"
        fn main() {
            if true {
                let leaked: i32 = 1;
            }
            printlnInt(leaked);
        }
    "#;
    assert!(ferrite::compile(src).is_err());
}

#[test]
fn mutability_discipline_rejects_assignment_to_immutable_binding() {
    let src = r#"
        fn main() {
            let x: i32 = 1;
            x = 2;
        }
    "#;
    assert!(ferrite::compile(src).is_err());
}

#[test]
fn struct_literal_with_update_syntax_copies_base_fields() {
    let src = r#"
        struct P { x: i32, y: i32 }
        fn main() {
            let a = P { x: 1, y: 2 };
            let b = P { x: 9, ..a };
            printlnInt(b.y);
        }
    "#;
    let ir = ferrite::compile(src).expect("expected successful compilation");

    assert!(ir.contains("%P = type"));
    assert!(ir.contains("getelementptr"));
}

#[test]
fn undeclared_identifier_fails_checking() {
    let src = "fn main() { printlnInt(nope); }";
    assert!(ferrite::compile(src).is_err());
}
