//! Injected built-in runtime (§4.3.9), carried over verbatim from the reference's IR
//! generator: the four format-string globals and the `print`/`println`/`printInt`/
//! `printlnInt`/`getString`/`getInt`/`builtin_memset`/`builtin_memcpy` definitions, plus the
//! trailing `declare`s for the C-library functions they lower to.

pub const BUILTIN_IR: &str = concat!(
    "@.str = private unnamed_addr constant [3 x i8] c\"%s\\00\", align 1\n",
    "@.str.1 = private unnamed_addr constant [4 x i8] c\"%s\\0A\\00\", align 1\n",
    "@.str.2 = private unnamed_addr constant [3 x i8] c\"%d\\00\", align 1\n",
    "@.str.3 = private unnamed_addr constant [4 x i8] c\"%d\\0A\\00\", align 1\n",
    "\n",
    "define dso_local void @print(i8* noundef %arg.s) {\n",
    "  %s.addr = alloca i8*, align 8\n",
    "  store i8* %arg.s, i8** %s.addr, align 8\n",
    "  %s.val = load i8*, i8** %s.addr, align 8\n",
    "  call i32 (i8*, ...) @printf(i8* noundef getelementptr inbounds ([3 x i8], [3 x i8]* @.str, i64 0, i64 0), i8* noundef %s.val)\n",
    "  ret void\n",
    "}\n",
    "\n",
    "define dso_local void @println(i8* noundef %arg.s) {\n",
    "  %s.addr = alloca i8*, align 8\n",
    "  store i8* %arg.s, i8** %s.addr, align 8\n",
    "  %s.val = load i8*, i8** %s.addr, align 8\n",
    "  call i32 (i8*, ...) @printf(i8* noundef getelementptr inbounds ([4 x i8], [4 x i8]* @.str.1, i64 0, i64 0), i8* noundef %s.val)\n",
    "  ret void\n",
    "}\n",
    "\n",
    "define dso_local void @printInt(i32 noundef %arg.n) {\n",
    "  %n.addr = alloca i32, align 4\n",
    "  store i32 %arg.n, i32* %n.addr, align 4\n",
    "  %n.val = load i32, i32* %n.addr, align 4\n",
    "  call i32 (i8*, ...) @printf(i8* noundef getelementptr inbounds ([3 x i8], [3 x i8]* @.str.2, i64 0, i64 0), i32 noundef %n.val)\n",
    "  ret void\n",
    "}\n",
    "\n",
    "define dso_local void @printlnInt(i32 noundef %arg.n) {\n",
    "  %n.addr = alloca i32, align 4\n",
    "  store i32 %arg.n, i32* %n.addr, align 4\n",
    "  %n.val = load i32, i32* %n.addr, align 4\n",
    "  call i32 (i8*, ...) @printf(i8* noundef getelementptr inbounds ([4 x i8], [4 x i8]* @.str.3, i64 0, i64 0), i32 noundef %n.val)\n",
    "  ret void\n",
    "}\n",
    "\n",
    "define dso_local i8* @getString() {\n",
    "  %buf.addr = alloca i8*, align 8\n",
    "  %buf = call i8* @malloc(i32 noundef 256)\n",
    "  store i8* %buf, i8** %buf.addr, align 8\n",
    "  %buf.val = load i8*, i8** %buf.addr, align 8\n",
    "  call i32 (i8*, ...) @scanf(i8* noundef getelementptr inbounds ([3 x i8], [3 x i8]* @.str, i64 0, i64 0), i8* noundef %buf.val)\n",
    "  %buf.ret = load i8*, i8** %buf.addr, align 8\n",
    "  ret i8* %buf.ret\n",
    "}\n",
    "\n",
    "define dso_local i32 @getInt() {\n",
    "  %n.addr = alloca i32, align 4\n",
    "  call i32 (i8*, ...) @scanf(i8* noundef getelementptr inbounds ([3 x i8], [3 x i8]* @.str.2, i64 0, i64 0), i32* noundef %n.addr)\n",
    "  %n.val = load i32, i32* %n.addr, align 4\n",
    "  ret i32 %n.val\n",
    "}\n",
    "\n",
    "define dso_local i8* @builtin_memset(i8* noundef %arg.dst, i32 noundef %arg.ch, i32 noundef %arg.len) {\n",
    "  %dst.addr = alloca i8*, align 8\n",
    "  %ch.addr = alloca i32, align 4\n",
    "  %len.addr = alloca i32, align 4\n",
    "  store i8* %arg.dst, i8** %dst.addr, align 8\n",
    "  store i32 %arg.ch, i32* %ch.addr, align 4\n",
    "  store i32 %arg.len, i32* %len.addr, align 4\n",
    "  %dst.val = load i8*, i8** %dst.addr, align 8\n",
    "  %ch.val = load i32, i32* %ch.addr, align 4\n",
    "  %len.val = load i32, i32* %len.addr, align 4\n",
    "  %res = call i8* @memset(i8* noundef %dst.val, i32 noundef %ch.val, i32 noundef %len.val)\n",
    "  ret i8* %res\n",
    "}\n",
    "\n",
    "define dso_local i8* @builtin_memcpy(i8* noundef %arg.dst, i8* noundef %arg.src, i32 noundef %arg.len) {\n",
    "  %dst.addr = alloca i8*, align 8\n",
    "  %src.addr = alloca i8*, align 8\n",
    "  %len.addr = alloca i32, align 4\n",
    "  store i8* %arg.dst, i8** %dst.addr, align 8\n",
    "  store i8* %arg.src, i8** %src.addr, align 8\n",
    "  store i32 %arg.len, i32* %len.addr, align 4\n",
    "  %dst.val = load i8*, i8** %dst.addr, align 8\n",
    "  %src.val = load i8*, i8** %src.addr, align 8\n",
    "  %len.val = load i32, i32* %len.addr, align 4\n",
    "  %res = call i8* @memcpy(i8* noundef %dst.val, i8* noundef %src.val, i32 noundef %len.val)\n",
    "  ret i8* %res\n",
    "}\n",
    "\n",
    "declare i32 @scanf(i8*, ...)\n",
    "declare i32 @printf(i8*, ...)\n",
    "declare i8* @malloc(i32 noundef)\n",
    "declare i8* @memset(i8* noundef, i32 noundef, i32 noundef)\n",
    "declare i8* @memcpy(i8* noundef, i8* noundef, i32 noundef)\n",
    "declare void @exit(i32 noundef)\n",
    "\n",
);

/// Built-ins seeded into the parameter/return-type tables (§4.3.9) so ordinary call-site
/// lowering treats them like any user function.
pub fn signature(name: &str) -> Option<(Vec<&'static str>, &'static str)> {
    match name {
        "print" => Some((vec!["i8*"], "void")),
        "println" => Some((vec!["i8*"], "void")),
        "printInt" => Some((vec!["i32"], "void")),
        "printlnInt" => Some((vec!["i32"], "void")),
        "getString" => Some((vec![], "i8*")),
        "getInt" => Some((vec![], "i32")),
        "builtin_memset" => Some((vec!["i8*", "i32", "i32"], "i8*")),
        "builtin_memcpy" => Some((vec!["i8*", "i8*", "i32"], "i8*")),
        "exit" => Some((vec!["i32"], "void")),
        _ => None,
    }
}
