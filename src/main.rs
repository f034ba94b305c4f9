//! # ferritec
//!
//! The command-line front-end. Reads source from stdin, runs it through lexing, parsing,
//! checking, and IR generation, and prints the resulting LLVM IR to stdout.
extern crate ferrite;

use std::io::{self, Read, Write};

use log::error;

fn main() {
    simple_logger::init_with_level(log::Level::Info).unwrap();

    let mut src = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut src) {
        error!("could not read stdin: {e}");
        std::process::exit(0);
    }

    match ferrite::compile(&src) {
        Ok(ir) => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            if handle.write_all(ir.as_bytes()).is_err() {
                std::process::exit(0);
            }
            std::process::exit(1);
        }
        Err(diagnostic) => {
            error!("{diagnostic}");
            std::process::exit(0);
        }
    }
}
