//! Nyx: a small dynamically typed scripting language.
//!
//! Source goes through four stages: [`scanner`] → [`parser`] →
//! [`resolver`] → [`interpreter`]. [`run_source`] drives all of them and
//! reports every error to the interpreter's [`Diagnostics`](error::Diagnostics).

pub mod ast;
pub mod ast_printer;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod module;
pub mod natives;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod token;
pub mod value;

use log::{debug, info};

use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;

/// Scan, parse, resolve and execute `source` on `interpreter`.
///
/// Static errors from any stage are all reported, and nothing runs. A
/// runtime error is reported and stops execution. Returns `true` only if
/// the whole program ran.
pub fn run_source(interpreter: &mut Interpreter, file: &str, source: &str) -> bool {
    info!("Running {} ({} bytes)", file, source.len());

    let diagnostics = interpreter.diagnostics();

    let (tokens, lex_errors) = Scanner::new(file, source).scan_all();
    let (statements, parse_errors) = Parser::new(&tokens).parse();

    if !lex_errors.is_empty() || !parse_errors.is_empty() {
        debug!(
            "{} lex error(s), {} parse error(s)",
            lex_errors.len(),
            parse_errors.len()
        );

        for e in lex_errors.iter().chain(parse_errors.iter()) {
            diagnostics.error(e);
        }
        return false;
    }

    let resolve_errors = Resolver::new(interpreter).resolve(&statements);

    if !resolve_errors.is_empty() {
        for e in &resolve_errors {
            diagnostics.error(e);
        }
        return false;
    }

    interpreter.interpret(&statements)
}
