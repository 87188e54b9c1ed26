pub mod syntax;
pub mod analysis;
pub mod runtime;
pub mod error;
pub mod config;

pub use analysis::{Binding, Bindings, resolve, resolve_expr};
pub use config::Config;
pub use error::{Error, ErrorCode, Location, RunError, RuntimeError, RuntimeErrorKind};
pub use runtime::{Interpreter, Value};
pub use syntax::ast::{Expr, Stmt};
pub use syntax::parser::ReplInput;
pub use syntax::token::{Token, TokenKind};

use std::io::Write;

use syntax::lexer::Lexer;
use syntax::parser::Parser;

// ─── Public API ───────────────────────────────────────────────────────────────

/// Lex and parse a whole program. On failure every lexer or parser error is
/// returned; lexer errors stop the pipeline before parsing.
pub fn parse(source: &str) -> Result<Vec<Stmt>, Vec<Error>> {
    let tokens = Lexer::new(source).tokenize()?;
    Parser::new(tokens).parse()
}

/// Lex and parse one REPL line, recognising a lone expression.
pub fn parse_repl(source: &str) -> Result<ReplInput, Vec<Error>> {
    let tokens = Lexer::new(source).tokenize()?;
    Parser::new(tokens).parse_repl()
}

/// Parse, resolve and run `source` in a fresh interpreter writing to `out`.
/// Nothing executes unless the program is free of static errors.
pub fn run<W: Write>(source: &str, out: W) -> Result<(), RunError> {
    run_with_config(source, out, Config::default())
}

pub fn run_with_config<W: Write>(source: &str, out: W, config: Config) -> Result<(), RunError> {
    let stmts = parse(source)?;
    let bindings = resolve(&stmts)?;
    Interpreter::with_config(out, config).interpret(&stmts, &bindings)?;
    Ok(())
}
