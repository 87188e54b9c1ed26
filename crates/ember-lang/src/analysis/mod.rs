pub mod scope;
pub mod resolver;

#[cfg(test)]
mod tests;

use crate::error::Error;
use crate::syntax::ast::{Expr, Stmt};
pub use resolver::{Binding, Bindings, Resolver};

// ─── Entry points ─────────────────────────────────────────────────────────────

/// Resolve a program. Each call starts from a fresh resolver, so resolving
/// the same statements twice yields equal `Bindings`.
///
/// Returns every static error found; the caller must not execute a program
/// that failed to resolve.
pub fn resolve(stmts: &[Stmt]) -> Result<Bindings, Vec<Error>> {
    Resolver::new().resolve(stmts)
}

/// Resolve a single top-level expression (REPL input).
pub fn resolve_expr(expr: &Expr) -> Result<Bindings, Vec<Error>> {
    Resolver::new().resolve_expr(expr)
}
