//! Static scope resolution.
//!
//! Walks the AST once with a stack of lexical scopes and records, for every
//! variable read or assignment that refers to a local, how many frames out
//! the binding lives and which slot holds it. Names not found in any scope
//! are left unresolved and looked up in the global table at runtime.
//!
//! Along the way it rejects redeclarations, reads of a variable inside its own
//! initializer, locals that are never read, and misplaced `return`/`break`.

use rustc_hash::FxHashMap;

use crate::error::{Error, ErrorCode, Location};
use crate::syntax::ast::*;
use super::scope::ScopeStack;

// ─── Bindings ─────────────────────────────────────────────────────────────────

/// Lexical address of a local variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Binding {
    /// Number of `enclosing` links to follow from the current frame.
    pub distance: usize,
    pub slot: usize,
}

/// Resolver output: lexical addresses keyed by node identity. A missing entry
/// means the name is global.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings(FxHashMap<ExprId, Binding>);

impl Bindings {
    pub fn get(&self, id: ExprId) -> Option<Binding> {
        self.0.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn extend(&mut self, other: &Bindings) {
        self.0.extend(other.0.iter().map(|(id, b)| (*id, *b)));
    }

    pub fn iter(&self) -> impl Iterator<Item = (ExprId, Binding)> + '_ {
        self.0.iter().map(|(id, b)| (*id, *b))
    }

    fn insert(&mut self, id: ExprId, binding: Binding) {
        self.0.insert(id, binding);
    }
}

// ─── Resolver ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
enum FunctionKind {
    None,
    Function,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum LoopKind {
    None,
    Loop,
}

pub struct Resolver {
    scopes: ScopeStack,
    bindings: Bindings,
    errors: Vec<Error>,
    current_function: FunctionKind,
    current_loop: LoopKind,
    /// Name of the global whose initializer is being resolved, if any.
    global_in_init: Option<String>,
}

impl Resolver {
    pub fn new() -> Self {
        Self {
            scopes: ScopeStack::new(),
            bindings: Bindings::default(),
            errors: Vec::new(),
            current_function: FunctionKind::None,
            current_loop: LoopKind::None,
            global_in_init: None,
        }
    }

    pub fn resolve(mut self, stmts: &[Stmt]) -> Result<Bindings, Vec<Error>> {
        for stmt in stmts {
            self.resolve_stmt(stmt);
        }
        self.finish()
    }

    /// Resolve a lone expression evaluated at the top level (REPL input).
    pub fn resolve_expr(mut self, expr: &Expr) -> Result<Bindings, Vec<Error>> {
        self.visit_expr(expr);
        self.finish()
    }

    fn finish(self) -> Result<Bindings, Vec<Error>> {
        tracing::debug!(bindings = self.bindings.len(), errors = self.errors.len(), "resolved program");
        if self.errors.is_empty() {
            Ok(self.bindings)
        } else {
            Err(self.errors)
        }
    }

    // ── Statements ────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr(e)     => self.visit_expr(e),
            Stmt::Print(e, _) => self.visit_expr(e),
            Stmt::Var(v)      => self.resolve_var(v),
            Stmt::Block(stmts, _) => {
                self.begin_scope();
                for s in stmts {
                    self.resolve_stmt(s);
                }
                self.end_scope();
            }
            Stmt::If(i) => {
                self.visit_expr(&i.condition);
                self.resolve_stmt(&i.then_branch);
                if let Some(else_branch) = &i.else_branch {
                    self.resolve_stmt(else_branch);
                }
            }
            Stmt::While(w) => {
                let enclosing = std::mem::replace(&mut self.current_loop, LoopKind::Loop);
                self.visit_expr(&w.condition);
                self.resolve_stmt(&w.body);
                self.current_loop = enclosing;
            }
            Stmt::Break(span) => {
                if self.current_loop == LoopKind::None {
                    self.error(ErrorCode::S005, *span, "break", "`break` must be inside a loop");
                }
            }
            Stmt::Return(value, span) => {
                if self.current_function == FunctionKind::None {
                    self.error(ErrorCode::S004, *span, "return", "can't return from top-level code");
                }
                if let Some(v) = value {
                    self.visit_expr(v);
                }
            }
            Stmt::Function(decl) => {
                if let Some(name) = &decl.name {
                    // defined before the body so the function can call itself
                    self.declare(name, decl.span);
                    self.define(name);
                }
                self.resolve_function(decl);
            }
        }
    }

    fn resolve_var(&mut self, v: &VarDecl) {
        self.declare(&v.name, v.span);
        if let Some(init) = &v.initializer {
            let enclosing = if self.scopes.is_global() {
                self.global_in_init.replace(v.name.clone())
            } else {
                self.global_in_init.take()
            };
            self.visit_expr(init);
            self.global_in_init = enclosing;
        }
        self.define(&v.name);
    }

    fn resolve_function(&mut self, decl: &FunctionDecl) {
        let enclosing_fn = std::mem::replace(&mut self.current_function, FunctionKind::Function);
        let enclosing_loop = std::mem::replace(&mut self.current_loop, LoopKind::None);
        let enclosing_init = self.global_in_init.take();

        self.begin_scope();
        for param in &decl.params {
            self.declare(&param.name, param.span);
            self.define(&param.name);
        }
        for stmt in &decl.body {
            self.resolve_stmt(stmt);
        }
        self.end_scope();

        self.current_function = enclosing_fn;
        self.current_loop = enclosing_loop;
        self.global_in_init = enclosing_init;
    }

    // ── Expressions ───────────────────────────────────────────────────────────

    fn visit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(..) => {}
            Expr::Grouping(inner, _) => self.visit_expr(inner),
            Expr::Unary { operand, .. } => self.visit_expr(operand),
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.visit_expr(left);
                self.visit_expr(right);
            }
            Expr::Variable { id, name, span } => self.resolve_read(*id, name, *span),
            Expr::Assign { id, name, value, span } => {
                self.visit_expr(value);
                if let Some((distance, info)) = self.scopes.lookup_mut(name) {
                    // the slot doesn't exist at runtime until the initializer finishes
                    let uninitialized = !info.initialized;
                    let binding = Binding { distance, slot: info.slot };
                    self.bindings.insert(*id, binding);
                    if uninitialized {
                        self.error(ErrorCode::S002, *span, name,
                            format!("can't assign local variable `{name}` in its own initializer"));
                    }
                }
            }
            Expr::Call { callee, args, .. } => {
                self.visit_expr(callee);
                for arg in args {
                    self.visit_expr(arg);
                }
            }
            Expr::Function(decl) => self.resolve_function(decl),
        }
    }

    fn resolve_read(&mut self, id: ExprId, name: &str, span: Span) {
        match self.scopes.lookup_mut(name) {
            Some((distance, info)) => {
                let uninitialized = !info.initialized;
                info.used = true;
                let binding = Binding { distance, slot: info.slot };
                self.bindings.insert(id, binding);
                if uninitialized {
                    self.error(ErrorCode::S002, span, name,
                        format!("can't read local variable `{name}` in its own initializer"));
                }
            }
            None => {
                if self.global_in_init.as_deref() == Some(name) {
                    self.error(ErrorCode::S002, span, name,
                        format!("can't read global variable `{name}` in its own initializer"));
                }
            }
        }
    }

    // ── Scope management ──────────────────────────────────────────────────────

    fn begin_scope(&mut self) {
        self.scopes.push();
    }

    fn end_scope(&mut self) {
        let Some(scope) = self.scopes.pop() else { return };
        for (name, info) in scope.unused() {
            self.errors.push(
                Error::new(ErrorCode::S003, info.span.line, info.span.column,
                    format!("variable `{name}` declared but never used"))
                    .at(Location::At(name.to_string())),
            );
        }
    }

    /// No-op at the top level: globals are resolved by name at runtime and may
    /// be redeclared.
    fn declare(&mut self, name: &str, span: Span) {
        let Some(scope) = self.scopes.innermost() else { return };
        if scope.declare(name, span).is_none() {
            self.error(ErrorCode::S001, span, name,
                format!("already a variable named `{name}` in this scope"));
        }
    }

    fn define(&mut self, name: &str) {
        if let Some(scope) = self.scopes.innermost() {
            scope.define(name);
        }
    }

    fn error(&mut self, code: ErrorCode, span: Span, lexeme: &str, message: impl Into<String>) {
        self.errors.push(
            Error::new(code, span.line, span.column, message).at(Location::At(lexeme.to_string())),
        );
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}
