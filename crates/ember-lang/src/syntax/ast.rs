use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Source location attached to every node for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

// ─── Node identity ───────────────────────────────────────────────────────────

/// Identity of a variable-reading or variable-writing expression.
///
/// Resolver output is keyed by this id, never by name, because one name can
/// denote different bindings at different points of the source. Ids come from
/// a process-wide counter so that programs parsed separately (one per REPL
/// line) can share a single interpreter without collisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(u32);

static NEXT_EXPR_ID: AtomicU32 = AtomicU32::new(0);

impl ExprId {
    pub fn fresh() -> Self {
        ExprId(NEXT_EXPR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

// ─── Functions ───────────────────────────────────────────────────────────────

/// Shared by `fun name(..) {..}` declarations and `fun (..) {..}` literals.
/// Held behind `Rc` so function values can keep their body alive after the
/// program that defined them has been dropped.
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    /// `None` for anonymous literals.
    pub name: Option<String>,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub span: Span,
}

// ─── Statements ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Stmt {
    /// A standalone expression evaluated for its effect.
    Expr(Expr),
    /// `print expr;`
    Print(Expr, Span),
    /// `var x;` or `var x = expr;`
    Var(VarDecl),
    /// `{ ... }`
    Block(Vec<Stmt>, Span),
    /// `if (cond) stmt else stmt`
    If(IfStmt),
    /// `while (cond) stmt`
    While(WhileStmt),
    /// `break;`
    Break(Span),
    /// `return;` or `return expr;`
    Return(Option<Expr>, Span),
    /// `fun name(params) { body }`
    Function(Rc<FunctionDecl>),
}

#[derive(Debug, Clone)]
pub struct VarDecl {
    pub name: String,
    pub initializer: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_branch: Box<Stmt>,
    pub else_branch: Option<Box<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Box<Stmt>,
    pub span: Span,
}

// ─── Expressions ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Nil,
    Bool(bool),
    Number(f64),
    Str(String),
}

#[derive(Debug, Clone)]
pub enum Expr {
    Literal(Literal, Span),

    /// `( expr )`
    Grouping(Box<Expr>, Span),

    /// `-x`, `!x`
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },

    /// `a + b`, `a == b`, etc. Both operands are always evaluated.
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
        span: Span,
    },

    /// `a and b`, `a or b`. The right operand may be skipped.
    Logical {
        left: Box<Expr>,
        op: LogicalOp,
        right: Box<Expr>,
        span: Span,
    },

    /// A read of `name`.
    Variable {
        id: ExprId,
        name: String,
        span: Span,
    },

    /// `name = value`
    Assign {
        id: ExprId,
        name: String,
        value: Box<Expr>,
        span: Span,
    },

    /// `callee(args)`; `span` points at the closing parenthesis.
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        span: Span,
    },

    /// `fun (params) { body }`
    Function(Rc<FunctionDecl>),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal(_, s)          => *s,
            Expr::Grouping(_, s)         => *s,
            Expr::Unary { span, .. }     => *span,
            Expr::Binary { span, .. }    => *span,
            Expr::Logical { span, .. }   => *span,
            Expr::Variable { span, .. }  => *span,
            Expr::Assign { span, .. }    => *span,
            Expr::Call { span, .. }      => *span,
            Expr::Function(f)            => f.span,
        }
    }
}

// ─── Operators ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add, Sub, Mul, Div,
    Eq, NotEq,
    Lt, LtEq, Gt, GtEq,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add   => "+",
            BinaryOp::Sub   => "-",
            BinaryOp::Mul   => "*",
            BinaryOp::Div   => "/",
            BinaryOp::Eq    => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt    => "<",
            BinaryOp::LtEq  => "<=",
            BinaryOp::Gt    => ">",
            BinaryOp::GtEq  => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn symbol(self) -> &'static str {
        match self {
            LogicalOp::And => "and",
            LogicalOp::Or  => "or",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        }
    }
}
