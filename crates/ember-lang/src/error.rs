use std::fmt;

use thiserror::Error;

/// Error codes prefixed by phase: L = lexer, P = parser, S = resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Lexer
    L001, // unexpected character
    L002, // unterminated string literal
    L003, // invalid escape sequence
    L004, // unterminated block comment

    // Parser
    P001, // unexpected token
    P002, // missing expected token
    P003, // invalid assignment target
    P004, // too many arguments or parameters
    P005, // nesting too deep

    // Resolver
    S001, // redeclaration in same scope
    S002, // read of, or assignment to, a variable in its own initializer
    S003, // binding declared but never read
    S004, // `return` outside a function
    S005, // `break` outside a loop
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::L001 => "L001",
            Self::L002 => "L002",
            Self::L003 => "L003",
            Self::L004 => "L004",
            Self::P001 => "P001",
            Self::P002 => "P002",
            Self::P003 => "P003",
            Self::P004 => "P004",
            Self::P005 => "P005",
            Self::S001 => "S001",
            Self::S002 => "S002",
            Self::S003 => "S003",
            Self::S004 => "S004",
            Self::S005 => "S005",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where on the offending line a static error points.
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    At(String),
    End,
    Nowhere,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::At(lexeme) => write!(f, " at '{lexeme}'"),
            Location::End        => f.write_str(" at end"),
            Location::Nowhere    => Ok(()),
        }
    }
}

/// A static diagnostic from the lexer, parser or resolver.
#[derive(Debug, Clone, Error)]
#[error("[line {line}] Error{location}: {message}")]
pub struct Error {
    pub code: ErrorCode,
    pub line: usize,
    pub column: usize,
    pub location: Location,
    pub message: String,
}

impl Error {
    pub fn new(code: ErrorCode, line: usize, column: usize, message: impl Into<String>) -> Self {
        Self { code, line, column, location: Location::Nowhere, message: message.into() }
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    /// Operand types don't fit the operator.
    Type,
    /// Undefined or uninitialized variable.
    Name,
    /// Wrong argument count.
    Arity,
    /// Callee is not a function.
    NotCallable,
    /// Call depth exceeded `Config::max_call_depth`.
    StackOverflow,
    /// Writing `print` output failed.
    Io,
}

/// A fatal error raised while executing a program.
#[derive(Debug, Clone, Error)]
#[error("{message}\n[line {line}]")]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub line: usize,
    pub message: String,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind, line: usize, message: impl Into<String>) -> Self {
        Self { kind, line, message: message.into() }
    }
}

// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of running a whole source text through `crate::run`.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("{} static error(s)", .0.len())]
    Static(Vec<Error>),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl From<Vec<Error>> for RunError {
    fn from(errors: Vec<Error>) -> Self {
        RunError::Static(errors)
    }
}
