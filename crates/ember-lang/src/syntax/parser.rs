use std::rc::Rc;

use crate::error::{Error, ErrorCode, Location};
use crate::syntax::ast::*;
use crate::syntax::token::{Token, TokenKind};

/// Calls and function literals accept at most this many arguments/parameters.
pub const MAX_ARGS: usize = 255;

/// How deeply expressions, statements and function bodies may nest.
pub const MAX_NESTING: usize = 64;

/// What a single REPL line turned out to be.
#[derive(Debug, Clone)]
pub enum ReplInput {
    /// The whole line is one expression with no trailing `;`.
    Expr(Expr),
    Program(Vec<Stmt>),
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Errors that don't abort the current statement (invalid assignment
    /// target, too many arguments) plus every error caught by recovery.
    errors: Vec<Error>,
    depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0, errors: Vec::new(), depth: 0 }
    }

    pub fn parse(mut self) -> Result<Vec<Stmt>, Vec<Error>> {
        let mut stmts = Vec::new();

        while !self.is_at_end() {
            let pos_before = self.pos;

            if let Some(stmt) = self.declaration() {
                stmts.push(stmt);
            }

            // guarantee progress: a stray `}` at top level stops recovery
            // without being consumed
            if self.pos == pos_before {
                self.advance();
            }
        }

        tracing::debug!(stmts = stmts.len(), errors = self.errors.len(), "parsed program");
        if self.errors.is_empty() {
            Ok(stmts)
        } else {
            Err(self.errors)
        }
    }

    /// Parse a REPL line: a lone expression if the whole input is exactly one
    /// expression, otherwise a full program.
    pub fn parse_repl(mut self) -> Result<ReplInput, Vec<Error>> {
        if let Ok(expr) = self.expression() {
            if self.is_at_end() {
                // the whole line was one expression, so its errors are final
                return if self.errors.is_empty() { Ok(ReplInput::Expr(expr)) } else { Err(self.errors) };
            }
        }
        self.pos = 0;
        self.depth = 0;
        self.errors.clear();
        self.parse().map(ReplInput::Program)
    }

    /// Parse one standalone expression followed by end of input.
    pub fn parse_expression(mut self) -> Result<Expr, Vec<Error>> {
        let expr = match self.expression() {
            Ok(e) => e,
            Err(e) => {
                self.errors.push(e);
                return Err(self.errors);
            }
        };
        if !self.is_at_end() {
            let err = self.unexpected("end of input");
            self.errors.push(err);
        }
        if self.errors.is_empty() { Ok(expr) } else { Err(self.errors) }
    }

    // ─── Declarations ────────────────────────────────────────────────────────

    /// Parse one declaration, recovering to the next statement boundary on error.
    fn declaration(&mut self) -> Option<Stmt> {
        match self.parse_declaration() {
            Ok(stmt) => Some(stmt),
            Err(e) => {
                self.errors.push(e);
                self.recover();
                None
            }
        }
    }

    fn parse_declaration(&mut self) -> Result<Stmt, Error> {
        match self.peek_kind() {
            TokenKind::Var => self.parse_var_decl(),
            // `fun (` starts an anonymous function expression statement
            TokenKind::Fun if !self.peek_next_is(TokenKind::LParen) => {
                self.advance();
                let decl = self.parse_function(true)?;
                Ok(Stmt::Function(Rc::new(decl)))
            }
            _ => self.parse_stmt(),
        }
    }

    fn parse_var_decl(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::Var, "`var`")?;
        let (name, _) = self.expect_ident("variable name")?;
        let initializer = if self.matches(TokenKind::Eq) {
            Some(self.expression()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon, "`;` after variable declaration")?;
        Ok(Stmt::Var(VarDecl { name, initializer, span }))
    }

    /// Parses everything after the `fun` keyword. Named declarations require
    /// an identifier; literals must not have one.
    fn parse_function(&mut self, named: bool) -> Result<FunctionDecl, Error> {
        self.nested(|p| p.parse_function_inner(named))
    }

    fn parse_function_inner(&mut self, named: bool) -> Result<FunctionDecl, Error> {
        let span = self.span();
        let name = if named {
            Some(self.expect_ident("function name")?.0)
        } else {
            None
        };
        self.expect(TokenKind::LParen, "`(` before parameters")?;
        let params = self.parse_param_list()?;
        self.expect(TokenKind::RParen, "`)` after parameters")?;
        self.expect(TokenKind::LBrace, "`{` before function body")?;
        let body = self.parse_block_body()?;
        Ok(FunctionDecl { name, params, body, span })
    }

    fn parse_param_list(&mut self) -> Result<Vec<Param>, Error> {
        let mut params = Vec::new();
        while !self.check(TokenKind::RParen) && !self.is_at_end() {
            if params.len() == MAX_ARGS {
                let err = self.error_at(self.peek(), ErrorCode::P004,
                    format!("can't have more than {MAX_ARGS} parameters"));
                self.errors.push(err);
            }
            let (name, span) = self.expect_ident("parameter name")?;
            params.push(Param { name, span });
            if !self.matches(TokenKind::Comma) { break; }
        }
        Ok(params)
    }

    // ─── Statements ──────────────────────────────────────────────────────────

    /// Statements following `{`, up to and including the closing `}`.
    fn parse_block_body(&mut self) -> Result<Vec<Stmt>, Error> {
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            let pos_before = self.pos;
            if let Some(stmt) = self.declaration() {
                stmts.push(stmt);
            }
            if self.pos == pos_before && !self.check(TokenKind::RBrace) {
                self.advance();
            }
        }
        self.expect(TokenKind::RBrace, "`}` after block")?;
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<Stmt, Error> {
        self.nested(Self::parse_stmt_inner)
    }

    fn parse_stmt_inner(&mut self) -> Result<Stmt, Error> {
        match self.peek_kind() {
            TokenKind::Print  => self.parse_print(),
            TokenKind::If     => self.parse_if(),
            TokenKind::While  => self.parse_while(),
            TokenKind::For    => self.parse_for(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Break  => self.parse_break(),
            TokenKind::LBrace => {
                let span = self.span();
                self.advance();
                Ok(Stmt::Block(self.parse_block_body()?, span))
            }
            _ => {
                let expr = self.expression()?;
                self.expect(TokenKind::Semicolon, "`;` after expression")?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn parse_print(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::Print, "`print`")?;
        let value = self.expression()?;
        self.expect(TokenKind::Semicolon, "`;` after value")?;
        Ok(Stmt::Print(value, span))
    }

    fn parse_if(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::If, "`if`")?;
        self.expect(TokenKind::LParen, "`(` after `if`")?;
        let condition = self.expression()?;
        self.expect(TokenKind::RParen, "`)` after if condition")?;
        let then_branch = Box::new(self.parse_stmt()?);
        let else_branch = if self.matches(TokenKind::Else) {
            Some(Box::new(self.parse_stmt()?))
        } else {
            None
        };
        Ok(Stmt::If(IfStmt { condition, then_branch, else_branch, span }))
    }

    fn parse_while(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::While, "`while`")?;
        self.expect(TokenKind::LParen, "`(` after `while`")?;
        let condition = self.expression()?;
        self.expect(TokenKind::RParen, "`)` after condition")?;
        let body = Box::new(self.parse_stmt()?);
        Ok(Stmt::While(WhileStmt { condition, body, span }))
    }

    /// `for (init; cond; incr) body` becomes
    /// `{ init; while (cond) { body; incr; } }`.
    fn parse_for(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::For, "`for`")?;
        self.expect(TokenKind::LParen, "`(` after `for`")?;

        let init = match self.peek_kind() {
            TokenKind::Semicolon => { self.advance(); None }
            TokenKind::Var => Some(self.parse_var_decl()?),
            _ => {
                let expr = self.expression()?;
                self.expect(TokenKind::Semicolon, "`;` after loop initializer")?;
                Some(Stmt::Expr(expr))
            }
        };

        let condition = if self.check(TokenKind::Semicolon) {
            Expr::Literal(Literal::Bool(true), self.span())
        } else {
            self.expression()?
        };
        self.expect(TokenKind::Semicolon, "`;` after loop condition")?;

        let increment = if self.check(TokenKind::RParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect(TokenKind::RParen, "`)` after for clauses")?;

        let mut body = self.parse_stmt()?;
        if let Some(incr) = increment {
            body = Stmt::Block(vec![body, Stmt::Expr(incr)], span);
        }
        let looped = Stmt::While(WhileStmt { condition, body: Box::new(body), span });
        Ok(match init {
            Some(init) => Stmt::Block(vec![init, looped], span),
            None => looped,
        })
    }

    fn parse_return(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::Return, "`return`")?;
        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect(TokenKind::Semicolon, "`;` after return value")?;
        Ok(Stmt::Return(value, span))
    }

    fn parse_break(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::Break, "`break`")?;
        self.expect(TokenKind::Semicolon, "`;` after `break`")?;
        Ok(Stmt::Break(span))
    }

    // ─── Expressions (precedence climbing) ───────────────────────────────────

    fn expression(&mut self) -> Result<Expr, Error> {
        self.nested(Self::parse_assignment)
    }

    fn parse_assignment(&mut self) -> Result<Expr, Error> {
        let expr = self.parse_or()?;
        if self.check(TokenKind::Eq) {
            let equals = self.advance();
            let value = self.expression()?;
            return match expr {
                Expr::Variable { id, name, span } => {
                    Ok(Expr::Assign { id, name, value: Box::new(value), span })
                }
                other => {
                    // reported, but the parse carries on with the left side
                    let err = self.error_at(&equals, ErrorCode::P003, "invalid assignment target");
                    self.errors.push(err);
                    Ok(other)
                }
            };
        }
        Ok(expr)
    }

    fn parse_or(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_and()?;
        while self.check(TokenKind::Or) {
            let span = self.span();
            self.advance();
            let right = self.parse_and()?;
            left = Expr::Logical { left: Box::new(left), op: LogicalOp::Or, right: Box::new(right), span };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_equality()?;
        while self.check(TokenKind::And) {
            let span = self.span();
            self.advance();
            let right = self.parse_equality()?;
            left = Expr::Logical { left: Box::new(left), op: LogicalOp::And, right: Box::new(right), span };
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::EqEq   => BinaryOp::Eq,
                TokenKind::BangEq => BinaryOp::NotEq,
                _ => break,
            };
            let span = self.span();
            self.advance();
            let right = self.parse_comparison()?;
            left = Expr::Binary { left: Box::new(left), op, right: Box::new(right), span };
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Lt   => BinaryOp::Lt,
                TokenKind::LtEq => BinaryOp::LtEq,
                TokenKind::Gt   => BinaryOp::Gt,
                TokenKind::GtEq => BinaryOp::GtEq,
                _ => break,
            };
            let span = self.span();
            self.advance();
            let right = self.parse_term()?;
            left = Expr::Binary { left: Box::new(left), op, right: Box::new(right), span };
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_factor()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus  => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            let span = self.span();
            self.advance();
            let right = self.parse_factor()?;
            left = Expr::Binary { left: Box::new(left), op, right: Box::new(right), span };
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star  => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => break,
            };
            let span = self.span();
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::Binary { left: Box::new(left), op, right: Box::new(right), span };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, Error> {
        let span = self.span();
        let op = match self.peek_kind() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Bang  => UnaryOp::Not,
            _ => return self.parse_call(),
        };
        self.advance();
        let operand = self.nested(Self::parse_unary)?;
        Ok(Expr::Unary { op, operand: Box::new(operand), span })
    }

    fn parse_call(&mut self) -> Result<Expr, Error> {
        let mut expr = self.parse_primary()?;
        while self.matches(TokenKind::LParen) {
            let args = self.parse_arg_list()?;
            let paren = self.expect(TokenKind::RParen, "`)` after arguments")?;
            let span = Span::new(paren.line, paren.column);
            expr = Expr::Call { callee: Box::new(expr), args, span };
        }
        Ok(expr)
    }

    fn parse_arg_list(&mut self) -> Result<Vec<Expr>, Error> {
        let mut args = Vec::new();
        while !self.check(TokenKind::RParen) && !self.is_at_end() {
            if args.len() == MAX_ARGS {
                let err = self.error_at(self.peek(), ErrorCode::P004,
                    format!("can't have more than {MAX_ARGS} arguments"));
                self.errors.push(err);
            }
            args.push(self.expression()?);
            if !self.matches(TokenKind::Comma) { break; }
        }
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expr, Error> {
        let tok = self.peek().clone();
        let span = Span::new(tok.line, tok.column);

        match tok.kind {
            TokenKind::False     => { self.advance(); Ok(Expr::Literal(Literal::Bool(false), span)) }
            TokenKind::True      => { self.advance(); Ok(Expr::Literal(Literal::Bool(true), span)) }
            TokenKind::Nil       => { self.advance(); Ok(Expr::Literal(Literal::Nil, span)) }
            TokenKind::Number(n) => { self.advance(); Ok(Expr::Literal(Literal::Number(n), span)) }
            TokenKind::Str(s)    => { self.advance(); Ok(Expr::Literal(Literal::Str(s), span)) }

            TokenKind::Ident(name) => {
                self.advance();
                Ok(Expr::Variable { id: ExprId::fresh(), name, span })
            }

            TokenKind::LParen => {
                self.advance();
                let inner = self.expression()?;
                self.expect(TokenKind::RParen, "`)` after expression")?;
                Ok(Expr::Grouping(Box::new(inner), span))
            }

            TokenKind::Fun => {
                self.advance();
                let decl = self.parse_function(false)?;
                Ok(Expr::Function(Rc::new(decl)))
            }

            _ => Err(self.unexpected("expression")),
        }
    }

    // ─── Token primitives ────────────────────────────────────────────────────

    /// Run `parse` one nesting level deeper, failing with P005 past
    /// [`MAX_NESTING`] instead of exhausting the host stack.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T, Error>) -> Result<T, Error> {
        if self.depth >= MAX_NESTING {
            return Err(self.error_at(self.peek(), ErrorCode::P005,
                format!("nesting deeper than {MAX_NESTING} levels")));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_kind(&self) -> TokenKind {
        self.tokens[self.pos].kind.clone()
    }

    fn peek_next_is(&self, kind: TokenKind) -> bool {
        self.tokens.get(self.pos + 1).is_some_and(|t| t.kind == kind)
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() { self.pos += 1; }
        tok
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.tokens[self.pos].kind == kind
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) { self.advance(); true } else { false }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, Error> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_at(self.peek(), ErrorCode::P002, format!("expected {what}")))
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<(String, Span), Error> {
        let tok = self.peek();
        match &tok.kind {
            TokenKind::Ident(s) => {
                let ident = (s.clone(), Span::new(tok.line, tok.column));
                self.advance();
                Ok(ident)
            }
            _ => Err(self.error_at(tok, ErrorCode::P002, format!("expected {what}"))),
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.tokens[self.pos].kind, TokenKind::Eof)
    }

    fn span(&self) -> Span {
        let tok = self.peek();
        Span::new(tok.line, tok.column)
    }

    fn unexpected(&self, expected: &str) -> Error {
        self.error_at(self.peek(), ErrorCode::P001, format!("expected {expected}"))
    }

    fn error_at(&self, tok: &Token, code: ErrorCode, msg: impl Into<String>) -> Error {
        let location = match tok.kind {
            TokenKind::Eof => Location::End,
            _ => Location::At(tok.lexeme.clone()),
        };
        Error::new(code, tok.line, tok.column, msg).at(location)
    }

    /// Skip tokens until something that looks like a statement boundary: just
    /// past a `;`, or at a token that starts a statement. A `}` is left for
    /// the enclosing block to close.
    fn recover(&mut self) {
        loop {
            match self.peek_kind() {
                TokenKind::Eof | TokenKind::RBrace => return,
                TokenKind::Semicolon => { self.advance(); return; }
                kind if kind.starts_statement() => return,
                _ => { self.advance(); }
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
