//! Tree-walking interpreter.
//!
//! Statements produce a [`Flow`] that tells the enclosing construct whether
//! to continue, leave the nearest loop, or unwind to the nearest call.
//! Runtime errors travel separately through `Err` and abort the whole run.
//! Locals are read and written at the addresses computed by the resolver;
//! anything the resolver left unbound is a global looked up by name.

use std::io::Write;
use std::rc::Rc;

use crate::analysis::Bindings;
use crate::config::Config;
use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::runtime::callable::{Function, NativeFn};
use crate::runtime::environment::{self, Frame, FrameRef, Unbound};
use crate::runtime::natives;
use crate::runtime::value::Value;
use crate::syntax::ast::{BinaryOp, Expr, ExprId, Literal, LogicalOp, Stmt, UnaryOp};

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Break,
    Return(Value),
}

pub struct Interpreter<W: Write> {
    out: W,
    config: Config,
    globals: FrameRef,
    env: FrameRef,
    /// Every address the resolver has produced for code this interpreter ran.
    bindings: Bindings,
    depth: usize,
}

impl<W: Write> Interpreter<W> {
    pub fn new(out: W) -> Self {
        Self::with_config(out, Config::default())
    }

    pub fn with_config(out: W, config: Config) -> Self {
        let globals = Frame::global();
        natives::install(&mut globals.borrow_mut());
        Self {
            out,
            config,
            env: Rc::clone(&globals),
            globals,
            bindings: Bindings::default(),
            depth: 0,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn into_output(self) -> W {
        self.out
    }

    // ─── Entry points ─────────────────────────────────────────────────────────

    /// Run a resolved program. Globals persist across calls, so a REPL can
    /// feed one interpreter line by line.
    pub fn interpret(&mut self, stmts: &[Stmt], bindings: &Bindings) -> Result<(), RuntimeError> {
        tracing::debug!(statements = stmts.len(), bindings = bindings.len(), "interpreting");
        self.bindings.extend(bindings);
        for stmt in stmts {
            if self.exec_stmt(stmt)? != Flow::Normal {
                break;
            }
        }
        Ok(())
    }

    /// Evaluate one resolved top-level expression.
    pub fn evaluate(&mut self, expr: &Expr, bindings: &Bindings) -> Result<Value, RuntimeError> {
        self.bindings.extend(bindings);
        self.eval_expr(expr)
    }

    // ─── Statements ───────────────────────────────────────────────────────────

    fn exec_stmt(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        match stmt {
            Stmt::Expr(e) => {
                self.eval_expr(e)?;
            }

            Stmt::Print(e, span) => {
                let value = self.eval_expr(e)?;
                writeln!(self.out, "{value}").map_err(|err| {
                    RuntimeError::new(RuntimeErrorKind::Io, span.line, format!("failed to write output: {err}"))
                })?;
            }

            Stmt::Var(v) => {
                let value = match &v.initializer {
                    Some(init) => Some(self.eval_expr(init)?),
                    None       => None,
                };
                self.env.borrow_mut().define(&v.name, value);
            }

            Stmt::Block(stmts, _) => {
                let frame = Frame::child(&self.env);
                return self.exec_block(stmts, frame);
            }

            Stmt::If(i) => {
                if self.eval_expr(&i.condition)?.is_truthy() {
                    return self.exec_stmt(&i.then_branch);
                }
                if let Some(else_branch) = &i.else_branch {
                    return self.exec_stmt(else_branch);
                }
            }

            Stmt::While(w) => {
                while self.eval_expr(&w.condition)?.is_truthy() {
                    match self.exec_stmt(&w.body)? {
                        Flow::Normal => {}
                        Flow::Break  => break,
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
            }

            Stmt::Break(_) => return Ok(Flow::Break),

            Stmt::Return(value, _) => {
                let value = match value {
                    Some(e) => self.eval_expr(e)?,
                    None    => Value::Nil,
                };
                return Ok(Flow::Return(value));
            }

            Stmt::Function(decl) => {
                let function = Function::new(Rc::clone(decl), Rc::clone(&self.env));
                let name = decl.name.as_deref().unwrap_or_default();
                self.env.borrow_mut().define(name, Some(Value::Function(Rc::new(function))));
            }
        }
        Ok(Flow::Normal)
    }

    /// Run `stmts` with `frame` as the current environment. The previous
    /// environment is restored however the block exits.
    fn exec_block(&mut self, stmts: &[Stmt], frame: FrameRef) -> Result<Flow, RuntimeError> {
        let previous = std::mem::replace(&mut self.env, frame);
        let result = self.exec_stmts(stmts);
        self.env = previous;
        result
    }

    fn exec_stmts(&mut self, stmts: &[Stmt]) -> Result<Flow, RuntimeError> {
        for stmt in stmts {
            let flow = self.exec_stmt(stmt)?;
            if flow != Flow::Normal {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    // ─── Expressions ──────────────────────────────────────────────────────────

    fn eval_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(lit, _) => Ok(match lit {
                Literal::Nil       => Value::Nil,
                Literal::Bool(b)   => Value::Bool(*b),
                Literal::Number(n) => Value::Number(*n),
                Literal::Str(s)    => Value::str(s),
            }),

            Expr::Grouping(inner, _) => self.eval_expr(inner),

            Expr::Unary { op, operand, span } => {
                let value = self.eval_expr(operand)?;
                eval_unary(*op, value, span.line)
            }

            Expr::Binary { left, op, right, span } => {
                let l = self.eval_expr(left)?;
                let r = self.eval_expr(right)?;
                eval_binary(*op, l, r, span.line)
            }

            Expr::Logical { left, op, right, .. } => {
                let l = self.eval_expr(left)?;
                let short_circuit = match op {
                    LogicalOp::Or  => l.is_truthy(),
                    LogicalOp::And => !l.is_truthy(),
                };
                if short_circuit { Ok(l) } else { self.eval_expr(right) }
            }

            Expr::Variable { id, name, span } => self.look_up(*id, name, span.line),

            Expr::Assign { id, name, value, span } => {
                let value = self.eval_expr(value)?;
                match self.bindings.get(*id) {
                    Some(b) => environment::assign_at(&self.env, b.distance, b.slot, value.clone()),
                    None => self.globals.borrow_mut().assign(name, value.clone())
                        .map_err(|_| undefined(name, span.line))?,
                }
                Ok(value)
            }

            Expr::Call { callee, args, span } => {
                let callee = self.eval_expr(callee)?;
                let mut arg_vals = Vec::with_capacity(args.len());
                for arg in args {
                    arg_vals.push(self.eval_expr(arg)?);
                }
                self.call_value(callee, arg_vals, span.line)
            }

            Expr::Function(decl) => {
                let function = Function::new(Rc::clone(decl), Rc::clone(&self.env));
                Ok(Value::Function(Rc::new(function)))
            }
        }
    }

    fn look_up(&self, id: ExprId, name: &str, line: usize) -> Result<Value, RuntimeError> {
        match self.bindings.get(id) {
            Some(b) => environment::get_at(&self.env, b.distance, b.slot)
                .ok_or_else(|| uninitialized(name, line)),
            None => self.globals.borrow().get(name).map_err(|unbound| match unbound {
                Unbound::Undefined     => undefined(name, line),
                Unbound::Uninitialized => uninitialized(name, line),
            }),
        }
    }

    // ─── Calls ────────────────────────────────────────────────────────────────

    fn call_value(&mut self, callee: Value, args: Vec<Value>, line: usize) -> Result<Value, RuntimeError> {
        match callee {
            Value::Function(function) => {
                check_arity(function.arity(), args.len(), line)?;
                self.call_function(&function, args, line)
            }
            Value::Native(native) => {
                check_arity(native.arity, args.len(), line)?;
                call_native(&native, &args, line)
            }
            other => Err(RuntimeError::new(RuntimeErrorKind::NotCallable, line, format!(
                "can only call functions, got {}", other.type_name()
            ))),
        }
    }

    fn call_function(&mut self, function: &Function, args: Vec<Value>, line: usize) -> Result<Value, RuntimeError> {
        if self.depth >= self.config.max_call_depth {
            return Err(RuntimeError::new(RuntimeErrorKind::StackOverflow, line, format!(
                "stack overflow: more than {} nested calls", self.config.max_call_depth
            )));
        }
        tracing::trace!(function = function.name().unwrap_or("<anonymous>"), depth = self.depth, "call");

        // parameters take the first slots of the call frame, in order
        let frame = Frame::child(&function.closure);
        {
            let mut frame = frame.borrow_mut();
            for (param, arg) in function.decl.params.iter().zip(args) {
                frame.define(&param.name, Some(arg));
            }
        }

        self.depth += 1;
        let result = self.exec_block(&function.decl.body, frame);
        self.depth -= 1;

        match result? {
            Flow::Return(value) => Ok(value),
            Flow::Normal | Flow::Break => Ok(Value::Nil),
        }
    }
}

fn call_native(native: &NativeFn, args: &[Value], line: usize) -> Result<Value, RuntimeError> {
    tracing::trace!(native = native.name, "call");
    (native.func)(args).map_err(|msg| RuntimeError::new(RuntimeErrorKind::Type, line, msg))
}

fn check_arity(expected: usize, got: usize, line: usize) -> Result<(), RuntimeError> {
    if expected == got {
        return Ok(());
    }
    Err(RuntimeError::new(RuntimeErrorKind::Arity, line, format!(
        "expected {expected} arguments but got {got}"
    )))
}

// ─── Operators ────────────────────────────────────────────────────────────────

fn eval_unary(op: UnaryOp, value: Value, line: usize) -> Result<Value, RuntimeError> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
        UnaryOp::Neg => match value {
            Value::Number(n) => Ok(Value::Number(-n)),
            other => Err(type_error(line, format!(
                "operand must be a number, got {}", other.type_name()
            ))),
        },
    }
}

fn eval_binary(op: BinaryOp, l: Value, r: Value, line: usize) -> Result<Value, RuntimeError> {
    match op {
        BinaryOp::Eq    => return Ok(Value::Bool(l == r)),
        BinaryOp::NotEq => return Ok(Value::Bool(l != r)),
        BinaryOp::Add   => return add(l, r, line),
        _ => {}
    }

    let (Value::Number(a), Value::Number(b)) = (&l, &r) else {
        return Err(type_error(line, format!(
            "operands of `{}` must be numbers, got {} and {}", op.symbol(), l.type_name(), r.type_name()
        )));
    };
    let (a, b) = (*a, *b);
    Ok(match op {
        BinaryOp::Sub  => Value::Number(a - b),
        BinaryOp::Mul  => Value::Number(a * b),
        // IEEE semantics: x / 0 is an infinity or NaN, not an error
        BinaryOp::Div  => Value::Number(a / b),
        BinaryOp::Lt   => Value::Bool(a < b),
        BinaryOp::LtEq => Value::Bool(a <= b),
        BinaryOp::Gt   => Value::Bool(a > b),
        BinaryOp::GtEq => Value::Bool(a >= b),
        BinaryOp::Add | BinaryOp::Eq | BinaryOp::NotEq => unreachable!("handled above"),
    })
}

fn add(l: Value, r: Value, line: usize) -> Result<Value, RuntimeError> {
    match (&l, &r) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
        (Value::Str(a), Value::Str(b)) => {
            let mut joined = String::with_capacity(a.len() + b.len());
            joined.push_str(a);
            joined.push_str(b);
            Ok(Value::Str(Rc::from(joined)))
        }
        _ => Err(type_error(line, format!(
            "operands must be two numbers or two strings, got {} and {}", l.type_name(), r.type_name()
        ))),
    }
}

// ─── Errors ───────────────────────────────────────────────────────────────────

fn type_error(line: usize, message: String) -> RuntimeError {
    RuntimeError::new(RuntimeErrorKind::Type, line, message)
}

fn undefined(name: &str, line: usize) -> RuntimeError {
    RuntimeError::new(RuntimeErrorKind::Name, line, format!("undefined variable `{name}`"))
}

fn uninitialized(name: &str, line: usize) -> RuntimeError {
    RuntimeError::new(RuntimeErrorKind::Name, line, format!("uninitialized variable `{name}`"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::ast::{FunctionDecl, Param, Span};

    fn num(n: f64) -> Expr {
        Expr::Literal(Literal::Number(n), Span::new(1, 1))
    }

    fn interp() -> Interpreter<Vec<u8>> {
        Interpreter::new(Vec::new())
    }

    #[test]
    fn flow_signals_stay_out_of_errors() {
        let mut i = interp();
        assert_eq!(i.exec_stmt(&Stmt::Break(Span::new(1, 1))).unwrap(), Flow::Break);
        let ret = Stmt::Return(Some(num(4.0)), Span::new(1, 1));
        assert_eq!(i.exec_stmt(&ret).unwrap(), Flow::Return(Value::Number(4.0)));
    }

    #[test]
    fn block_restores_environment_after_error() {
        let mut i = interp();
        let before = Rc::clone(&i.env);
        let bad = Expr::Binary {
            left: Box::new(num(1.0)),
            op: BinaryOp::Sub,
            right: Box::new(Expr::Literal(Literal::Nil, Span::new(1, 5))),
            span: Span::new(1, 3),
        };
        let block = Stmt::Block(vec![Stmt::Expr(bad)], Span::new(1, 1));
        assert!(i.exec_stmt(&block).is_err());
        assert!(Rc::ptr_eq(&before, &i.env));
    }

    #[test]
    fn call_depth_is_bounded() {
        let mut i = Interpreter::with_config(Vec::new(), Config::default().with_max_call_depth(0));
        let decl = Rc::new(FunctionDecl {
            name: Some("f".into()),
            params: vec![Param { name: "x".into(), span: Span::new(1, 7) }],
            body: vec![],
            span: Span::new(1, 1),
        });
        let f = Value::Function(Rc::new(Function::new(decl, Rc::clone(&i.globals))));
        let err = i.call_value(f, vec![Value::Nil], 1).unwrap_err();
        assert_eq!(err.kind, RuntimeErrorKind::StackOverflow);
    }

    #[test]
    fn arithmetic_requires_numbers() {
        let err = eval_binary(BinaryOp::Lt, Value::str("a"), Value::Number(1.0), 3).unwrap_err();
        assert_eq!(err.kind, RuntimeErrorKind::Type);
        assert_eq!(err.line, 3);
    }

    #[test]
    fn division_by_zero_is_infinite() {
        let v = eval_binary(BinaryOp::Div, Value::Number(1.0), Value::Number(0.0), 1).unwrap();
        assert_eq!(v, Value::Number(f64::INFINITY));
    }

    #[test]
    fn not_uses_truthiness() {
        assert_eq!(eval_unary(UnaryOp::Not, Value::Number(0.0), 1).unwrap(), Value::Bool(false));
        assert_eq!(eval_unary(UnaryOp::Not, Value::Nil, 1).unwrap(), Value::Bool(true));
    }
}
