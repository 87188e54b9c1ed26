use std::fmt;
use std::rc::Rc;

use crate::runtime::callable::{Function, NativeFn};

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    Function(Rc<Function>),
    Native(Rc<NativeFn>),
}

impl Value {
    pub fn str(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }

    /// Only `nil` and `false` are falsy; `0` and `""` are truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil         => "nil",
            Value::Bool(_)     => "bool",
            Value::Number(_)   => "number",
            Value::Str(_)      => "string",
            Value::Function(_) => "function",
            Value::Native(_)   => "native function",
        }
    }
}

/// No coercion between types. Functions compare by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil)                 => true,
            (Value::Bool(a), Value::Bool(b))         => a == b,
            (Value::Number(a), Value::Number(b))     => a == b,
            (Value::Str(a), Value::Str(b))           => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b))     => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil         => f.write_str("nil"),
            Value::Bool(b)     => write!(f, "{b}"),
            // f64's Display already drops a trailing `.0`
            Value::Number(n)   => write!(f, "{n}"),
            Value::Str(s)      => f.write_str(s),
            Value::Function(func) => match func.name() {
                Some(name) => write!(f, "<fn {name}>"),
                None       => f.write_str("<fn>"),
            },
            Value::Native(native) => write!(f, "<native fn {}>", native.name),
        }
    }
}
