use std::fmt;
use std::rc::Rc;

use crate::runtime::environment::FrameRef;
use crate::runtime::value::Value;
use crate::syntax::ast::FunctionDecl;

/// A user function: its declaration plus the frame that was current where it
/// was defined. Calls run in a fresh frame chained to `closure`, which gives
/// lexical rather than dynamic scoping.
pub struct Function {
    pub decl: Rc<FunctionDecl>,
    pub closure: FrameRef,
}

impl Function {
    pub fn new(decl: Rc<FunctionDecl>, closure: FrameRef) -> Self {
        Self { decl, closure }
    }

    pub fn name(&self) -> Option<&str> {
        self.decl.name.as_deref()
    }

    pub fn arity(&self) -> usize {
        self.decl.params.len()
    }
}

// The closure frame may hold this very function; printing it would recurse.
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name())
            .field("arity", &self.arity())
            .finish_non_exhaustive()
    }
}

// ─── Natives ──────────────────────────────────────────────────────────────────

pub type NativeImpl = fn(&[Value]) -> Result<Value, String>;

/// A function implemented by the host. Arity is checked by the interpreter
/// before `func` runs.
pub struct NativeFn {
    pub name: &'static str,
    pub arity: usize,
    pub func: NativeImpl,
}

impl NativeFn {
    pub fn new(name: &'static str, arity: usize, func: NativeImpl) -> Self {
        Self { name, arity, func }
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFn({}/{})", self.name, self.arity)
    }
}
