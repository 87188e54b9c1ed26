use rustc_hash::FxHashMap;

use crate::syntax::ast::Span;

// ─── Variable info ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct VarInfo {
    /// `false` between `var x` and the end of its initializer.
    pub initialized: bool,
    /// Set on the first read. Assignments don't count.
    pub used: bool,
    pub span: Span,
    /// Position of the variable's storage slot in its runtime frame.
    pub slot: usize,
}

// ─── Scope ────────────────────────────────────────────────────────────────────

/// One lexical scope: a block body or a function body with its parameters.
#[derive(Debug, Default)]
pub struct Scope {
    vars: FxHashMap<String, VarInfo>,
    next_slot: usize,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next slot for `name`. Returns `None` if the name is
    /// already declared in this scope.
    pub fn declare(&mut self, name: &str, span: Span) -> Option<usize> {
        if self.vars.contains_key(name) {
            return None;
        }
        let slot = self.next_slot;
        self.next_slot += 1;
        self.vars.insert(name.to_string(), VarInfo { initialized: false, used: false, span, slot });
        Some(slot)
    }

    pub fn define(&mut self, name: &str) {
        if let Some(info) = self.vars.get_mut(name) {
            info.initialized = true;
        }
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut VarInfo> {
        self.vars.get_mut(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Variables never read, in declaration order.
    pub fn unused(&self) -> Vec<(&str, &VarInfo)> {
        let mut unused: Vec<_> = self.vars.iter()
            .filter(|(_, info)| !info.used)
            .map(|(name, info)| (name.as_str(), info))
            .collect();
        unused.sort_by_key(|(_, info)| info.slot);
        unused
    }
}

// ─── Scope stack ──────────────────────────────────────────────────────────────

/// The resolver's view of lexical nesting. The top level is not a scope:
/// an empty stack means "global".
#[derive(Debug, Default)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self) {
        self.scopes.push(Scope::new());
    }

    pub fn pop(&mut self) -> Option<Scope> {
        self.scopes.pop()
    }

    pub fn is_global(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn innermost(&mut self) -> Option<&mut Scope> {
        self.scopes.last_mut()
    }

    /// Innermost to outermost search. Returns how many scopes were walked
    /// past to find `name`, with its info.
    pub fn lookup_mut(&mut self, name: &str) -> Option<(usize, &mut VarInfo)> {
        self.scopes.iter_mut()
            .rev()
            .enumerate()
            .find_map(|(distance, scope)| scope.get_mut(name).map(|info| (distance, info)))
    }
}
