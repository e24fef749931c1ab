use std::collections::HashMap;

use lucent_common::Span;

use super::types::Type;

/// What a declared name refers to. Closed union: every symbol is either a
/// variable or a function, and consumers match exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolKind {
    Variable {
        ty: Type,
    },
    Function {
        params: Vec<Type>,
        return_type: Type,
    },
}

/// A declared symbol in the program.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub defined_at: Span,
    pub used: bool,
}

impl Symbol {
    pub fn variable(name: impl Into<String>, ty: Type, defined_at: Span) -> Self {
        Self {
            name: name.into(),
            kind: SymbolKind::Variable { ty },
            defined_at,
            used: false,
        }
    }

    pub fn function(
        name: impl Into<String>,
        params: Vec<Type>,
        return_type: Type,
        defined_at: Span,
    ) -> Self {
        Self {
            name: name.into(),
            kind: SymbolKind::Function {
                params,
                return_type,
            },
            defined_at,
            used: false,
        }
    }
}

/// The kind of scope, which doubles as the control-flow context: asking
/// "am I inside a loop?" is a walk up the scope chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Function,
    Block,
    Loop,
    Switch,
}

/// A lexical scope containing symbol declarations.
#[derive(Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    pub symbols: HashMap<String, Symbol>,
    parent: Option<usize>,
}

/// Stack of nested scopes for lexical scoping.
///
/// Scopes are stored in a flat `Vec` and linked by parent indices. `push`
/// creates a child of the current scope; `pop` returns to the parent. Popped
/// scopes stay in the arena so callers can inspect them afterwards (unused
/// warnings).
#[derive(Debug)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
    current: usize,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    pub fn new() -> Self {
        let global = Scope {
            kind: ScopeKind::Global,
            symbols: HashMap::new(),
            parent: None,
        };
        Self {
            scopes: vec![global],
            current: 0,
        }
    }

    /// Push a new child scope of the given kind.
    pub fn push(&mut self, kind: ScopeKind) {
        let parent = self.current;
        let idx = self.scopes.len();
        self.scopes.push(Scope {
            kind,
            symbols: HashMap::new(),
            parent: Some(parent),
        });
        self.current = idx;
    }

    /// Pop the current scope, returning its index (for later inspection).
    pub fn pop(&mut self) -> usize {
        let old = self.current;
        self.current = self.scopes[old].parent.expect("cannot pop global scope");
        old
    }

    /// True when the stack is back at the global scope.
    pub fn at_global(&self) -> bool {
        self.current == 0
    }

    /// Get a scope by index (for reading after pop).
    pub fn get_scope(&self, idx: usize) -> &Scope {
        &self.scopes[idx]
    }

    /// Define a symbol in the current scope. Last insert wins on a duplicate
    /// key; duplicate *detection* is the checker's job, via
    /// [`ScopeStack::lookup_local`] before the insert.
    pub fn define(&mut self, symbol: Symbol) {
        let scope = &mut self.scopes[self.current];
        scope.symbols.insert(symbol.name.clone(), symbol);
    }

    /// Look up a symbol by name, walking up the scope chain.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        let mut idx = self.current;
        loop {
            if let Some(sym) = self.scopes[idx].symbols.get(name) {
                return Some(sym);
            }
            match self.scopes[idx].parent {
                Some(parent) => idx = parent,
                None => return None,
            }
        }
    }

    /// Look up a symbol mutably by name, walking up the scope chain.
    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        // Find which scope contains the name first (immutable walk).
        let mut idx = self.current;
        let target_idx = loop {
            if self.scopes[idx].symbols.contains_key(name) {
                break idx;
            }
            match self.scopes[idx].parent {
                Some(parent) => idx = parent,
                None => return None,
            }
        };
        self.scopes[target_idx].symbols.get_mut(name)
    }

    /// Look up a symbol in the current scope only. Shadowing an outer scope
    /// is legal, so redeclaration checks must not walk the chain.
    pub fn lookup_local(&self, name: &str) -> Option<&Symbol> {
        self.scopes[self.current].symbols.get(name)
    }

    /// Check if we are inside a loop, at any nesting depth within the
    /// enclosing function. The walk stops at a function boundary so loop
    /// context never leaks into a nested function body.
    pub fn in_loop(&self) -> bool {
        self.walk_for_kind(ScopeKind::Loop)
    }

    /// Check if we are inside a switch (same boundary rule as `in_loop`).
    pub fn in_switch(&self) -> bool {
        self.walk_for_kind(ScopeKind::Switch)
    }

    fn walk_for_kind(&self, kind: ScopeKind) -> bool {
        let mut idx = self.current;
        loop {
            if self.scopes[idx].kind == kind {
                return true;
            }
            if self.scopes[idx].kind == ScopeKind::Function {
                return false;
            }
            match self.scopes[idx].parent {
                Some(parent) => idx = parent,
                None => return false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str, ty: Type) -> Symbol {
        Symbol::variable(name, ty, Span::dummy())
    }

    #[test]
    fn define_and_lookup() {
        let mut stack = ScopeStack::new();
        stack.define(var("x", Type::Int));
        assert!(stack.lookup("x").is_some());
        assert!(stack.lookup("y").is_none());
    }

    #[test]
    fn local_lookup_ignores_outer_scopes() {
        let mut stack = ScopeStack::new();
        stack.define(var("x", Type::Int));
        assert!(stack.lookup_local("x").is_some());
        stack.push(ScopeKind::Block);
        // Visible through the chain, but not local to the child.
        assert!(stack.lookup("x").is_some());
        assert!(stack.lookup_local("x").is_none());
    }

    #[test]
    fn nested_scope_lookup() {
        let mut stack = ScopeStack::new();
        stack.define(var("x", Type::Int));
        stack.push(ScopeKind::Block);
        stack.define(var("y", Type::Float));
        assert!(stack.lookup("x").is_some());
        assert!(stack.lookup("y").is_some());
        stack.pop();
        // y no longer visible
        assert!(stack.lookup("y").is_none());
    }

    #[test]
    fn last_insert_wins_in_same_scope() {
        let mut stack = ScopeStack::new();
        stack.define(var("x", Type::Int));
        stack.define(var("x", Type::Vec3));
        let sym = stack.lookup("x").unwrap();
        assert_eq!(sym.kind, SymbolKind::Variable { ty: Type::Vec3 });
    }

    #[test]
    fn shadow_in_child_scope() {
        let mut stack = ScopeStack::new();
        stack.define(var("x", Type::Int));
        stack.push(ScopeKind::Block);
        stack.define(var("x", Type::Float));
        let sym = stack.lookup("x").unwrap();
        assert_eq!(sym.kind, SymbolKind::Variable { ty: Type::Float });
        stack.pop();
        let sym = stack.lookup("x").unwrap();
        assert_eq!(sym.kind, SymbolKind::Variable { ty: Type::Int });
    }

    #[test]
    fn in_loop_detection() {
        let mut stack = ScopeStack::new();
        assert!(!stack.in_loop());
        stack.push(ScopeKind::Function);
        assert!(!stack.in_loop());
        stack.push(ScopeKind::Loop);
        assert!(stack.in_loop());
        stack.push(ScopeKind::Block);
        assert!(stack.in_loop()); // still in loop (nested block)
        stack.pop();
        stack.pop();
        assert!(!stack.in_loop()); // back to function
    }

    #[test]
    fn in_switch_detection() {
        let mut stack = ScopeStack::new();
        stack.push(ScopeKind::Function);
        stack.push(ScopeKind::Switch);
        assert!(stack.in_switch());
        assert!(!stack.in_loop());
        // A loop nested in the switch sees both.
        stack.push(ScopeKind::Loop);
        assert!(stack.in_switch());
        assert!(stack.in_loop());
    }

    #[test]
    fn loop_context_stops_at_function_boundary() {
        let mut stack = ScopeStack::new();
        stack.push(ScopeKind::Function);
        stack.push(ScopeKind::Loop);
        assert!(stack.in_loop());
        // A nested function body does not inherit the outer loop.
        stack.push(ScopeKind::Function);
        assert!(!stack.in_loop());
        assert!(!stack.in_switch());
    }

    #[test]
    fn popped_scopes_remain_inspectable() {
        let mut stack = ScopeStack::new();
        stack.push(ScopeKind::Block);
        stack.define(var("tmp", Type::Int));
        let idx = stack.pop();
        assert!(stack.get_scope(idx).symbols.contains_key("tmp"));
        assert!(stack.at_global());
    }
}
