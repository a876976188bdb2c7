//! Symbol table: a stack of scopes with outward lookup.
//!
//! The stack grows as the analyzer enters classes, methods, and blocks, and
//! shrinks as it leaves them. Lookups search from the innermost scope
//! outward, implementing lexical scoping with shadowing. The global scope
//! is always at the bottom and can never be popped.

use sigma_common::span::Span;

use crate::symbol::Symbol;
use crate::ty::Ty;

/// The kind of syntactic container a scope belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Class,
    Method,
    Block,
}

/// One scope: a kind and its symbols in definition order.
///
/// Symbols are kept in a vector rather than a map so definition order is
/// preserved exactly; scopes are small enough that linear lookup is fine.
#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    symbols: Vec<Symbol>,
}

impl Scope {
    fn new(kind: ScopeKind) -> Self {
        Self {
            kind,
            symbols: Vec::new(),
        }
    }

    /// Find a symbol in this scope only.
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.name == name)
    }

    /// Symbols in definition order.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }
}

/// The scope stack.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl SymbolTable {
    /// Create a table with one global scope holding the `print` and
    /// `println` built-ins.
    pub fn new() -> Self {
        let mut table = Self {
            scopes: vec![Scope::new(ScopeKind::Global)],
        };
        // Built-in printing methods. The parameter type Error accepts any
        // argument; printability of Print statements is checked separately.
        let builtin_span = Span::point(0);
        for name in ["print", "println"] {
            table
                .define(Symbol::method(name, Ty::Void, vec![Ty::Error], builtin_span))
                .expect("built-ins cannot collide in an empty global scope");
        }
        table
    }

    /// Push a new scope of the given kind.
    pub fn enter(&mut self, kind: ScopeKind) {
        debug_assert!(kind != ScopeKind::Global, "global scope is created once");
        self.scopes.push(Scope::new(kind));
    }

    /// Pop the innermost scope.
    ///
    /// # Panics
    ///
    /// Panics if only the global scope remains: an unbalanced exit is a
    /// programming error in the analyzer, not a user error.
    pub fn exit(&mut self) {
        assert!(self.scopes.len() > 1, "cannot exit the global scope");
        self.scopes.pop();
    }

    /// Number of scopes on the stack (1 = only global).
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Define a symbol in the current scope.
    ///
    /// Fails if the name already exists in that same scope, returning the
    /// previous definition so the caller can report both sites. Shadowing
    /// an outer scope's name is allowed.
    pub fn define(&mut self, symbol: Symbol) -> Result<(), Symbol> {
        let scope = self
            .scopes
            .last_mut()
            .expect("scope stack is never empty");
        if let Some(existing) = scope.get(&symbol.name) {
            return Err(existing.clone());
        }
        scope.symbols.push(symbol);
        Ok(())
    }

    /// Look up a name from the innermost scope outward.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Look up a name in the current scope only.
    pub fn lookup_local(&self, name: &str) -> Option<&Symbol> {
        self.scopes
            .last()
            .expect("scope stack is never empty")
            .get(name)
    }

    /// Whether any enclosing scope is a method scope.
    pub fn in_method_scope(&self) -> bool {
        self.scopes.iter().any(|s| s.kind == ScopeKind::Method)
    }

    /// Whether any enclosing scope is a class scope.
    pub fn in_class_scope(&self) -> bool {
        self.scopes.iter().any(|s| s.kind == ScopeKind::Class)
    }

    /// The global scope, bottom of the stack.
    pub fn global(&self) -> &Scope {
        &self.scopes[0]
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::SymbolKind;

    fn span() -> Span {
        Span::point(0)
    }

    #[test]
    fn builtins_are_predefined() {
        let table = SymbolTable::new();
        let print = table.lookup("print").expect("print is built in");
        assert_eq!(print.kind, SymbolKind::Method);
        assert_eq!(print.ty, Ty::Void);
        assert!(table.lookup("println").is_some());
    }

    #[test]
    fn define_and_lookup() {
        let mut table = SymbolTable::new();
        table.define(Symbol::variable("x", Ty::Int, span())).unwrap();
        assert_eq!(table.lookup("x").unwrap().ty, Ty::Int);
        assert!(table.lookup("y").is_none());
    }

    #[test]
    fn duplicate_in_same_scope_fails() {
        let mut table = SymbolTable::new();
        table.define(Symbol::variable("x", Ty::Int, span())).unwrap();
        let previous = table
            .define(Symbol::variable("x", Ty::Str, span()))
            .unwrap_err();
        assert_eq!(previous.ty, Ty::Int);
    }

    #[test]
    fn shadowing_across_scopes_is_allowed() {
        let mut table = SymbolTable::new();
        table.define(Symbol::variable("x", Ty::Int, span())).unwrap();

        table.enter(ScopeKind::Block);
        table.define(Symbol::variable("x", Ty::Str, span())).unwrap();
        assert_eq!(table.lookup("x").unwrap().ty, Ty::Str);

        table.exit();
        // Popping restores the outer binding untouched.
        assert_eq!(table.lookup("x").unwrap().ty, Ty::Int);
    }

    #[test]
    fn lookup_local_ignores_outer_scopes() {
        let mut table = SymbolTable::new();
        table.define(Symbol::variable("x", Ty::Int, span())).unwrap();
        table.enter(ScopeKind::Block);
        assert!(table.lookup_local("x").is_none());
        assert!(table.lookup("x").is_some());
        table.exit();
    }

    #[test]
    fn scope_kind_queries_walk_the_stack() {
        let mut table = SymbolTable::new();
        assert!(!table.in_method_scope());
        assert!(!table.in_class_scope());

        table.enter(ScopeKind::Class);
        table.enter(ScopeKind::Method);
        table.enter(ScopeKind::Block);
        assert!(table.in_method_scope());
        assert!(table.in_class_scope());

        table.exit();
        table.exit();
        table.exit();
        assert_eq!(table.depth(), 1);
    }

    #[test]
    #[should_panic(expected = "cannot exit the global scope")]
    fn exit_on_global_panics() {
        let mut table = SymbolTable::new();
        table.exit();
    }

    #[test]
    fn definition_order_is_preserved() {
        let mut table = SymbolTable::new();
        table.define(Symbol::variable("a", Ty::Int, span())).unwrap();
        table.define(Symbol::variable("b", Ty::Int, span())).unwrap();
        table.define(Symbol::variable("c", Ty::Int, span())).unwrap();
        let names: Vec<_> = table
            .global()
            .symbols()
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["print", "println", "a", "b", "c"]);
    }
}
