use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use log::{debug, trace};

use crate::ast::ScopeId;

/// Whether a binding may be reassigned once declared.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SymbolKind {
    Variable,
    Constant,
}

/// A single bound name: the scope it lives in, its kind, and its stable
/// 1-based storage slot within that scope.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    name: String,
    kind: SymbolKind,
    position: u32,
    is_global: bool,
}

impl Symbol {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn is_global(&self) -> bool {
        self.is_global
    }
}

#[derive(Debug, Default)]
struct Scope {
    parent: Option<ScopeId>,
    symbols: IndexMap<String, Symbol>,
}

/// The arena backing every `SymbolTable` handle created for one compilation.
/// Kept behind `Rc<RefCell<_>>` (per the arena-of-scope-records design note)
/// so parent and child handles can be held simultaneously without fighting
/// the borrow checker over a linked tree.
#[derive(Debug, Default)]
struct Arena {
    scopes: Vec<Scope>,
}

/// A lexically nested mapping from names to [`Symbol`] records. Cloning a
/// `SymbolTable` is cheap: all handles derived from one root share the same
/// underlying arena, addressed by [`ScopeId`].
#[derive(Debug, Clone)]
pub struct SymbolTable {
    arena: Rc<RefCell<Arena>>,
    scope: ScopeId,
}

impl SymbolTable {
    /// A fresh table containing only the global scope.
    pub fn new() -> Self {
        let arena = Arena {
            scopes: vec![Scope::default()],
        };
        SymbolTable {
            arena: Rc::new(RefCell::new(arena)),
            scope: ScopeId::global(),
        }
    }

    /// Returns a handle for this table's current scope.
    pub fn scope_id(&self) -> ScopeId {
        self.scope
    }

    /// Returns a new handle to the given scope, sharing this table's arena.
    /// Used by `CodeGenerator` to revisit a function's scope by the
    /// `ScopeId` the resolver stamped on its node.
    pub fn at(&self, scope: ScopeId) -> SymbolTable {
        SymbolTable {
            arena: Rc::clone(&self.arena),
            scope,
        }
    }

    /// Creates a new child scope of this table's current scope and returns a
    /// handle pointing at it. `initial_position_offset` exists to allow a
    /// future frame-offset layout; the current design always passes 0.
    pub fn new_child(&self, _initial_position_offset: u32) -> SymbolTable {
        let mut arena = self.arena.borrow_mut();
        let id = ScopeId::new(arena.scopes.len() as u64);
        arena.scopes.push(Scope {
            parent: Some(self.scope),
            symbols: IndexMap::new(),
        });
        drop(arena);
        debug!("created scope {} (parent {})", id, self.scope);
        SymbolTable {
            arena: Rc::clone(&self.arena),
            scope: id,
        }
    }

    /// Defines `name` in the current scope. Fails if `name` is already
    /// defined locally (not walking parents).
    pub fn define(&self, name: &str, kind: SymbolKind) -> Result<Symbol, crate::error::ResolverError> {
        let mut arena = self.arena.borrow_mut();
        let is_global = arena.scopes[self.index()].parent.is_none();
        let scope = &mut arena.scopes[self.index()];
        if scope.symbols.contains_key(name) {
            return Err(crate::error::ResolverError::DuplicateDefinition(name.to_string()));
        }
        let position = scope.symbols.len() as u32 + 1;
        let symbol = Symbol {
            name: name.to_string(),
            kind,
            position,
            is_global,
        };
        scope.symbols.insert(name.to_string(), symbol.clone());
        trace!("defined '{}' at position {} (global={})", name, position, is_global);
        Ok(symbol)
    }

    /// True iff `name` is defined in this table's current scope, ignoring
    /// parents.
    pub fn is_defined_locally(&self, name: &str) -> bool {
        let arena = self.arena.borrow();
        arena.scopes[self.index()].symbols.contains_key(name)
    }

    /// Looks up `name` starting at the current scope and walking the parent
    /// chain to the root. Returns `None` if unreachable.
    pub fn get(&self, name: &str) -> Option<Symbol> {
        let arena = self.arena.borrow();
        let mut current = Some(self.scope);
        while let Some(id) = current {
            let scope = &arena.scopes[id.index()];
            if let Some(symbol) = scope.symbols.get(name) {
                return Some(symbol.clone());
            }
            current = scope.parent;
        }
        None
    }

    /// The number of symbols currently defined in this table's scope.
    pub fn get_num_symbols(&self) -> u32 {
        let arena = self.arena.borrow();
        arena.scopes[self.index()].symbols.len() as u32
    }

    fn index(&self) -> usize {
        self.scope.index()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        SymbolTable::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_assigns_contiguous_one_based_positions() {
        let table = SymbolTable::new();
        let a = table.define("a", SymbolKind::Variable).unwrap();
        let b = table.define("b", SymbolKind::Variable).unwrap();
        assert_eq!(a.position(), 1);
        assert_eq!(b.position(), 2);
        assert_eq!(table.get_num_symbols(), 2);
    }

    #[test]
    fn duplicate_definition_is_rejected() {
        let table = SymbolTable::new();
        table.define("x", SymbolKind::Variable).unwrap();
        let err = table.define("x", SymbolKind::Constant).unwrap_err();
        assert_eq!(err, crate::error::ResolverError::DuplicateDefinition("x".to_string()));
    }

    #[test]
    fn child_scope_numbering_is_independent_of_parent() {
        let root = SymbolTable::new();
        root.define("a", SymbolKind::Variable).unwrap();
        let child = root.new_child(0);
        let x = child.define("x", SymbolKind::Variable).unwrap();
        assert_eq!(x.position(), 1);
        assert_eq!(root.get_num_symbols(), 1);
        assert_eq!(child.get_num_symbols(), 1);
    }

    #[test]
    fn get_walks_parent_chain_and_prefers_nearest() {
        let root = SymbolTable::new();
        root.define("x", SymbolKind::Variable).unwrap();
        let child = root.new_child(0);
        assert_eq!(child.get("x").unwrap().position(), 1);

        child.define("x", SymbolKind::Constant).unwrap();
        assert_eq!(child.get("x").unwrap().kind(), SymbolKind::Constant);
        assert_eq!(root.get("x").unwrap().kind(), SymbolKind::Variable);
    }

    #[test]
    fn is_defined_locally_does_not_see_parent_bindings() {
        let root = SymbolTable::new();
        root.define("x", SymbolKind::Variable).unwrap();
        let child = root.new_child(0);
        assert!(!child.is_defined_locally("x"));
        assert!(root.is_defined_locally("x"));
    }

    #[test]
    fn global_scope_symbols_are_marked_global() {
        let root = SymbolTable::new();
        let sym = root.define("g", SymbolKind::Variable).unwrap();
        assert!(sym.is_global());

        let child = root.new_child(0);
        let local = child.define("l", SymbolKind::Variable).unwrap();
        assert!(!local.is_global());
    }
}
