// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Lexical scope tree used while binding bodies.

use std::collections::HashMap;

use crate::symbol::SymbolId;

/// Unique identifier for a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

/// The kind of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Top-level statements.
    Global,
    /// Method or constructor body.
    Function,
    /// Block, `using`, `for`, `foreach` or `catch`.
    Block,
    /// Lambda or anonymous method.
    Closure,
}

#[derive(Debug)]
pub struct Scope {
    pub id: ScopeId,
    pub parent: Option<ScopeId>,
    pub kind: ScopeKind,
    pub bindings: HashMap<String, SymbolId>,
}

/// Tree of scopes for name lookup.
#[derive(Debug)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    current: ScopeId,
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTree {
    /// Create a new scope tree with a global scope.
    pub fn new() -> Self {
        let global = Scope {
            id: ScopeId(0),
            parent: None,
            kind: ScopeKind::Global,
            bindings: HashMap::new(),
        };
        Self {
            scopes: vec![global],
            current: ScopeId(0),
        }
    }

    pub fn push(&mut self, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            id,
            parent: Some(self.current),
            kind,
            bindings: HashMap::new(),
        });
        self.current = id;
        id
    }

    /// Pop the current scope and return to its parent.
    pub fn pop(&mut self) {
        if let Some(parent) = self.scopes.get(self.current.0 as usize).and_then(|s| s.parent) {
            self.current = parent;
        }
    }

    pub fn current(&self) -> ScopeId {
        self.current
    }

    pub fn get(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id.0 as usize)
    }

    /// Look up a name in the current scope chain.
    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        let mut scope_id = Some(self.current);
        while let Some(id) = scope_id {
            let scope = self.scopes.get(id.0 as usize)?;
            if let Some(&symbol) = scope.bindings.get(name) {
                return Some(symbol);
            }
            scope_id = scope.parent;
        }
        None
    }

    /// Define a name in the current scope, returning any binding it replaces.
    pub fn define(&mut self, name: impl Into<String>, symbol: SymbolId) -> Option<SymbolId> {
        self.scopes[self.current.0 as usize]
            .bindings
            .insert(name.into(), symbol)
    }

    /// True when inside a lambda or anonymous method.
    pub fn in_closure(&self) -> bool {
        let mut scope_id = Some(self.current);
        while let Some(id) = scope_id {
            match self.scopes.get(id.0 as usize) {
                Some(scope) if scope.kind == ScopeKind::Closure => return true,
                Some(scope) => scope_id = scope.parent,
                None => break,
            }
        }
        false
    }
}
