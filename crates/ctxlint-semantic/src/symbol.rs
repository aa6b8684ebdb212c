// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Symbol definitions and symbol table.

use ctxlint_ast::{NodeId, Span};

use crate::types::{TypeId, TypeRef};

/// Unique identifier for a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

/// The kind of symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolKind {
    /// A local variable; `is_using` for `using var x = ...` and `using (var x = ...)`.
    Local { is_using: bool },
    /// A method, constructor or lambda parameter.
    Parameter,
    /// A `foreach` iteration variable or `catch` variable.
    Iteration,
    Field,
    Property,
    Method {
        /// Number of generic method parameters.
        type_params: usize,
    },
    /// A named type.
    Type(TypeId),
}

/// A declared symbol.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    pub kind: SymbolKind,
    /// Declared or inferred type. For methods, the return type when it is
    /// not generic.
    pub ty: Option<TypeRef>,
    /// The type that declares this symbol. For locals and parameters, the
    /// type whose member body declares them.
    pub containing_type: Option<TypeId>,
    /// Declaring node in the tree. `None` for framework symbols.
    pub decl: Option<NodeId>,
    pub span: Span,
}

impl Symbol {
    pub fn is_variable(&self) -> bool {
        matches!(
            self.kind,
            SymbolKind::Local { .. } | SymbolKind::Parameter | SymbolKind::Iteration
        )
    }

    pub fn is_member(&self) -> bool {
        matches!(
            self.kind,
            SymbolKind::Field | SymbolKind::Property | SymbolKind::Method { .. }
        )
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            SymbolKind::Local { is_using: true } => "using local",
            SymbolKind::Local { is_using: false } => "local",
            SymbolKind::Parameter => "parameter",
            SymbolKind::Iteration => "iteration variable",
            SymbolKind::Field => "field",
            SymbolKind::Property => "property",
            SymbolKind::Method { .. } => "method",
            SymbolKind::Type(_) => "type",
        }
    }
}

/// Table of all symbols in a model.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new symbol and return its ID.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        kind: SymbolKind,
        ty: Option<TypeRef>,
        containing_type: Option<TypeId>,
        decl: Option<NodeId>,
        span: Span,
    ) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(Symbol {
            id,
            name: name.into(),
            kind,
            ty,
            containing_type,
            decl,
            span,
        });
        id
    }

    /// Get a symbol by ID.
    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: SymbolId) -> Option<&mut Symbol> {
        self.symbols.get_mut(id.0 as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
