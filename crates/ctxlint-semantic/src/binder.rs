// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Builds a `BoundModel` for one syntax tree.
//!
//! Three passes: declare every class, then members and base lists, then walk
//! bodies resolving names against a lexical scope tree and inferring
//! expression types. Names that don't resolve are left alone.

use std::collections::HashMap;

use ctxlint_ast::{BinOp, Literal, NodeId, NodeKind, SyntaxTree, TypeSyntax, UnaryOp};
use tracing::debug;

use crate::prelude::{self, TASKS};
use crate::scope::{ScopeKind, ScopeTree};
use crate::symbol::{Symbol, SymbolId, SymbolKind, SymbolTable};
use crate::types::{MemberInfo, MemberKind, TypeExpr, TypeId, TypeInfo, TypeRef, TypeTable};
use crate::SemanticModel;

/// Symbol and type information for one tree.
#[derive(Debug)]
pub struct BoundModel {
    symbols: SymbolTable,
    types: TypeTable,
    resolutions: HashMap<NodeId, SymbolId>,
    declarations: HashMap<NodeId, SymbolId>,
    node_types: HashMap<NodeId, TypeRef>,
}

impl BoundModel {
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    /// Every resolved reference, in node order.
    pub fn resolutions(&self) -> Vec<(NodeId, &Symbol)> {
        let mut out: Vec<_> = self
            .resolutions
            .iter()
            .filter_map(|(&node, &sym)| Some((node, self.symbols.get(sym)?)))
            .collect();
        out.sort_by_key(|(node, _)| *node);
        out
    }

    pub fn display_type(&self, ty: &TypeRef) -> String {
        self.types.display(ty)
    }
}

impl SemanticModel for BoundModel {
    fn resolve(&self, node: NodeId) -> Option<&Symbol> {
        self.symbols.get(*self.resolutions.get(&node)?)
    }

    fn declared(&self, decl: NodeId) -> Option<&Symbol> {
        self.symbols.get(*self.declarations.get(&decl)?)
    }

    fn type_of(&self, node: NodeId) -> Option<&TypeRef> {
        self.node_types.get(&node)
    }

    fn type_info(&self, ty: TypeId) -> Option<&TypeInfo> {
        self.types.get(ty)
    }
}

/// Context of the member body being bound.
#[derive(Default, Clone)]
struct MemberContext {
    class: Option<TypeId>,
    type_params: Vec<String>,
    method_params: Vec<String>,
}

pub struct Binder<'a> {
    tree: &'a SyntaxTree,
    symbols: SymbolTable,
    types: TypeTable,
    scopes: ScopeTree,
    resolutions: HashMap<NodeId, SymbolId>,
    declarations: HashMap<NodeId, SymbolId>,
    node_types: HashMap<NodeId, TypeRef>,
    /// Instantiated return types of resolved method callees.
    call_returns: HashMap<NodeId, TypeRef>,
    /// Class node -> declared type.
    classes: Vec<(NodeId, TypeId)>,
    type_symbols: HashMap<TypeId, SymbolId>,
    ctx: MemberContext,
}

impl<'a> Binder<'a> {
    pub fn new(tree: &'a SyntaxTree) -> Self {
        let mut types = TypeTable::new();
        let mut symbols = SymbolTable::new();
        prelude::install(&mut types, &mut symbols);
        let type_symbols = symbols
            .iter()
            .filter_map(|s| match s.kind {
                SymbolKind::Type(id) => Some((id, s.id)),
                _ => None,
            })
            .collect();
        Self {
            tree,
            symbols,
            types,
            scopes: ScopeTree::new(),
            resolutions: HashMap::new(),
            declarations: HashMap::new(),
            node_types: HashMap::new(),
            call_returns: HashMap::new(),
            classes: Vec::new(),
            type_symbols,
            ctx: MemberContext::default(),
        }
    }

    /// Bind the whole tree.
    pub fn bind(mut self) -> BoundModel {
        if let Some(root) = self.tree.root() {
            self.declare_types(root, "");
            self.declare_members();
            self.bind_top_level(root);
            for (class_node, id) in self.classes.clone() {
                self.bind_class_bodies(class_node, id);
            }
        }
        debug!(
            symbols = self.symbols.len(),
            resolved = self.resolutions.len(),
            "bound tree"
        );
        BoundModel {
            symbols: self.symbols,
            types: self.types,
            resolutions: self.resolutions,
            declarations: self.declarations,
            node_types: self.node_types,
        }
    }

    // =========================================================================
    // Pass 1: types
    // =========================================================================

    fn declare_types(&mut self, node: NodeId, namespace: &str) {
        let tree = self.tree;
        for &child in tree.children(node) {
            match tree.kind(child) {
                NodeKind::Namespace { name } => {
                    let inner = join_namespace(namespace, name);
                    self.declare_types(child, &inner);
                }
                NodeKind::Class { name, type_params, .. } => {
                    let id = self.types.insert(TypeInfo {
                        name: name.clone(),
                        namespace: namespace.to_string(),
                        type_params: type_params.clone(),
                        base: None,
                        members: Vec::new(),
                        decl: Some(child),
                    });
                    let sym = self.symbols.insert(
                        name.clone(),
                        SymbolKind::Type(id),
                        None,
                        None,
                        Some(child),
                        tree.span(child),
                    );
                    self.type_symbols.insert(id, sym);
                    self.declarations.insert(child, sym);
                    self.classes.push((child, id));
                    // Nested types live in the outer type's namespace path.
                    let nested = join_namespace(namespace, name);
                    self.declare_types(child, &nested);
                }
                _ => {}
            }
        }
    }

    // =========================================================================
    // Pass 2: members and bases
    // =========================================================================

    fn declare_members(&mut self) {
        let tree = self.tree;
        for (class_node, id) in self.classes.clone() {
            let NodeKind::Class { type_params, bases, .. } = tree.kind(class_node) else {
                continue;
            };
            let type_params = type_params.as_slice();
            let base = bases
                .iter()
                .map(|b| prelude::type_expr(&self.types, b, type_params, &[] as &[String]))
                .find(|b| *b != TypeExpr::Unknown)
                .or_else(|| {
                    self.types
                        .lookup("object", 0)
                        .map(|object| TypeExpr::Named(object, Vec::new()))
                });

            let mut members = Vec::new();
            for &member in tree.children(class_node) {
                let (name, kind, syntax, method_params): (_, _, _, &[String]) = match tree.kind(member) {
                    NodeKind::Field { name, ty } => (name, MemberKind::Field, ty, &[]),
                    NodeKind::Property { name, ty } => (name, MemberKind::Property, ty, &[]),
                    NodeKind::Method { name, ret, type_params: mp, .. } => {
                        (name, MemberKind::Method, ret, mp.as_slice())
                    }
                    _ => continue,
                };
                let ty = prelude::type_expr(&self.types, syntax, type_params, method_params);
                let sym_kind = match kind {
                    MemberKind::Field => SymbolKind::Field,
                    MemberKind::Property => SymbolKind::Property,
                    MemberKind::Method => SymbolKind::Method {
                        type_params: method_params.len(),
                    },
                };
                let symbol = self.symbols.insert(
                    name.clone(),
                    sym_kind,
                    ty.closed(),
                    Some(id),
                    Some(member),
                    tree.span(member),
                );
                self.declarations.insert(member, symbol);
                members.push(MemberInfo {
                    name: name.clone(),
                    kind,
                    ty,
                    type_params: method_params.len(),
                    symbol,
                });
            }

            // A class naming itself as its base would loop forever.
            let base = base.filter(|b| !matches!(b, TypeExpr::Named(base_id, _) if *base_id == id));
            if let Some(info) = self.types.get_mut(id) {
                info.base = base;
                info.members = members;
            }
        }
    }

    // =========================================================================
    // Pass 3: bodies
    // =========================================================================

    /// Statements written directly in the compilation unit or a namespace.
    fn bind_top_level(&mut self, node: NodeId) {
        self.ctx = MemberContext::default();
        self.scopes.push(ScopeKind::Function);
        let children = self.tree.children(node).to_vec();
        for child in children {
            match self.tree.kind(child) {
                NodeKind::Namespace { .. } => self.bind_top_level(child),
                NodeKind::Class { .. } | NodeKind::UsingDirective { .. } => {}
                _ => self.bind_stmt(child),
            }
        }
        self.scopes.pop();
    }

    fn bind_class_bodies(&mut self, class_node: NodeId, id: TypeId) {
        let type_params = self
            .types
            .get(id)
            .map(|t| t.type_params.clone())
            .unwrap_or_default();
        let members = self.tree.children(class_node).to_vec();
        for member in members {
            let method_params = match self.tree.kind(member) {
                NodeKind::Method { type_params, .. } => type_params.clone(),
                NodeKind::Field { .. } | NodeKind::Property { .. } | NodeKind::Constructor { .. } => {
                    Vec::new()
                }
                _ => continue,
            };
            self.ctx = MemberContext {
                class: Some(id),
                type_params: type_params.clone(),
                method_params,
            };
            self.scopes.push(ScopeKind::Function);
            self.define_params(member);
            let body = self.tree.children(member).to_vec();
            for child in body {
                if !matches!(self.tree.kind(child), NodeKind::Parameter { .. }) {
                    self.bind_stmt(child);
                }
            }
            self.scopes.pop();
        }
    }

    fn define_params(&mut self, func: NodeId) {
        let tree = self.tree;
        for param in tree.params(func) {
            let NodeKind::Parameter { name, ty } = tree.kind(param) else {
                continue;
            };
            let ty = ty.as_ref().and_then(|t| self.resolve_type_syntax(t));
            self.define_variable(name.clone(), SymbolKind::Parameter, ty, param);
        }
    }

    fn define_variable(
        &mut self,
        name: String,
        kind: SymbolKind,
        ty: Option<TypeRef>,
        decl: NodeId,
    ) -> SymbolId {
        let id = self.symbols.insert(
            name.clone(),
            kind,
            ty,
            self.ctx.class,
            Some(decl),
            self.tree.span(decl),
        );
        self.scopes.define(name, id);
        self.declarations.insert(decl, id);
        id
    }

    fn resolve_type_syntax(&self, syntax: &TypeSyntax) -> Option<TypeRef> {
        prelude::type_expr(
            &self.types,
            syntax,
            self.ctx.type_params.as_slice(),
            self.ctx.method_params.as_slice(),
        )
        .closed()
    }

    fn bind_stmt(&mut self, node: NodeId) {
        let children = self.tree.children(node).to_vec();
        match self.tree.kind(node).clone() {
            NodeKind::Block => {
                self.scopes.push(ScopeKind::Block);
                for child in children {
                    self.bind_stmt(child);
                }
                self.scopes.pop();
            }
            NodeKind::LocalDecl { name, ty, is_using } => {
                let is_using = is_using
                    || matches!(
                        self.tree.parent(node).map(|p| self.tree.kind(p)),
                        Some(NodeKind::UsingStmt)
                    );
                let init_ty = children.first().and_then(|&init| self.bind_expr(init));
                let declared = ty.as_ref().and_then(|t| self.resolve_type_syntax(t));
                let ty = if ty.is_some() { declared } else { init_ty };
                self.define_variable(name, SymbolKind::Local { is_using }, ty, node);
            }
            NodeKind::UsingStmt | NodeKind::For => {
                self.scopes.push(ScopeKind::Block);
                for child in children {
                    self.bind_stmt(child);
                }
                self.scopes.pop();
            }
            NodeKind::ForEach { var, ty } => {
                let iterable_ty = children.first().and_then(|&it| self.bind_expr(it));
                self.scopes.push(ScopeKind::Block);
                let ty = match ty {
                    Some(t) => self.resolve_type_syntax(&t),
                    None => iterable_ty.and_then(|t| self.element_type(&t)),
                };
                self.define_variable(var, SymbolKind::Iteration, ty, node);
                for &child in children.iter().skip(1) {
                    self.bind_stmt(child);
                }
                self.scopes.pop();
            }
            NodeKind::Catch { var, ty } => {
                self.scopes.push(ScopeKind::Block);
                if let Some(var) = var {
                    let ty = ty.as_ref().and_then(|t| self.resolve_type_syntax(t));
                    self.define_variable(var, SymbolKind::Iteration, ty, node);
                }
                for child in children {
                    self.bind_stmt(child);
                }
                self.scopes.pop();
            }
            NodeKind::ExprStmt
            | NodeKind::Return
            | NodeKind::Throw
            | NodeKind::If
            | NodeKind::While
            | NodeKind::Try => {
                for child in children {
                    self.bind_stmt(child);
                }
            }
            NodeKind::Empty | NodeKind::Error => {}
            _ => {
                self.bind_expr(node);
            }
        }
    }

    /// Bind an expression and record its type.
    fn bind_expr(&mut self, node: NodeId) -> Option<TypeRef> {
        let ty = self.infer_expr(node);
        if let Some(ty) = &ty {
            self.node_types.insert(node, ty.clone());
        }
        ty
    }

    fn infer_expr(&mut self, node: NodeId) -> Option<TypeRef> {
        let children = self.tree.children(node).to_vec();
        match self.tree.kind(node).clone() {
            NodeKind::Literal(lit) => {
                let name = match lit {
                    Literal::Int(_) => "int",
                    Literal::Float(_) => "double",
                    Literal::String(_) => "string",
                    Literal::Char(_) => "char",
                    Literal::Bool(_) => "bool",
                    Literal::Null => return None,
                };
                self.named(name, 0)
            }
            NodeKind::This => self.ctx.class.map(TypeRef::simple),
            NodeKind::Base => {
                let class = self.ctx.class?;
                self.types.get(class)?.base.as_ref()?.closed()
            }
            NodeKind::Ident { name, type_args } => self.bind_ident(node, &name, &type_args),
            NodeKind::MemberAccess { name, type_args, .. } => {
                let receiver = *children.first()?;
                self.bind_member_access(node, receiver, &name, &type_args)
            }
            NodeKind::Invocation => {
                let callee = *children.first()?;
                self.bind_expr(callee);
                for &arg in &children[1..] {
                    self.bind_expr(arg);
                }
                if let Some(&sym) = self.resolutions.get(&callee) {
                    self.resolutions.insert(node, sym);
                }
                self.call_returns.get(&callee).cloned()
            }
            NodeKind::ObjectCreation { ty } => {
                for arg in children {
                    self.bind_expr(arg);
                }
                self.resolve_type_syntax(&ty)
            }
            NodeKind::Await => {
                let inner = self.bind_expr(*children.first()?)?;
                self.unwrap_task(&inner)
            }
            NodeKind::Lambda { .. } | NodeKind::AnonymousMethod { .. } => {
                self.scopes.push(ScopeKind::Closure);
                self.define_params(node);
                if let Some(body) = self.tree.body(node) {
                    self.bind_stmt(body);
                }
                self.scopes.pop();
                None
            }
            NodeKind::Assign { .. } => {
                let target = self.bind_expr(*children.first()?);
                if let Some(&value) = children.get(1) {
                    self.bind_expr(value);
                }
                target
            }
            NodeKind::Binary { op } => {
                let lhs = children.first().and_then(|&c| self.bind_expr(c));
                let rhs = children.get(1).and_then(|&c| self.bind_expr(c));
                match op {
                    BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge
                    | BinOp::And | BinOp::Or => self.named("bool", 0),
                    BinOp::Coalesce => lhs.or(rhs),
                    _ => lhs,
                }
            }
            NodeKind::Unary { op } => {
                let operand = self.bind_expr(*children.first()?);
                match op {
                    UnaryOp::Not => self.named("bool", 0),
                    _ => operand,
                }
            }
            NodeKind::Paren => self.bind_expr(*children.first()?),
            NodeKind::Conditional => {
                let types: Vec<_> = children.iter().map(|&c| self.bind_expr(c)).collect();
                types.into_iter().nth(1).flatten()
            }
            NodeKind::ElementAccess => {
                let object = children.first().and_then(|&c| self.bind_expr(c));
                for &index in children.iter().skip(1) {
                    self.bind_expr(index);
                }
                object.and_then(|t| t.args.last().cloned())
            }
            NodeKind::Error => None,
            kind if kind.is_statement() => {
                self.bind_stmt(node);
                None
            }
            _ => None,
        }
    }

    fn bind_ident(&mut self, node: NodeId, name: &str, type_args: &[TypeSyntax]) -> Option<TypeRef> {
        if let Some(sym) = self.scopes.lookup(name) {
            self.resolutions.insert(node, sym);
            return self.symbols.get(sym)?.ty.clone();
        }

        // Implicit `this.` member.
        if let Some(class) = self.ctx.class {
            if let Some(ty) = self.bind_member(node, &TypeRef::simple(class), name, type_args) {
                return ty;
            }
        }

        let id = self.types.lookup(name, type_args.len())?;
        let sym = *self.type_symbols.get(&id)?;
        self.resolutions.insert(node, sym);
        None
    }

    fn bind_member_access(
        &mut self,
        node: NodeId,
        receiver: NodeId,
        name: &str,
        type_args: &[TypeSyntax],
    ) -> Option<TypeRef> {
        let receiver_ty = self.bind_expr(receiver);
        let receiver_ty = match receiver_ty {
            Some(ty) => ty,
            // Static access through a type name.
            None => match self.resolutions.get(&receiver).and_then(|&s| self.symbols.get(s)) {
                Some(Symbol { kind: SymbolKind::Type(id), .. }) => TypeRef::simple(*id),
                _ => return None,
            },
        };
        self.bind_member(node, &receiver_ty, name, type_args)
            .flatten()
    }

    /// Resolve `name` as a member of `ty`. Outer `None`: no such member.
    /// Inner: the member's type, or `None` for methods (whose instantiated
    /// return type goes to `call_returns`).
    fn bind_member(
        &mut self,
        node: NodeId,
        ty: &TypeRef,
        name: &str,
        type_args: &[TypeSyntax],
    ) -> Option<Option<TypeRef>> {
        let (member, owner) = self.types.lookup_member(ty, name)?;
        let (kind, member_ty, symbol) = (member.kind, member.ty.clone(), member.symbol);
        self.resolutions.insert(node, symbol);
        let method_args: Vec<TypeRef> = type_args
            .iter()
            .filter_map(|t| self.resolve_type_syntax(t))
            .collect();
        let instantiated = member_ty.instantiate(&owner.args, &method_args);
        match kind {
            MemberKind::Method => {
                if let Some(ret) = instantiated {
                    self.call_returns.insert(node, ret);
                }
                Some(None)
            }
            MemberKind::Field | MemberKind::Property => Some(instantiated),
        }
    }

    fn named(&self, name: &str, arity: usize) -> Option<TypeRef> {
        self.types.lookup(name, arity).map(TypeRef::simple)
    }

    /// `Task<T>` / `ValueTask<T>` -> `T`.
    fn unwrap_task(&self, ty: &TypeRef) -> Option<TypeRef> {
        let info = self.types.get(ty.id)?;
        let awaitable = info.namespace == TASKS && (info.name == "Task" || info.name == "ValueTask");
        if awaitable {
            ty.args.first().cloned()
        } else {
            None
        }
    }

    /// Element type of anything enumerable.
    fn element_type(&self, ty: &TypeRef) -> Option<TypeRef> {
        let seq = self.types.lookup("System.Collections.Generic.IEnumerable", 1)?;
        self.types.find_ancestor(ty, seq)?.args.first().cloned()
    }
}

fn join_namespace(outer: &str, inner: &str) -> String {
    if outer.is_empty() {
        inner.to_string()
    } else {
        format!("{outer}.{inner}")
    }
}
