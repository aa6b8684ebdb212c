// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Arena-backed syntax tree.

use std::fmt::Write;
use std::ops::Index;

use crate::{NodeId, NodeKind, Span};

/// A node in the arena.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// A parsed compilation unit.
///
/// Nodes are pushed bottom-up: a parent is allocated after its children and
/// adopts them, so every child index is smaller than its parent's.
#[derive(Debug, Clone, Default)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl SyntaxTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a node and adopt `children`.
    pub fn push(&mut self, kind: NodeKind, span: Span, children: Vec<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        for &child in &children {
            if let Some(node) = self.nodes.get_mut(child.index()) {
                node.parent = Some(id);
            }
        }
        self.nodes.push(Node {
            kind,
            span,
            parent: None,
            children,
        });
        id
    }

    /// Allocate a leaf node.
    pub fn leaf(&mut self, kind: NodeKind, span: Span) -> NodeId {
        self.push(kind, span, Vec::new())
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self[id].kind
    }

    pub fn span(&self, id: NodeId) -> Span {
        self[id].span
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// All nodes in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId(i as u32), n))
    }

    /// Proper ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// `id` and everything below it, in pre-order.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            stack: vec![id],
        }
    }

    /// True if `ancestor` lies strictly above `node`.
    pub fn is_ancestor_of(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).any(|a| a == ancestor)
    }

    /// True if `node` is `outer` or lies below it.
    pub fn encloses(&self, outer: NodeId, node: NodeId) -> bool {
        outer == node || self.is_ancestor_of(outer, node)
    }

    // =========================================================================
    // Shape accessors
    // =========================================================================

    pub fn invocation_callee(&self, id: NodeId) -> Option<NodeId> {
        match self.kind(id) {
            NodeKind::Invocation => self.children(id).first().copied(),
            _ => None,
        }
    }

    pub fn invocation_args(&self, id: NodeId) -> &[NodeId] {
        match self.kind(id) {
            NodeKind::Invocation => self.children(id).get(1..).unwrap_or(&[]),
            _ => &[],
        }
    }

    /// Receiver of a member access.
    pub fn member_receiver(&self, id: NodeId) -> Option<NodeId> {
        match self.kind(id) {
            NodeKind::MemberAccess { .. } => self.children(id).first().copied(),
            _ => None,
        }
    }

    /// Name of an identifier or member access.
    pub fn name_of(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Ident { name, .. } | NodeKind::MemberAccess { name, .. } => Some(name),
            _ => None,
        }
    }

    /// `Parameter` children of a function-like node.
    pub fn params(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(move |&c| matches!(self.kind(c), NodeKind::Parameter { .. }))
    }

    /// Body of a function-like node: its last non-parameter child.
    pub fn body(&self, id: NodeId) -> Option<NodeId> {
        if !self.kind(id).is_function_like() {
            return None;
        }
        self.children(id)
            .last()
            .copied()
            .filter(|&c| !matches!(self.kind(c), NodeKind::Parameter { .. }))
    }

    /// Strip any number of `Paren` wrappers.
    pub fn unparen(&self, mut id: NodeId) -> NodeId {
        while matches!(self.kind(id), NodeKind::Paren) {
            match self.children(id).first() {
                Some(&inner) => id = inner,
                None => break,
            }
        }
        id
    }

    /// Indented textual dump of the subtree under `id`.
    pub fn dump(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, id, 0);
        out
    }

    fn dump_into(&self, out: &mut String, id: NodeId, depth: usize) {
        let node = &self[id];
        let detail = match &node.kind {
            NodeKind::Namespace { name }
            | NodeKind::Constructor { name }
            | NodeKind::Ident { name, .. }
            | NodeKind::MemberAccess { name, .. } => format!(" {}", name),
            NodeKind::UsingDirective { path } => format!(" {}", path),
            NodeKind::Class { name, bases, .. } if !bases.is_empty() => {
                let bases: Vec<String> = bases.iter().map(|b| b.to_string()).collect();
                format!(" {} : {}", name, bases.join(", "))
            }
            NodeKind::Class { name, .. } => format!(" {}", name),
            NodeKind::Field { name, ty } | NodeKind::Property { name, ty } => {
                format!(" {} {}", ty, name)
            }
            NodeKind::Method { name, ret, .. } => format!(" {} {}", ret, name),
            NodeKind::Parameter { name, ty: Some(ty) } => format!(" {} {}", ty, name),
            NodeKind::Parameter { name, ty: None } => format!(" {}", name),
            NodeKind::LocalDecl { name, ty, is_using } => format!(
                " {}{} {}",
                if *is_using { "using " } else { "" },
                ty.as_ref().map(|t| t.to_string()).unwrap_or_else(|| "var".to_string()),
                name
            ),
            NodeKind::ForEach { var, .. } => format!(" {}", var),
            NodeKind::ObjectCreation { ty } => format!(" {}", ty),
            NodeKind::Literal(lit) => format!(" {:?}", lit),
            NodeKind::Binary { op } => format!(" {}", op.symbol()),
            _ => String::new(),
        };
        let _ = writeln!(
            out,
            "{}{}{} @{}..{}",
            "  ".repeat(depth),
            node.kind.label(),
            detail,
            node.span.start,
            node.span.end
        );
        for &child in &node.children {
            self.dump_into(out, child, depth + 1);
        }
    }
}

impl Index<NodeId> for SyntaxTree {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }
}

/// Upward walk from a node to the root.
pub struct Ancestors<'a> {
    tree: &'a SyntaxTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

/// Pre-order walk over a subtree.
pub struct Descendants<'a> {
    tree: &'a SyntaxTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(current).iter().rev().copied());
        Some(current)
    }
}
