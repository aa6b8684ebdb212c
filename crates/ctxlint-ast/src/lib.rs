// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Syntax tree types for the ctxlint analyzer.
//!
//! The tree is arena-indexed: every node lives in one `Vec` owned by a
//! `SyntaxTree` and records its parent, so upward walks (enclosing scope,
//! enclosing call) are plain index chasing with no allocation.

pub mod kind;
pub mod span;
pub mod token;
pub mod tree;

pub use kind::{BinOp, Literal, NodeKind, TypeSyntax, UnaryOp};
pub use span::{LineMap, Span};
pub use tree::{Ancestors, Node, SyntaxTree};

/// Index of a node inside its `SyntaxTree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(pub u32);

impl NodeId {
    pub const DUMMY: NodeId = NodeId(u32::MAX);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}
