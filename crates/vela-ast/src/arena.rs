//! Flat node storage.
//!
//! Nodes are allocated once by the parser (or a test builder) and
//! addressed by index; the resolver caches per-node results keyed by
//! `NodeIndex`, so indices must stay stable for a session.

use crate::node::{Node, NodeKind};
use vela_common::Span;

/// Index of a node within a `NodeArena`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub u32);

#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, span: Span, kind: NodeKind) -> NodeIndex {
        let idx = NodeIndex(self.nodes.len() as u32);
        self.nodes.push(Node { span, kind });
        idx
    }

    pub fn get(&self, idx: NodeIndex) -> &Node {
        &self.nodes[idx.0 as usize]
    }

    pub fn kind(&self, idx: NodeIndex) -> &NodeKind {
        &self.get(idx).kind
    }

    pub fn span(&self, idx: NodeIndex) -> Span {
        self.get(idx).span
    }

    /// Rewrite a node's kind in place. Used by tree builders to flip
    /// declaration flags after construction; indices stay stable.
    pub fn replace_kind(&mut self, idx: NodeIndex, kind: NodeKind) {
        self.nodes[idx.0 as usize].kind = kind;
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}
