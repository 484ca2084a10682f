//! The four node variants the trie is built from.
//!
//! A short node collapses a run of single-child transitions and is a leaf
//! when its key carries the terminator nibble, an extension otherwise. A
//! full node is a genuine 17-way fan-out: slots 0..16 index the next nibble,
//! slot 16 holds the value terminating at this exact path. Hash nodes stand
//! in for subtrees that live only in the backing store.

use std::rc::Rc;

use alloy_primitives::{Bytes, B256};

/// A trie node. Short and full nodes share subtrees by reference; cloning a
/// `Node` is cheap and mutation paths copy the nodes they rewrite.
#[derive(Debug, Clone, Default)]
pub(crate) enum Node {
    #[default]
    Empty,
    Value(Bytes),
    Hash(B256),
    Short(Rc<ShortNode>),
    Full(Rc<FullNode>),
}

/// Leaf or extension: a nibble key and a single child.
#[derive(Debug, Clone)]
pub(crate) struct ShortNode {
    pub(crate) key: Vec<u8>,
    pub(crate) val: Node,
    pub(crate) flags: NodeFlag,
}

/// 17-slot branch. Slots 0..16 are subtries, slot 16 the value.
#[derive(Debug, Clone)]
pub(crate) struct FullNode {
    pub(crate) children: [Node; 17],
    pub(crate) flags: NodeFlag,
}

/// Per-node hash memo and mutation marker. The hash is filled when the node
/// is hashed and is not part of structural identity; the dirty bit is set by
/// mutations and cleared once the node has been hashed.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct NodeFlag {
    pub(crate) hash: Option<B256>,
    pub(crate) dirty: bool,
}

impl NodeFlag {
    pub(crate) fn dirty() -> Self {
        Self { hash: None, dirty: true }
    }
}

impl Node {
    /// A freshly built (dirty) short node.
    pub(crate) fn short(key: Vec<u8>, val: Node) -> Self {
        Node::Short(Rc::new(ShortNode { key, val, flags: NodeFlag::dirty() }))
    }

    /// Cached hash and dirty marker. Value, hash and empty nodes carry no
    /// flags and always report clean.
    pub(crate) fn cached(&self) -> (Option<B256>, bool) {
        match self {
            Node::Short(n) => (n.flags.hash, n.flags.dirty),
            Node::Full(n) => (n.flags.hash, n.flags.dirty),
            Node::Empty | Node::Value(_) | Node::Hash(_) => (None, false),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        matches!(self, Node::Empty)
    }
}

impl FullNode {
    pub(crate) fn empty_dirty() -> Self {
        Self {
            children: std::array::from_fn(|_| Node::Empty),
            flags: NodeFlag::dirty(),
        }
    }
}

/// Concatenates two nibble paths into a fresh buffer. Key slices are shared
/// between nodes, so in-place extension is never safe here.
pub(crate) fn join_paths(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    out.extend_from_slice(a);
    out.extend_from_slice(b);
    out
}
