//! Looking up an element by its nibble path.

use std::rc::Rc;

use alloy_primitives::Bytes;

use crate::error::TrieError;
use crate::store::NodeStore;

use super::node::Node;
use super::Trie;

impl<S: NodeStore> Trie<S> {
    /// Walks `key` from `pos` below `n`. Returns the value if present, the
    /// (possibly rewritten) subtree, and whether a hash reference was
    /// materialized along the way; in that case the caller installs the
    /// rewritten edge so the work is not repeated.
    pub(super) fn get_at(
        &self,
        n: &Node,
        key: &[u8],
        pos: usize,
    ) -> Result<(Option<Bytes>, Node, bool), TrieError> {
        match n {
            Node::Empty => Ok((None, Node::Empty, false)),
            Node::Value(value) => Ok((Some(value.clone()), n.clone(), false)),
            Node::Short(sn) => {
                if key.len() - pos < sn.key.len() || sn.key[..] != key[pos..pos + sn.key.len()] {
                    // Key not in the trie.
                    return Ok((None, n.clone(), false));
                }
                let (value, child, did_resolve) =
                    self.get_at(&sn.val, key, pos + sn.key.len())?;
                if !did_resolve {
                    return Ok((value, n.clone(), false));
                }
                let mut copy = (**sn).clone();
                copy.val = child;
                Ok((value, Node::Short(Rc::new(copy)), true))
            }
            Node::Full(fnode) => {
                let idx = key[pos] as usize;
                let (value, child, did_resolve) = self.get_at(&fnode.children[idx], key, pos + 1)?;
                if !did_resolve {
                    return Ok((value, n.clone(), false));
                }
                let mut copy = (**fnode).clone();
                copy.children[idx] = child;
                Ok((value, Node::Full(Rc::new(copy)), true))
            }
            Node::Hash(hash) => {
                let resolved = self.resolve_hash(*hash, &key[..pos])?;
                let (value, child, _) = self.get_at(&resolved, key, pos)?;
                Ok((value, child, true))
            }
        }
    }
}
