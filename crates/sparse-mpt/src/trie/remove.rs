//! Removing an element, reducing the tree to minimal form on the way up.

use std::rc::Rc;

use crate::encoding::prefix_len;
use crate::error::TrieError;
use crate::store::NodeStore;

use super::node::{join_paths, Node, NodeFlag};
use super::Trie;

impl<S: NodeStore> Trie<S> {
    /// Deletes the remaining `key` nibbles below `n`. Nodes on the way up
    /// are simplified so that no short node ever points at another short
    /// node and every surviving branch keeps at least two occupants.
    pub(super) fn delete_at(
        &self,
        n: &Node,
        prefix: &[u8],
        key: &[u8],
    ) -> Result<(bool, Node), TrieError> {
        match n {
            Node::Short(sn) => {
                let matchlen = prefix_len(key, &sn.key);
                if matchlen < sn.key.len() {
                    // The key is not in the trie.
                    return Ok((false, n.clone()));
                }
                if matchlen == key.len() {
                    // Whole match: the node disappears.
                    return Ok((true, Node::Empty));
                }
                // The key is longer than the short key; delete from the
                // subtrie. The child cannot vanish entirely since it holds
                // at least two values with longer keys.
                let child_prefix = join_paths(prefix, &key[..sn.key.len()]);
                let (dirty, child) =
                    self.delete_at(&sn.val, &child_prefix, &key[sn.key.len()..])?;
                if !dirty {
                    return Ok((false, n.clone()));
                }
                match &child {
                    Node::Short(csn) => {
                        // The subtrie reduced to another short node: merge
                        // the keys so no short->short chain survives.
                        let merged = join_paths(&sn.key, &csn.key);
                        Ok((true, Node::short(merged, csn.val.clone())))
                    }
                    _ => Ok((true, Node::short(sn.key.clone(), child))),
                }
            }
            Node::Full(fnode) => {
                let idx = key[0] as usize;
                let child_prefix = join_paths(prefix, &key[..1]);
                let (dirty, child) =
                    self.delete_at(&fnode.children[idx], &child_prefix, &key[1..])?;
                if !dirty {
                    return Ok((false, n.clone()));
                }
                let mut copy = (**fnode).clone();
                copy.flags = NodeFlag::dirty();
                copy.children[idx] = child;

                // The branch held at least two occupants before the delete,
                // so it cannot empty out; if exactly one remains the branch
                // collapses into a short node. `pos` is the surviving slot,
                // or -2 when two or more remain.
                let mut pos: i32 = -1;
                for (i, child) in copy.children.iter().enumerate() {
                    if !child.is_empty() {
                        if pos == -1 {
                            pos = i as i32;
                        } else {
                            pos = -2;
                            break;
                        }
                    }
                }
                if pos >= 0 {
                    let pos = pos as usize;
                    if pos != 16 {
                        // If the survivor is a short node it absorbs the
                        // branch slot nibble instead of being wrapped, which
                        // would create a short->short chain. It may still be
                        // unloaded, so resolve it just for this check.
                        let survivor = self.resolve(&copy.children[pos], prefix)?;
                        if let Node::Short(csn) = &survivor {
                            let merged = join_paths(&[pos as u8], &csn.key);
                            return Ok((true, Node::short(merged, csn.val.clone())));
                        }
                    }
                    // Otherwise wrap the survivor in a one-nibble short node
                    // (key [16] when only the branch value remains).
                    return Ok((true, Node::short(vec![pos as u8], copy.children[pos].clone())));
                }
                Ok((true, Node::Full(Rc::new(copy))))
            }
            Node::Value(_) => Ok((true, Node::Empty)),
            Node::Empty => Ok((false, Node::Empty)),
            Node::Hash(hash) => {
                let resolved = self.resolve_hash(*hash, prefix)?;
                let (dirty, child) = self.delete_at(&resolved, prefix, key)?;
                if !dirty {
                    return Ok((false, resolved));
                }
                Ok((true, child))
            }
        }
    }
}
