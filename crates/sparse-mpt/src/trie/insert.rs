//! Inserting an element into the trie.

use std::rc::Rc;

use crate::encoding::prefix_len;
use crate::error::TrieError;
use crate::store::NodeStore;

use super::node::{join_paths, FullNode, Node, NodeFlag};
use super::Trie;

impl<S: NodeStore> Trie<S> {
    /// Inserts `value` below `n` at the remaining `key` nibbles, returning
    /// whether the subtree changed and its replacement. `prefix` is the path
    /// consumed so far, reported on resolver misses.
    pub(super) fn insert_at(
        &self,
        n: &Node,
        prefix: &[u8],
        key: &[u8],
        value: Node,
    ) -> Result<(bool, Node), TrieError> {
        if key.is_empty() {
            // Writing the same value at an occupied terminal is a no-op.
            if let (Node::Value(old), Node::Value(new)) = (n, &value) {
                let dirty = old != new;
                return Ok((dirty, value));
            }
            return Ok((true, value));
        }
        match n {
            Node::Short(sn) => {
                let matchlen = prefix_len(key, &sn.key);
                // The whole short key matches: descend and rewrap.
                if matchlen == sn.key.len() {
                    let child_prefix = join_paths(prefix, &key[..matchlen]);
                    let (dirty, child) =
                        self.insert_at(&sn.val, &child_prefix, &key[matchlen..], value)?;
                    if !dirty {
                        return Ok((false, n.clone()));
                    }
                    return Ok((true, Node::short(sn.key.clone(), child)));
                }
                // The keys diverge: branch out at the first mismatch. Both
                // sides are pushed one nibble down into the new branch.
                let mut branch = FullNode::empty_dirty();
                let existing_prefix = join_paths(prefix, &sn.key[..matchlen + 1]);
                let (_, existing) = self.insert_at(
                    &Node::Empty,
                    &existing_prefix,
                    &sn.key[matchlen + 1..],
                    sn.val.clone(),
                )?;
                branch.children[sn.key[matchlen] as usize] = existing;

                let inserted_prefix = join_paths(prefix, &key[..matchlen + 1]);
                let (_, inserted) =
                    self.insert_at(&Node::Empty, &inserted_prefix, &key[matchlen + 1..], value)?;
                branch.children[key[matchlen] as usize] = inserted;

                let branch = Node::Full(Rc::new(branch));
                if matchlen == 0 {
                    return Ok((true, branch));
                }
                Ok((true, Node::short(key[..matchlen].to_vec(), branch)))
            }
            Node::Full(fnode) => {
                let idx = key[0] as usize;
                let child_prefix = join_paths(prefix, &key[..1]);
                let (dirty, child) =
                    self.insert_at(&fnode.children[idx], &child_prefix, &key[1..], value)?;
                if !dirty {
                    return Ok((false, n.clone()));
                }
                let mut copy = (**fnode).clone();
                copy.flags = NodeFlag::dirty();
                copy.children[idx] = child;
                Ok((true, Node::Full(Rc::new(copy))))
            }
            Node::Empty => Ok((true, Node::short(key.to_vec(), value))),
            Node::Hash(hash) => {
                // An unloaded subtree: materialize it and insert below it,
                // leaving the path to the value resolved in the new root.
                let resolved = self.resolve_hash(*hash, prefix)?;
                let (dirty, child) = self.insert_at(&resolved, prefix, key, value)?;
                if !dirty {
                    return Ok((false, resolved));
                }
                Ok((true, child))
            }
            Node::Value(_) => Err(TrieError::Invariant("value node on a non-terminal path")),
        }
    }
}
