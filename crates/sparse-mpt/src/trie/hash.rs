//! Folding a tree into its hashed form.
//!
//! `hash` turns a (possibly partially hashed) subtree into the pair
//! `(hashed, cached)`: the externally visible form and a materialized copy
//! with the hash memo filled in. A node whose encoding is smaller than a
//! hash stays embedded in its parent; `force` overrides that at the root,
//! which is always reported as a hash.

use std::rc::Rc;

use alloy_primitives::keccak256;

use super::node::{FullNode, Node, NodeFlag, ShortNode};
use super::rlp;

pub(super) fn hash(n: &Node, force: bool) -> (Node, Node) {
    match n {
        Node::Short(sn) => {
            if let (Some(cached), false) = (sn.flags.hash, sn.flags.dirty) {
                return (Node::Hash(cached), n.clone());
            }
            let (val_hashed, val_cached) = match &sn.val {
                child @ (Node::Short(_) | Node::Full(_)) => hash(child, false),
                other => (other.clone(), other.clone()),
            };
            let collapsed = ShortNode {
                key: sn.key.clone(),
                val: val_hashed,
                flags: NodeFlag::default(),
            };
            let enc = rlp::encode_short(&collapsed);
            let mut cached = ShortNode {
                key: sn.key.clone(),
                val: val_cached,
                flags: NodeFlag::default(),
            };
            if enc.len() < 32 && !force {
                (Node::Short(Rc::new(collapsed)), Node::Short(Rc::new(cached)))
            } else {
                let digest = keccak256(&enc);
                cached.flags.hash = Some(digest);
                (Node::Hash(digest), Node::Short(Rc::new(cached)))
            }
        }
        Node::Full(fnode) => {
            if let (Some(cached), false) = (fnode.flags.hash, fnode.flags.dirty) {
                return (Node::Hash(cached), n.clone());
            }
            let mut collapsed_children: [Node; 17] = std::array::from_fn(|_| Node::Empty);
            let mut cached_children: [Node; 17] = std::array::from_fn(|_| Node::Empty);
            for (i, child) in fnode.children.iter().enumerate().take(16) {
                match child {
                    Node::Empty => {}
                    subtree @ (Node::Short(_) | Node::Full(_)) => {
                        let (child_hashed, child_cached) = hash(subtree, false);
                        collapsed_children[i] = child_hashed;
                        cached_children[i] = child_cached;
                    }
                    other => {
                        collapsed_children[i] = other.clone();
                        cached_children[i] = other.clone();
                    }
                }
            }
            collapsed_children[16] = fnode.children[16].clone();
            cached_children[16] = fnode.children[16].clone();

            let collapsed = FullNode {
                children: collapsed_children,
                flags: NodeFlag::default(),
            };
            let enc = rlp::encode_full(&collapsed);
            let mut cached = FullNode {
                children: cached_children,
                flags: NodeFlag::default(),
            };
            if enc.len() < 32 && !force {
                (Node::Full(Rc::new(collapsed)), Node::Full(Rc::new(cached)))
            } else {
                let digest = keccak256(&enc);
                cached.flags.hash = Some(digest);
                (Node::Hash(digest), Node::Full(Rc::new(cached)))
            }
        }
        // Value and hash nodes have no children to fold.
        other => (other.clone(), other.clone()),
    }
}
