//! Persisting the hashed tree into the backing store.
//!
//! The walk runs on the calling thread and writes every node whose encoding
//! reached hash size. When a leaf callback is registered, leaf events flow
//! through a bounded channel into a single background worker so the walk is
//! never blocked by user code; the channel is closed after the walk and the
//! worker joined before commit returns.

use std::rc::Rc;
use std::sync::mpsc::{self, SyncSender};
use std::thread;

use alloy_primitives::{keccak256, Bytes, B256};
use tracing::trace;

use crate::encoding::hex_to_keybytes;
use crate::error::TrieError;
use crate::store::NodeStore;

use super::node::{FullNode, Node, NodeFlag, ShortNode};
use super::{rlp, Trie};

/// A leaf observed while its enclosing node was persisted.
#[derive(Debug, Clone)]
pub struct CommittedLeaf {
    /// Key bytes of the leaf.
    pub path: Vec<u8>,
    /// The stored value.
    pub value: Bytes,
    /// Hash of the persisted node the value hangs off.
    pub parent: B256,
}

/// Invoked on the commit worker for every persisted leaf, in depth-first
/// left-to-right order of the walk.
pub type LeafCallback = Box<dyn FnMut(CommittedLeaf) + Send>;

// Producer blocks once this many leaf events are in flight.
const LEAF_CHAN_SIZE: usize = 200;

impl<S: NodeStore> Trie<S> {
    /// Hashes the trie and writes every dirty node whose encoding is at
    /// least hash size to the store, keyed by its digest. A clean root makes
    /// this a no-op: no writes, no leaf events. Returns the root hash and
    /// leaves the trie rooted at a hash reference; a store failure leaves
    /// partial writes behind but does not advance the root pointer.
    pub fn commit(&mut self, onleaf: Option<LeafCallback>) -> Result<B256, TrieError> {
        // Read the marker before hashing, which clears it on the cached
        // copies. A clean root may still be materialized from earlier reads.
        let (_, dirty) = self.root.cached();
        let root_hash = self.hash();
        if !dirty {
            return Ok(root_hash);
        }

        let (leaf_tx, worker) = match onleaf {
            Some(mut callback) => {
                let (tx, rx) = mpsc::sync_channel::<CommittedLeaf>(LEAF_CHAN_SIZE);
                let handle = thread::spawn(move || {
                    for leaf in rx {
                        callback(leaf);
                    }
                });
                (Some(tx), Some(handle))
            }
            None => (None, None),
        };

        let root = self.root.clone();
        let mut committer = Committer { db: &mut self.db, leaf_tx };
        let mut path = Vec::new();
        let result = committer.commit(&mut path, &root);

        // Dropping the committer closes the channel; the worker drains what
        // is left and exits.
        drop(committer);
        if let Some(handle) = worker {
            handle
                .join()
                .map_err(|_| TrieError::Store("leaf worker panicked".into()))?;
        }

        match result? {
            Node::Hash(digest) => {
                debug_assert_eq!(digest, root_hash);
                self.root = Node::Hash(digest);
                Ok(root_hash)
            }
            _ => Err(TrieError::Invariant("commit produced an unhashed root")),
        }
    }
}

struct Committer<'a, S: NodeStore> {
    db: &'a mut S,
    leaf_tx: Option<SyncSender<CommittedLeaf>>,
}

impl<S: NodeStore> Committer<'_, S> {
    /// Writes the subtree under `n`, children first, and returns the node's
    /// collapsed replacement: its hash reference if it was stored, the
    /// embedded node otherwise. `path` tracks the hex prefix for leaf
    /// events.
    fn commit(&mut self, path: &mut Vec<u8>, n: &Node) -> Result<Node, TrieError> {
        match n {
            Node::Short(sn) => {
                path.extend_from_slice(&sn.key);
                let val = self.commit(path, &sn.val)?;
                let collapsed = Node::Short(Rc::new(ShortNode {
                    key: sn.key.clone(),
                    val,
                    flags: NodeFlag::default(),
                }));
                let out = match sn.flags.hash {
                    Some(digest) => {
                        self.store(digest, &collapsed)?;
                        if let (Some(tx), Node::Value(value)) = (&self.leaf_tx, &sn.val) {
                            let leaf = CommittedLeaf {
                                path: hex_to_keybytes(path),
                                value: value.clone(),
                                parent: digest,
                            };
                            tx.send(leaf)
                                .map_err(|_| TrieError::Store("leaf channel closed".into()))?;
                        }
                        Node::Hash(digest)
                    }
                    None => collapsed,
                };
                path.truncate(path.len() - sn.key.len());
                Ok(out)
            }
            Node::Full(fnode) => {
                let mut children: [Node; 17] = std::array::from_fn(|_| Node::Empty);
                for (i, child) in fnode.children.iter().enumerate().take(16) {
                    if child.is_empty() {
                        continue;
                    }
                    path.push(i as u8);
                    children[i] = self.commit(path, child)?;
                    path.pop();
                }
                children[16] = fnode.children[16].clone();
                let collapsed = Node::Full(Rc::new(FullNode {
                    children,
                    flags: NodeFlag::default(),
                }));
                match fnode.flags.hash {
                    Some(digest) => {
                        self.store(digest, &collapsed)?;
                        Ok(Node::Hash(digest))
                    }
                    None => Ok(collapsed),
                }
            }
            // Hash references are already persisted; values are embedded in
            // their parent encoding.
            other => Ok(other.clone()),
        }
    }

    fn store(&mut self, digest: B256, collapsed: &Node) -> Result<(), TrieError> {
        let enc = rlp::encode_node(collapsed);
        debug_assert_eq!(keccak256(&enc), digest);
        trace!(hash = %digest, len = enc.len(), "storing trie node");
        self.db.put(digest, enc.into())
    }
}
