//! The public trie API and the node resolver.

use alloy_primitives::{hex, Bytes, B256};
use alloy_trie::EMPTY_ROOT_HASH;
use tracing::debug;

use crate::encoding::keybytes_to_hex;
use crate::error::TrieError;
use crate::store::NodeStore;

use super::node::Node;
use super::{hash, rlp, Trie};

/// Root digest of the empty trie: the digest of the RLP encoding of the
/// empty byte string.
pub const EMPTY_ROOT: B256 = EMPTY_ROOT_HASH;

impl<S: NodeStore> Trie<S> {
    /// Opens the trie rooted at `root` over `db`. A zero or [`EMPTY_ROOT`]
    /// root opens an empty trie; any other root must be present in the
    /// store.
    pub fn new(root: B256, db: S) -> Result<Self, TrieError> {
        let mut trie = Trie { root: Node::Empty, db };
        if root != EMPTY_ROOT && root != B256::ZERO {
            trie.root = trie.resolve_hash(root, &[])?;
        }
        Ok(trie)
    }

    /// Returns the value stored under `key`, materializing stored subtrees
    /// on the way down as needed.
    pub fn get(&mut self, key: &[u8]) -> Result<Option<Bytes>, TrieError> {
        let hex_key = keybytes_to_hex(key);
        let root = self.root.clone();
        let (value, new_root, did_resolve) = self.get_at(&root, &hex_key, 0)?;
        if did_resolve {
            self.root = new_root;
        }
        Ok(value)
    }

    /// Inserts `value` under `key`, replacing any previous value. Empty
    /// values are rejected.
    pub fn put(&mut self, key: &[u8], value: impl Into<Bytes>) -> Result<(), TrieError> {
        let value = value.into();
        if value.is_empty() {
            return Err(TrieError::EmptyValue);
        }
        let hex_key = keybytes_to_hex(key);
        let root = self.root.clone();
        let (_, new_root) = self.insert_at(&root, &[], &hex_key, Node::Value(value))?;
        self.root = new_root;
        Ok(())
    }

    /// Removes any value stored under `key`.
    pub fn delete(&mut self, key: &[u8]) -> Result<(), TrieError> {
        let hex_key = keybytes_to_hex(key);
        let root = self.root.clone();
        let (_, new_root) = self.delete_at(&root, &[], &hex_key)?;
        self.root = new_root;
        Ok(())
    }

    /// Returns the root hash. Does not write to the store; the in-memory
    /// tree keeps the computed digests as memos.
    pub fn hash(&mut self) -> B256 {
        let (hashed, cached) = self.hash_root();
        self.root = cached;
        match hashed {
            Node::Hash(digest) => digest,
            _ => unreachable!("the root is always hashed"),
        }
    }

    fn hash_root(&self) -> (Node, Node) {
        if self.root.is_empty() {
            return (Node::Hash(EMPTY_ROOT), Node::Empty);
        }
        hash::hash(&self.root, true)
    }

    /// The backing store.
    pub fn db(&self) -> &S {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut S {
        &mut self.db
    }

    pub(super) fn resolve(&self, n: &Node, prefix: &[u8]) -> Result<Node, TrieError> {
        match n {
            Node::Hash(hash) => self.resolve_hash(*hash, prefix),
            other => Ok(other.clone()),
        }
    }

    /// Materializes the node stored under `hash`. The stored digest is
    /// stamped into the decoded node so it is never recomputed.
    pub(super) fn resolve_hash(&self, hash: B256, prefix: &[u8]) -> Result<Node, TrieError> {
        match self.db.node(&hash) {
            Some(enc) => rlp::decode_node(Some(hash), &enc),
            None => {
                debug!(%hash, path = %hex::encode(prefix), "trie node missing in store");
                Err(TrieError::MissingNode { hash, path: prefix.to_vec() })
            }
        }
    }
}
