//! Backing-store contract for persisted trie nodes.

use alloy_primitives::map::{FbBuildHasher, HashMap};
use alloy_primitives::{Bytes, B256};

use crate::error::TrieError;

/// Hash-keyed map with a fixed-bytes hasher. Defined locally to keep the
/// concrete hasher choice out of the public trait.
type B256Map<V> = HashMap<B256, V, FbBuildHasher<32>>;

/// A content-addressed node store.
///
/// The store is authoritative: a node retrieved under a hash is never
/// rehashed by the trie. Its lifetime must outlive every trie opened on it.
pub trait NodeStore {
    /// Looks up the encoded node stored under `hash`.
    fn node(&self, hash: &B256) -> Option<Bytes>;

    /// Persists an encoded node under its hash.
    fn put(&mut self, hash: B256, enc: Bytes) -> Result<(), TrieError>;
}

/// In-memory reference store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    nodes: B256Map<Bytes>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drops a stored node. Useful for simulating store corruption.
    pub fn remove(&mut self, hash: &B256) -> Option<Bytes> {
        self.nodes.remove(hash)
    }
}

impl NodeStore for MemoryStore {
    fn node(&self, hash: &B256) -> Option<Bytes> {
        self.nodes.get(hash).cloned()
    }

    fn put(&mut self, hash: B256, enc: Bytes) -> Result<(), TrieError> {
        self.nodes.insert(hash, enc);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::keccak256;

    #[test]
    fn memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        assert!(store.is_empty());

        let enc = Bytes::from(vec![0xc2, 0x80, 0x80]);
        let hash = keccak256(&enc);
        store.put(hash, enc.clone()).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.node(&hash), Some(enc));
        assert_eq!(store.node(&B256::ZERO), None);

        store.remove(&hash);
        assert!(store.is_empty());
    }
}
