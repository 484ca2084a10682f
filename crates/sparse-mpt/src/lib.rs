//! A sparse Merkle Patricia trie implementation.
//!
//! The trie maps arbitrary byte-string keys to byte-string values and folds
//! the whole map into a single keccak-256 root digest. Subtrees that have
//! been persisted to a [`NodeStore`] are held as 32-byte hash references and
//! materialized lazily when an operation walks into them.

pub mod encoding;
mod error;
mod store;
mod trie;

pub use alloy_primitives::{Bytes, B256};
pub use error::TrieError;
pub use store::{MemoryStore, NodeStore};
pub use trie::{verify_proof, CommittedLeaf, LeafCallback, Trie, EMPTY_ROOT};
