//! Error types surfaced by trie operations.

use alloy_primitives::{hex, B256};
use thiserror::Error;

/// Trie error kinds.
///
/// Operations that hit an error leave the trie state unchanged; commit may
/// leave partial writes in the store but never advances the root pointer.
#[derive(Error, Debug)]
pub enum TrieError {
    /// The resolver could not find a referenced node in the backing store.
    #[error("missing trie node {hash} (path {})", hex::encode(.path))]
    MissingNode { hash: B256, path: Vec<u8> },

    /// A node's encoding violated the wire grammar.
    #[error("invalid node encoding: {0}")]
    Decode(#[from] alloy_rlp::Error),

    /// A structural invariant did not hold on a node read back from the
    /// store, indicating corruption.
    #[error("trie invariant violated: {0}")]
    Invariant(&'static str),

    /// The backing store refused a write during commit.
    #[error("store write failed: {0}")]
    Store(String),

    /// Empty values cannot be inserted.
    #[error("empty value")]
    EmptyValue,
}
