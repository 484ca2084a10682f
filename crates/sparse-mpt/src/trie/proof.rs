//! Merkle proofs of membership and absence.

use alloy_primitives::map::{FbBuildHasher, HashMap};
use alloy_primitives::{keccak256, Bytes, B256};

use crate::encoding::keybytes_to_hex;
use crate::error::TrieError;
use crate::store::NodeStore;

use super::node::{FullNode, Node, NodeFlag, ShortNode};
use super::{hash, rlp, Trie};

impl<S: NodeStore> Trie<S> {
    /// Collects the proof for `key`: the encoded collapsed forms of the
    /// nodes on the walk from the root to the first node that no longer
    /// matches the key. The root is always included; deeper nodes only when
    /// their encoding reaches hash size, since those are exactly the entries
    /// a verifier replays by hash.
    pub fn proof(&self, key: &[u8]) -> Result<Vec<Bytes>, TrieError> {
        let hex_key = keybytes_to_hex(key);
        let mut rest: &[u8] = &hex_key;
        let mut tn = self.root.clone();
        let mut nodes = Vec::new();
        while !rest.is_empty() && !tn.is_empty() {
            match tn {
                Node::Short(sn) => {
                    if rest.len() < sn.key.len() || sn.key[..] != rest[..sn.key.len()] {
                        // The trie does not contain the key.
                        tn = Node::Empty;
                    } else {
                        tn = sn.val.clone();
                        rest = &rest[sn.key.len()..];
                    }
                    nodes.push(Node::Short(sn));
                }
                Node::Full(fnode) => {
                    tn = fnode.children[rest[0] as usize].clone();
                    rest = &rest[1..];
                    nodes.push(Node::Full(fnode));
                }
                Node::Hash(digest) => {
                    let consumed = hex_key.len() - rest.len();
                    tn = self.resolve_hash(digest, &hex_key[..consumed])?;
                }
                Node::Value(_) | Node::Empty => break,
            }
        }

        let mut proof = Vec::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            let enc = collapsed_encoding(node);
            if i == 0 || enc.len() >= 32 {
                proof.push(Bytes::from(enc));
            }
        }
        Ok(proof)
    }
}

// Encodes a node with each child subtree replaced by its hashed form, i.e.
// the exact bytes the node hashes to.
fn collapsed_encoding(n: &Node) -> Vec<u8> {
    match n {
        Node::Short(sn) => {
            let val = match &sn.val {
                child @ (Node::Short(_) | Node::Full(_)) => hash::hash(child, false).0,
                other => other.clone(),
            };
            rlp::encode_short(&ShortNode {
                key: sn.key.clone(),
                val,
                flags: NodeFlag::default(),
            })
        }
        Node::Full(fnode) => {
            let mut children: [Node; 17] = std::array::from_fn(|_| Node::Empty);
            for (i, child) in fnode.children.iter().enumerate().take(16) {
                children[i] = match child {
                    subtree @ (Node::Short(_) | Node::Full(_)) => hash::hash(subtree, false).0,
                    other => other.clone(),
                };
            }
            children[16] = fnode.children[16].clone();
            rlp::encode_full(&FullNode {
                children,
                flags: NodeFlag::default(),
            })
        }
        other => rlp::encode_node(other),
    }
}

/// Replays `proof` against `root`, following `key`. Returns the proven value
/// or `None` when the proof shows the key is absent; a proof that does not
/// connect back to `root` is an error.
pub fn verify_proof(root: B256, key: &[u8], proof: &[Bytes]) -> Result<Option<Bytes>, TrieError> {
    let mut by_hash: HashMap<B256, &Bytes, FbBuildHasher<32>> = HashMap::default();
    for enc in proof {
        by_hash.insert(keccak256(enc), enc);
    }

    let hex_key = keybytes_to_hex(key);
    let mut pos = 0usize;
    let enc = by_hash.get(&root).ok_or(TrieError::MissingNode {
        hash: root,
        path: Vec::new(),
    })?;
    let mut node = rlp::decode_node(Some(root), enc)?;
    loop {
        match node {
            Node::Short(sn) => {
                if hex_key.len() - pos < sn.key.len()
                    || sn.key[..] != hex_key[pos..pos + sn.key.len()]
                {
                    return Ok(None);
                }
                pos += sn.key.len();
                node = sn.val.clone();
            }
            Node::Full(fnode) => {
                if pos >= hex_key.len() {
                    return Ok(None);
                }
                node = fnode.children[hex_key[pos] as usize].clone();
                pos += 1;
            }
            Node::Value(value) => return Ok(Some(value)),
            Node::Empty => return Ok(None),
            Node::Hash(digest) => {
                let enc = by_hash.get(&digest).ok_or_else(|| TrieError::MissingNode {
                    hash: digest,
                    path: hex_key[..pos].to_vec(),
                })?;
                node = rlp::decode_node(Some(digest), enc)?;
            }
        }
    }
}
