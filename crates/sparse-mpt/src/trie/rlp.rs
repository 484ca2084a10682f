//! Wire encoding of trie nodes on top of the RLP codec.
//!
//! A short node encodes as a two-item list (compact key, child reference), a
//! full node as a 17-item list. A child reference is a 32-byte string (hash),
//! an empty string (absent), or the nested encoding of a node smaller than a
//! hash. Encoded forms are canonical: equal nodes produce identical bytes.

use std::rc::Rc;

use alloy_primitives::{Bytes, B256};
use alloy_rlp::{Encodable, Header, PayloadView, EMPTY_STRING_CODE};

use crate::encoding::{compact_to_hex, has_term, hex_to_compact};
use crate::error::TrieError;

use super::node::{FullNode, Node, NodeFlag, ShortNode};

pub(super) fn encode_node(n: &Node) -> Vec<u8> {
    match n {
        Node::Short(sn) => encode_short(sn),
        Node::Full(fnode) => encode_full(fnode),
        other => encode_ref(other),
    }
}

pub(super) fn encode_short(n: &ShortNode) -> Vec<u8> {
    let compact = hex_to_compact(&n.key);
    let child = encode_ref(&n.val);
    let mut out = encode_list_header(compact.as_slice().length() + child.len());
    compact.as_slice().encode(&mut out);
    out.extend_from_slice(&child);
    out
}

pub(super) fn encode_full(n: &FullNode) -> Vec<u8> {
    let mut payload = Vec::new();
    for child in &n.children[..16] {
        payload.extend_from_slice(&encode_ref(child));
    }
    match &n.children[16] {
        Node::Value(value) => value.as_ref().encode(&mut payload),
        _ => payload.push(EMPTY_STRING_CODE),
    }
    let mut out = encode_list_header(payload.len());
    out.extend_from_slice(&payload);
    out
}

// Encodes a child reference of a collapsed node. Short and full children are
// embedded; the hasher guarantees they are smaller than a hash.
fn encode_ref(n: &Node) -> Vec<u8> {
    match n {
        Node::Empty => vec![EMPTY_STRING_CODE],
        Node::Hash(hash) => {
            let mut out = Vec::with_capacity(33);
            hash.as_slice().encode(&mut out);
            out
        }
        Node::Value(value) => {
            let mut out = Vec::with_capacity(value.len() + 1);
            value.as_ref().encode(&mut out);
            out
        }
        Node::Short(sn) => encode_short(sn),
        Node::Full(fnode) => encode_full(fnode),
    }
}

// Encodes a list header for a known payload length, reserving memory.
fn encode_list_header(payload_length: usize) -> Vec<u8> {
    let header = Header { list: true, payload_length };
    let mut out = Vec::with_capacity(header.length() + payload_length);
    header.encode(&mut out);
    out
}

/// Decodes an encoded node, stamping `hash` into its cache field so the
/// digest need not be recomputed for a node read back from the store.
pub(super) fn decode_node(hash: Option<B256>, buf: &[u8]) -> Result<Node, TrieError> {
    if buf.is_empty() {
        return Err(alloy_rlp::Error::InputTooShort.into());
    }
    let mut view = buf;
    match Header::decode_raw(&mut view)? {
        PayloadView::List(items) => match items.len() {
            2 => decode_short(hash, &items),
            17 => decode_full(hash, &items),
            _ => Err(alloy_rlp::Error::Custom("invalid number of list elements").into()),
        },
        PayloadView::String(_) => {
            Err(alloy_rlp::Error::Custom("node encoding is not a list").into())
        }
    }
}

fn decode_short(hash: Option<B256>, items: &[&[u8]]) -> Result<Node, TrieError> {
    let mut key_item = items[0];
    let compact = Header::decode_bytes(&mut key_item, false)?;
    let key = compact_to_hex(compact);
    if key.is_empty() {
        return Err(alloy_rlp::Error::Custom("empty key in short node").into());
    }
    let flags = NodeFlag { hash, dirty: false };
    let val = if has_term(&key) {
        let mut val_item = items[1];
        let value = Header::decode_bytes(&mut val_item, false)?;
        Node::Value(Bytes::copy_from_slice(value))
    } else {
        let child = decode_ref(items[1])?;
        if child.is_empty() {
            return Err(alloy_rlp::Error::Custom("empty child in extension node").into());
        }
        child
    };
    Ok(Node::Short(Rc::new(ShortNode { key, val, flags })))
}

fn decode_full(hash: Option<B256>, items: &[&[u8]]) -> Result<Node, TrieError> {
    let mut children: [Node; 17] = std::array::from_fn(|_| Node::Empty);
    for (i, item) in items[..16].iter().enumerate() {
        children[i] = decode_ref(item)?;
    }
    let mut val_item = items[16];
    let value = Header::decode_bytes(&mut val_item, false)?;
    if !value.is_empty() {
        children[16] = Node::Value(Bytes::copy_from_slice(value));
    }
    if children.iter().filter(|child| !child.is_empty()).count() < 2 {
        return Err(TrieError::Invariant("branch node with fewer than two children"));
    }
    Ok(Node::Full(Rc::new(FullNode {
        children,
        flags: NodeFlag { hash, dirty: false },
    })))
}

fn decode_ref(item: &[u8]) -> Result<Node, TrieError> {
    let mut view = item;
    match Header::decode_raw(&mut view)? {
        PayloadView::String(payload) => match payload.len() {
            0 => Ok(Node::Empty),
            32 => Ok(Node::Hash(B256::from_slice(payload))),
            _ => Err(alloy_rlp::Error::Custom("child reference is neither empty nor a hash").into()),
        },
        PayloadView::List(_) => {
            // An embedded node must be smaller than a hash.
            if item.len() >= 32 {
                return Err(alloy_rlp::Error::Custom("oversized embedded node").into());
            }
            decode_node(None, item)
        }
    }
}
