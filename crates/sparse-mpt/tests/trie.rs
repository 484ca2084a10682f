//! End-to-end trie scenarios, checked against the published keccak-256 MPT
//! root vectors and differentially against an independent root builder.

use std::collections::BTreeMap;

use alloy_primitives::{b256, keccak256, Bytes, B256};
use alloy_trie::{HashBuilder, Nibbles};
use sparse_mpt::{verify_proof, MemoryStore, NodeStore, Trie, TrieError, EMPTY_ROOT};

fn new_empty() -> Trie<MemoryStore> {
    Trie::new(EMPTY_ROOT, MemoryStore::new()).unwrap()
}

fn put_str(trie: &mut Trie<MemoryStore>, key: &str, value: &str) {
    trie.put(key.as_bytes(), Bytes::copy_from_slice(value.as_bytes()))
        .unwrap();
}

#[test]
fn empty_trie_root() {
    let mut trie = new_empty();
    assert_eq!(trie.hash(), EMPTY_ROOT);
    assert_eq!(
        EMPTY_ROOT,
        b256!("56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421")
    );
}

#[test]
fn insert_matches_known_root_and_is_order_independent() {
    let entries = [
        ("doe", "reindeer"),
        ("dog", "puppy"),
        ("dogglesworth", "cat"),
    ];
    let expected = b256!("8aad789dff2f538bca5d8ea56e8abe10f4c7ba3a5dea95fea4cd6e7c3a1168d3");

    let mut forward = new_empty();
    for (key, value) in entries {
        put_str(&mut forward, key, value);
    }
    assert_eq!(forward.hash(), expected);

    let mut reverse = new_empty();
    for (key, value) in entries.iter().rev() {
        put_str(&mut reverse, key, value);
    }
    assert_eq!(reverse.hash(), expected);
}

#[test]
fn single_long_value_commit_root_and_store_shape() {
    let expected = b256!("d23786fb4a010da3ce639d66d5e904a11dbc02746d1ce25029e53290cabf28ab");

    let mut trie = new_empty();
    put_str(&mut trie, "A", "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
    let root = trie.commit(None).unwrap();

    assert_eq!(root, expected);
    assert_eq!(trie.db().len(), 1);
    assert!(trie.db().node(&root).is_some());
}

#[test]
fn mixed_puts_and_deletes_match_known_root() {
    let expected = b256!("5991bb8c6514148a29db676a14ac506cd2cd5775ace63c30a4fe457715e9ac84");

    let ops: [(&str, &str); 8] = [
        ("do", "verb"),
        ("ether", "wookiedoo"),
        ("horse", "stallion"),
        ("shaman", "horse"),
        ("doge", "coin"),
        ("ether", ""),
        ("dog", "puppy"),
        ("shaman", ""),
    ];
    let mut trie = new_empty();
    for (key, value) in ops {
        if value.is_empty() {
            trie.delete(key.as_bytes()).unwrap();
        } else {
            put_str(&mut trie, key, value);
        }
    }
    assert_eq!(trie.hash(), expected);

    // Any operation order with the same net map reaches the same root.
    let mut direct = new_empty();
    for (key, value) in [
        ("dog", "puppy"),
        ("horse", "stallion"),
        ("do", "verb"),
        ("doge", "coin"),
    ] {
        put_str(&mut direct, key, value);
    }
    assert_eq!(direct.hash(), expected);
}

#[test]
fn proof_for_doe_verifies_against_the_root() {
    let mut trie = new_empty();
    for (key, value) in [
        ("doe", "reindeer"),
        ("dog", "puppy"),
        ("dogglesworth", "cat"),
        ("dom", "111"),
        ("dad", "222"),
    ] {
        put_str(&mut trie, key, value);
    }
    let root = trie.hash();

    let proof = trie.proof(b"doe").unwrap();
    assert_eq!(
        verify_proof(root, b"doe", &proof).unwrap(),
        Some(Bytes::from("reindeer"))
    );

    let absent = trie.proof(b"dodo").unwrap();
    assert_eq!(verify_proof(root, b"dodo", &absent).unwrap(), None);
}

#[test]
fn empty_value_put_is_rejected() {
    let mut trie = new_empty();
    assert!(matches!(
        trie.put(b"k", Bytes::new()),
        Err(TrieError::EmptyValue)
    ));
    assert_eq!(trie.hash(), EMPTY_ROOT);
}

#[test]
fn hash_is_stable_across_calls() {
    let mut trie = new_empty();
    put_str(&mut trie, "doe", "reindeer");
    put_str(&mut trie, "dog", "puppy");

    let first = trie.hash();
    let second = trie.hash();
    assert_eq!(first, second);
    assert_eq!(trie.get(b"dog").unwrap(), Some(Bytes::from("puppy")));
}

#[test]
fn reads_resolve_lazily_from_the_store() {
    let mut trie = new_empty();
    for (key, value) in [
        ("doe", "reindeer"),
        ("dog", "puppy"),
        ("dogglesworth", "cat"),
        ("dom", "111"),
        ("dad", "222"),
    ] {
        put_str(&mut trie, key, value);
    }
    let root = trie.commit(None).unwrap();

    let mut reopened = Trie::new(root, trie.db().clone()).unwrap();
    assert_eq!(reopened.get(b"dog").unwrap(), Some(Bytes::from("puppy")));
    assert_eq!(reopened.get(b"dad").unwrap(), Some(Bytes::from("222")));
    assert_eq!(reopened.get(b"nope").unwrap(), None);
    // Resolved nodes keep their stamped digests: rehashing is pure memo.
    assert_eq!(reopened.hash(), root);
}

#[test]
fn missing_store_node_surfaces_as_an_error() {
    let mut trie = new_empty();
    for (key, value) in [
        ("doe", "reindeer"),
        ("dog", "puppy"),
        ("dogglesworth", "cat"),
        ("dom", "111"),
        ("dad", "222"),
    ] {
        put_str(&mut trie, key, value);
    }
    let root = trie.commit(None).unwrap();

    // Drop the second node on dog's path from the store and walk into it.
    let reopened = Trie::new(root, trie.db().clone()).unwrap();
    let proof = reopened.proof(b"dog").unwrap();
    assert!(proof.len() >= 2);
    let victim = keccak256(&proof[1]);

    let mut store = trie.db().clone();
    store.remove(&victim).unwrap();
    let mut broken = Trie::new(root, store).unwrap();
    assert!(matches!(
        broken.get(b"dog"),
        Err(TrieError::MissingNode { hash, .. }) if hash == victim
    ));
}

#[test]
fn roots_match_an_independent_builder() {
    let entries: BTreeMap<B256, Bytes> = (0u8..60)
        .map(|i| {
            (
                keccak256([i]),
                Bytes::from(vec![i ^ 0x5a; 1 + (i as usize % 40)]),
            )
        })
        .collect();

    let mut trie = new_empty();
    for (key, value) in &entries {
        trie.put(key.as_slice(), value.clone()).unwrap();
    }

    let mut hash_builder = HashBuilder::default();
    for (key, value) in &entries {
        hash_builder.add_leaf(Nibbles::unpack(key), value);
    }

    assert_eq!(trie.hash(), hash_builder.root());
}

#[test]
fn randomized_model_equivalence() {
    for case in 0u8..6 {
        let mut model = BTreeMap::<B256, Bytes>::new();
        let mut trie = new_empty();

        for step in 0u8..48 {
            let key = keccak256([case, step % 16, 0xa5]);
            if step % 3 == 0 {
                model.remove(&key);
                trie.delete(key.as_slice()).unwrap();
            } else {
                let len = 1 + ((case as usize + step as usize) % 64);
                let value: Vec<u8> = (0..len)
                    .map(|i| (i as u8) ^ case.wrapping_mul(17) ^ step.wrapping_mul(29))
                    .collect();
                model.insert(key, Bytes::from(value.clone()));
                trie.put(key.as_slice(), Bytes::from(value)).unwrap();
            }

            let mut hash_builder = HashBuilder::default();
            for (key, value) in &model {
                hash_builder.add_leaf(Nibbles::unpack(key), value);
            }
            assert_eq!(
                trie.hash(),
                hash_builder.root(),
                "case {case} step {step} diverged from the model"
            );
        }
    }
}

#[test]
fn leaf_callback_reports_every_stored_leaf() {
    use std::sync::{Arc, Mutex};

    let mut trie = new_empty();
    let entries: Vec<(B256, Bytes)> = (0u8..8)
        .map(|i| (keccak256([i, 0x33]), Bytes::from(vec![i; 48])))
        .collect();
    for (key, value) in &entries {
        trie.put(key.as_slice(), value.clone()).unwrap();
    }

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    trie.commit(Some(Box::new(move |leaf| {
        sink.lock().unwrap().push((leaf.path, leaf.value));
    })))
    .unwrap();

    let mut seen = seen.lock().unwrap().clone();
    seen.sort_by(|a, b| a.0.cmp(&b.0));
    let mut expected: Vec<(Vec<u8>, Bytes)> = entries
        .iter()
        .map(|(key, value)| (key.to_vec(), value.clone()))
        .collect();
    expected.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(seen, expected);
}
