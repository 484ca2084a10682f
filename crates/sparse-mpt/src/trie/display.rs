//! Structural pretty-printing of a trie.

use std::fmt::{self, Display};

use crate::store::NodeStore;

use super::node::Node;
use super::Trie;

impl<S: NodeStore> Display for Trie<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.root.is_empty() {
            return write!(f, "Trie {{ EMPTY }}");
        }

        fn fmt_node(f: &mut fmt::Formatter<'_>, node: &Node, indent: usize) -> fmt::Result {
            write!(f, "{}", " ".repeat(indent))?;
            match node {
                Node::Empty => write!(f, "Empty"),
                Node::Value(value) => write!(f, "Value {value}"),
                Node::Hash(digest) => write!(f, "Hash {digest}"),
                Node::Short(sn) => {
                    writeln!(f, "Short {{ key: {:?} }}", sn.key)?;
                    fmt_node(f, &sn.val, indent + 4)
                }
                Node::Full(fnode) => {
                    write!(f, "Full")?;
                    for (i, child) in fnode.children.iter().enumerate() {
                        if child.is_empty() {
                            continue;
                        }
                        writeln!(f, "\n{}[{i:x}]", " ".repeat(indent + 2))?;
                        fmt_node(f, child, indent + 4)?;
                    }
                    Ok(())
                }
            }
        }

        fmt_node(f, &self.root, 0)
    }
}
