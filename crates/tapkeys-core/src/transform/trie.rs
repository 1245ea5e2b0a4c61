// Tapkeys Composition Trie
// Arena-backed prefix tree from key sequences to composed symbols

use std::collections::HashMap;
use std::fmt;

/// Index of a node in a [`CompositionTrie`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum Node {
    Branch(HashMap<String, NodeId>),
    Leaf(String),
}

/// Rejected insertion. The trie is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComposeConflict {
    #[error("empty composition sequence")]
    EmptySequence,

    #[error("{sequence} extends {prefix}, already bound to {existing:?}")]
    ExtendsLeaf {
        sequence: String,
        prefix: String,
        existing: String,
    },

    #[error("{sequence} is a prefix of longer sequences")]
    PrefixOfLonger { sequence: String },

    #[error("{sequence} is already bound to {existing:?}, ignoring {symbol:?}")]
    Duplicate {
        sequence: String,
        existing: String,
        symbol: String,
    },
}

/// Immutable-after-load prefix tree of composition sequences.
#[derive(Debug, Clone)]
pub struct CompositionTrie {
    nodes: Vec<Node>,
    sequences: usize,
}

impl Default for CompositionTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositionTrie {
    /// Create an empty trie
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::Branch(HashMap::new())],
            sequences: 0,
        }
    }

    /// Root node, where every composition starts
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Returns true if no sequence has been inserted
    pub fn is_empty(&self) -> bool {
        self.sequences == 0
    }

    /// Number of inserted sequences
    pub fn len(&self) -> usize {
        self.sequences
    }

    /// Child of `node` reached through `key`
    pub fn child(&self, node: NodeId, key: &str) -> Option<NodeId> {
        match self.nodes.get(node.0)? {
            Node::Branch(children) => children.get(key).copied(),
            Node::Leaf(_) => None,
        }
    }

    /// Symbol stored at `node`, if it terminates a sequence
    pub fn leaf(&self, node: NodeId) -> Option<&str> {
        match self.nodes.get(node.0)? {
            Node::Leaf(symbol) => Some(symbol.as_str()),
            Node::Branch(_) => None,
        }
    }

    /// Look up a complete sequence
    pub fn get<S: AsRef<str>>(&self, keys: &[S]) -> Option<&str> {
        let mut node = self.root();
        for key in keys {
            node = self.child(node, key.as_ref())?;
        }
        self.leaf(node)
    }

    /// Insert `keys` → `symbol`. The first binding of a sequence wins.
    pub fn insert<S: AsRef<str>>(&mut self, keys: &[S], symbol: &str) -> Result<(), ComposeConflict> {
        if keys.is_empty() {
            return Err(ComposeConflict::EmptySequence);
        }

        let mut current = self.root();
        for (i, key) in keys.iter().enumerate() {
            let key = key.as_ref();
            let last = i + 1 == keys.len();

            let next = match &self.nodes[current.0] {
                Node::Leaf(existing) => {
                    return Err(ComposeConflict::ExtendsLeaf {
                        sequence: format_sequence(keys),
                        prefix: format_sequence(&keys[..i]),
                        existing: existing.clone(),
                    });
                }
                Node::Branch(children) => children.get(key).copied(),
            };

            match next {
                Some(next) if last => {
                    return match &self.nodes[next.0] {
                        Node::Leaf(existing) if existing == symbol => Ok(()),
                        Node::Leaf(existing) => Err(ComposeConflict::Duplicate {
                            sequence: format_sequence(keys),
                            existing: existing.clone(),
                            symbol: symbol.to_string(),
                        }),
                        Node::Branch(_) => Err(ComposeConflict::PrefixOfLonger {
                            sequence: format_sequence(keys),
                        }),
                    };
                }
                Some(next) => current = next,
                None => {
                    let id = NodeId(self.nodes.len());
                    self.nodes.push(if last {
                        Node::Leaf(symbol.to_string())
                    } else {
                        Node::Branch(HashMap::new())
                    });
                    if let Node::Branch(children) = &mut self.nodes[current.0] {
                        children.insert(key.to_string(), id);
                    }
                    current = id;
                }
            }
        }

        self.sequences += 1;
        Ok(())
    }
}

struct Sequence<'a, S>(&'a [S]);

impl<S: AsRef<str>> fmt::Display for Sequence<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "<{}>", key.as_ref())?;
        }
        Ok(())
    }
}

fn format_sequence<S: AsRef<str>>(keys: &[S]) -> String {
    Sequence(keys).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_walk() {
        let mut trie = CompositionTrie::new();
        trie.insert(&["a", "b"], "â").unwrap();

        let a = trie.child(trie.root(), "a").unwrap();
        assert_eq!(trie.leaf(a), None);
        let b = trie.child(a, "b").unwrap();
        assert_eq!(trie.leaf(b), Some("â"));
        assert_eq!(trie.child(b, "c"), None);
        assert_eq!(trie.len(), 1);
    }

    #[test]
    fn test_shared_prefixes() {
        let mut trie = CompositionTrie::new();
        trie.insert(&["apostrophe", "a"], "á").unwrap();
        trie.insert(&["apostrophe", "e"], "é").unwrap();
        assert_eq!(trie.get(&["apostrophe", "a"]), Some("á"));
        assert_eq!(trie.get(&["apostrophe", "e"]), Some("é"));
        assert_eq!(trie.get(&["apostrophe"]), None);
        assert_eq!(trie.len(), 2);
    }

    #[test]
    fn test_extending_a_leaf_is_a_conflict() {
        let mut trie = CompositionTrie::new();
        trie.insert(&["o", "o"], "°").unwrap();
        let err = trie.insert(&["o", "o", "o"], "ooo").unwrap_err();
        assert_eq!(
            err,
            ComposeConflict::ExtendsLeaf {
                sequence: "<o> <o> <o>".to_string(),
                prefix: "<o> <o>".to_string(),
                existing: "°".to_string(),
            }
        );
        assert_eq!(trie.get(&["o", "o"]), Some("°"));
        assert_eq!(trie.len(), 1);
    }

    #[test]
    fn test_prefix_of_longer_sequence_is_a_conflict() {
        let mut trie = CompositionTrie::new();
        trie.insert(&["o", "o", "o"], "ooo").unwrap();
        assert!(matches!(
            trie.insert(&["o", "o"], "°"),
            Err(ComposeConflict::PrefixOfLonger { .. })
        ));
        assert_eq!(trie.get(&["o", "o", "o"]), Some("ooo"));
    }

    #[test]
    fn test_duplicates() {
        let mut trie = CompositionTrie::new();
        trie.insert(&["c", "o"], "©").unwrap();
        assert_eq!(trie.insert(&["c", "o"], "©"), Ok(()));
        assert!(matches!(
            trie.insert(&["c", "o"], "¢"),
            Err(ComposeConflict::Duplicate { .. })
        ));
        assert_eq!(trie.get(&["c", "o"]), Some("©"));
        assert_eq!(trie.len(), 1);
    }

    #[test]
    fn test_empty_sequence() {
        let mut trie = CompositionTrie::new();
        let keys: [&str; 0] = [];
        assert_eq!(trie.insert(&keys, "x"), Err(ComposeConflict::EmptySequence));
        assert!(trie.is_empty());
    }
}
