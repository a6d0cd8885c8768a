//! Character trie used as the in-memory index of one dictionary file.
//!
//! Every inserted word is reachable from the root by consuming its
//! characters one node at a time. Enumeration walks the subtree below a
//! prefix with an explicit stack, so pathological word lengths never grow
//! the call stack.

use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct TrieNode {
    children: BTreeMap<char, TrieNode>,
    end_of_word: bool,
}

/// Prefix tree over Unicode scalar values.
#[derive(Debug, Default)]
pub struct PrefixTrie {
    root: TrieNode,
    len: usize,
}

impl PrefixTrie {
    /// Create an empty trie.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a word, creating any missing intermediate nodes.
    ///
    /// Returns `false` if the word was already present.
    pub fn insert(&mut self, word: &str) -> bool {
        let mut node = &mut self.root;
        for ch in word.chars() {
            node = node.children.entry(ch).or_default();
        }

        if node.end_of_word {
            return false;
        }
        node.end_of_word = true;
        self.len += 1;
        true
    }

    /// Check whether `word` was inserted.
    pub fn contains(&self, word: &str) -> bool {
        self.descend(word).is_some_and(|node| node.end_of_word)
    }

    /// Return every inserted word starting with `prefix`.
    ///
    /// Words come out in depth-first order with children visited in
    /// character order. An empty prefix yields the whole vocabulary; a
    /// prefix with no path in the trie yields nothing.
    pub fn search(&self, prefix: &str) -> Vec<String> {
        let Some(start) = self.descend(prefix) else {
            return Vec::new();
        };

        let mut words = Vec::new();
        let mut stack = vec![(start, prefix.to_string())];

        while let Some((node, word)) = stack.pop() {
            // Reverse push keeps the smallest child on top of the stack.
            for (ch, child) in node.children.iter().rev() {
                let mut next = String::with_capacity(word.len() + ch.len_utf8());
                next.push_str(&word);
                next.push(*ch);
                stack.push((child, next));
            }
            if node.end_of_word {
                words.push(word);
            }
        }

        words
    }

    /// Number of distinct words.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn descend(&self, prefix: &str) -> Option<&TrieNode> {
        prefix
            .chars()
            .try_fold(&self.root, |node, ch| node.children.get(&ch))
    }
}

impl Drop for PrefixTrie {
    // Unlink nodes one at a time; the derived drop would recurse once per character.
    fn drop(&mut self) {
        let mut pending: Vec<TrieNode> = std::mem::take(&mut self.root.children)
            .into_values()
            .collect();
        while let Some(mut node) = pending.pop() {
            pending.extend(std::mem::take(&mut node.children).into_values());
        }
    }
}

impl<S: AsRef<str>> Extend<S> for PrefixTrie {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for word in iter {
            self.insert(word.as_ref());
        }
    }
}

impl<S: AsRef<str>> FromIterator<S> for PrefixTrie {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut trie = Self::new();
        trie.extend(iter);
        trie
    }
}
