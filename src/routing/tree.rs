//! Segment trie used for forward matching.
//!
//! # Responsibilities
//! - Store one value per `/`-separated key
//! - Match literal segments, `:name` captures and a trailing `*name` catch-all
//! - Return the captured segment values alongside the matched value
//!
//! # Design Decisions
//! - Literal children win over the named child, which wins over the catch-all
//! - Lookup backtracks: a literal branch that dead-ends falls back to the
//!   named child and then the catch-all at the same level
//! - Named captures never match an empty segment
//! - Built once and read-only afterwards; there is no removal

use std::collections::HashMap;

use thiserror::Error;

/// Errors raised while inserting into a `MatchTree`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("key \"{0}\" must start with '/'")]
    NotAbsolute(String),

    #[error("duplicate route for \"{0}\"")]
    Duplicate(String),

    #[error("capture \":{new}\" conflicts with \":{existing}\" in \"{key}\"")]
    CaptureConflict {
        key: String,
        existing: String,
        new: String,
    },

    #[error("catch-all must be the last segment in \"{0}\"")]
    CatchAllNotLast(String),

    #[error("empty capture name in \"{0}\"")]
    EmptyCapture(String),
}

#[derive(Debug)]
struct Node<V> {
    value: Option<V>,
    literals: HashMap<String, Node<V>>,
    named: Option<(String, Box<Node<V>>)>,
    catch_all: Option<(String, V)>,
}

impl<V> Default for Node<V> {
    fn default() -> Self {
        Self {
            value: None,
            literals: HashMap::new(),
            named: None,
            catch_all: None,
        }
    }
}

impl<V> Node<V> {
    fn find<'n>(&'n self, parts: &[&str], captures: &mut Vec<(String, String)>) -> Option<&'n V> {
        let Some((head, rest)) = parts.split_first() else {
            return self.value.as_ref();
        };

        if let Some(child) = self.literals.get(*head) {
            if let Some(value) = child.find(rest, captures) {
                return Some(value);
            }
        }

        if !head.is_empty() {
            if let Some((name, child)) = &self.named {
                captures.push((name.clone(), (*head).to_string()));
                if let Some(value) = child.find(rest, captures) {
                    return Some(value);
                }
                captures.pop();
            }
        }

        if let Some((name, value)) = &self.catch_all {
            captures.push((name.clone(), parts.join("/")));
            return Some(value);
        }

        None
    }
}

/// Prefix tree over path segments.
#[derive(Debug)]
pub struct MatchTree<V> {
    root: Node<V>,
    len: usize,
}

impl<V> Default for MatchTree<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> MatchTree<V> {
    pub fn new() -> Self {
        Self {
            root: Node::default(),
            len: 0,
        }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert `value` under `key`, e.g. `/GET/users/:id` or `/GET/assets/*file`.
    pub fn insert(&mut self, key: &str, value: V) -> Result<(), TreeError> {
        let rest = key
            .strip_prefix('/')
            .ok_or_else(|| TreeError::NotAbsolute(key.to_string()))?;
        let parts: Vec<&str> = rest.split('/').collect();

        let mut node = &mut self.root;
        for (i, part) in parts.iter().enumerate() {
            if let Some(name) = part.strip_prefix('*') {
                if i + 1 != parts.len() {
                    return Err(TreeError::CatchAllNotLast(key.to_string()));
                }
                if name.is_empty() {
                    return Err(TreeError::EmptyCapture(key.to_string()));
                }
                if node.catch_all.is_some() {
                    return Err(TreeError::Duplicate(key.to_string()));
                }
                node.catch_all = Some((name.to_string(), value));
                self.len += 1;
                return Ok(());
            }

            node = if let Some(name) = part.strip_prefix(':') {
                if name.is_empty() {
                    return Err(TreeError::EmptyCapture(key.to_string()));
                }
                let slot = node
                    .named
                    .get_or_insert_with(|| (name.to_string(), Box::default()));
                if slot.0 != name {
                    return Err(TreeError::CaptureConflict {
                        key: key.to_string(),
                        existing: slot.0.clone(),
                        new: name.to_string(),
                    });
                }
                slot.1.as_mut()
            } else {
                node.literals.entry((*part).to_string()).or_default()
            };
        }

        if node.value.is_some() {
            return Err(TreeError::Duplicate(key.to_string()));
        }
        node.value = Some(value);
        self.len += 1;
        Ok(())
    }

    /// Look up `key`, returning the value and the `(name, value)` captures in
    /// path order.
    pub fn find(&self, key: &str) -> Option<(&V, Vec<(String, String)>)> {
        let rest = key.strip_prefix('/')?;
        let parts: Vec<&str> = rest.split('/').collect();
        let mut captures = Vec::new();
        let value = self.root.find(&parts, &mut captures)?;
        Some((value, captures))
    }
}
