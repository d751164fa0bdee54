//! Route table: the ordered collection of method trees.
//!
//! A tree exists per (method, host mode) pair. Trees are only appended during
//! registration and scanned in insertion order on every request; with a
//! handful of verbs a linear scan beats any lookup structure.

use http::Method;
use std::sync::Arc;

use super::route::Route;
use super::trie::PathTrie;
use crate::context::ContextPool;

/// One method tree: its trie and the pool its contexts come from.
#[derive(Debug)]
pub struct Tree {
    method: Method,
    hosts: bool,
    trie: PathTrie,
    pool: ContextPool,
}

impl Tree {
    fn new(method: Method, hosts: bool, prewarm: usize) -> Self {
        let label = if hosts {
            format!("{method}+host")
        } else {
            method.to_string()
        };
        let pool = ContextPool::new(label);
        pool.prewarm(prewarm);
        Self {
            method,
            hosts,
            trie: PathTrie::new(),
            pool,
        }
    }

    /// Method this tree serves.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// `true` when routes of this tree are matched against `host + path`.
    #[must_use]
    pub fn hosts(&self) -> bool {
        self.hosts
    }

    /// The tree's trie.
    #[must_use]
    pub fn trie(&self) -> &PathTrie {
        &self.trie
    }

    pub(crate) fn trie_mut(&mut self) -> &mut PathTrie {
        &mut self.trie
    }

    /// Pool that serves this tree's requests.
    #[must_use]
    pub fn pool(&self) -> &ContextPool {
        &self.pool
    }
}

/// Append-only list of method trees.
#[derive(Debug, Default)]
pub struct Garden {
    trees: Vec<Tree>,
}

impl Garden {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the tree for `method` and host mode, appending it if missing.
    pub(crate) fn plant(&mut self, method: &Method, hosts: bool, prewarm: usize) -> &mut Tree {
        let existing = self
            .trees
            .iter()
            .position(|tree| tree.method == *method && tree.hosts == hosts);
        let idx = match existing {
            Some(idx) => idx,
            None => {
                self.trees.push(Tree::new(method.clone(), hosts, prewarm));
                self.trees.len() - 1
            }
        };
        &mut self.trees[idx]
    }

    /// Trees in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Tree> {
        self.trees.iter()
    }

    /// The first tree planted, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Tree> {
        self.trees.first()
    }

    /// Every route of every tree, tree by tree.
    pub fn routes(&self) -> impl Iterator<Item = &Arc<Route>> {
        self.trees.iter().flat_map(|tree| tree.trie.routes())
    }

    /// Number of trees.
    #[must_use]
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    /// `true` before the first registration.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }
}

impl<'a> IntoIterator for &'a Garden {
    type Item = &'a Tree;
    type IntoIter = std::slice::Iter<'a, Tree>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
