//! Structural operations that copy, graft, filter or reorder a [`PathTree`].

use super::{NodeId, PathTree, TreeError};
use regex::Regex;
use std::path::PathBuf;

impl<T> PathTree<T> {
    /// Copy the subtree at `id` into a new tree rooted at a node named like `id`.
    ///
    /// Structure is copied, payloads are shared: every copied node points at
    /// the same `Arc` as its original.
    pub fn duplicate(&self, id: NodeId) -> PathTree<T> {
        let mut copy = PathTree {
            nodes: Vec::with_capacity(self.len()),
        };
        let root = copy.push_node(self.name(id).to_owned(), None);
        copy.nodes[root.0].data = self.data(id).cloned();
        self.copy_children(id, &mut copy, root);
        copy
    }

    /// Graft a copy of `subtree` (root included) below `target`.
    ///
    /// Fails without touching `self` when the subtree root is absolute or when
    /// any leaf of the grafted tree would land on an already existing path.
    /// Payloads are shared with `subtree`.
    pub fn append_subtree(&mut self, target: NodeId, subtree: &PathTree<T>) -> Result<NodeId, TreeError> {
        let sub_root = subtree.root();
        if subtree.name(sub_root) == "/" || PathBuf::from(subtree.name(sub_root)).has_root() {
            return Err(TreeError::AbsoluteGraft(subtree.pathname(sub_root)));
        }

        if let Some(collision) = subtree
            .leaf_pathnames(sub_root, false)
            .into_iter()
            .find(|p| self.node(target, p, false).is_some())
        {
            return Err(TreeError::Collision(self.pathname(target).join(collision)));
        }

        let grafted = match self.child(target, subtree.name(sub_root)) {
            Some(existing) => existing,
            None => self.push_node(subtree.name(sub_root).to_owned(), Some(target)),
        };
        if let Some(data) = subtree.data(sub_root) {
            self.nodes[grafted.0].data = Some(data.clone());
        }
        subtree.merge_children(sub_root, self, grafted);
        Ok(grafted)
    }

    /// New tree holding every node below `id` for which `predicate` holds,
    /// plus the ancestors needed to reach them.
    ///
    /// With `prune` the result is rooted at `id`, otherwise at this tree's
    /// root. Returns `None` if nothing matched.
    pub fn filter<F>(&self, id: NodeId, prune: bool, mut predicate: F) -> Option<PathTree<T>>
    where
        F: FnMut(&PathTree<T>, usize, NodeId) -> bool,
    {
        let matched: Vec<NodeId> = self
            .traverse_preorder(id)
            .filter(|&(depth, n)| predicate(self, depth, n))
            .map(|(_, n)| n)
            .collect();
        if matched.is_empty() {
            return None;
        }

        let origin = if prune { id } else { self.root() };
        let mut result = PathTree {
            nodes: Vec::new(),
        };
        let root = result.push_node(self.name(origin).to_owned(), None);
        result.nodes[root.0].data = self.data(origin).cloned();

        for node in matched {
            let mut chain = Vec::new();
            let mut current = node;
            while current != origin {
                chain.push(current);
                match self.parent(current) {
                    Some(parent) => current = parent,
                    None => break,
                }
            }

            let mut at = root;
            for &original in chain.iter().rev() {
                at = match result.child(at, self.name(original)) {
                    Some(existing) => existing,
                    None => {
                        let created = result.push_node(self.name(original).to_owned(), Some(at));
                        result.nodes[created.0].data = self.data(original).cloned();
                        created
                    }
                };
            }
        }
        Some(result)
    }

    /// [`filter`](Self::filter) on the full pathname of each node.
    pub fn match_path(&self, id: NodeId, pattern: &Regex, prune: bool) -> Option<PathTree<T>> {
        self.filter(id, prune, |tree, _, n| {
            pattern.is_match(&tree.pathname(n).to_string_lossy())
        })
    }

    /// Reorder children at every level below `id`: leaves first, then
    /// subdirectories, each group sorted by name.
    pub fn sort_leaf_first(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            let mut children = std::mem::take(&mut self.nodes[current.0].children);
            children.sort_by(|&a, &b| {
                self.is_leaf(b)
                    .cmp(&self.is_leaf(a))
                    .then_with(|| self.name(a).cmp(self.name(b)))
            });
            pending.extend(children.iter().copied());
            self.nodes[current.0].children = children;
        }
    }

    /// Split the pathname of `id` into a shared stem and a unique crown.
    ///
    /// The stem follows the single-child chain from the root and stops at the
    /// first branching node or at `id` itself. A leaf never ends up entirely in
    /// the stem: when the chain reaches it, the stem stops at its parent.
    pub fn split_stem(&self, id: NodeId) -> (PathBuf, PathBuf) {
        let ancestry: Vec<NodeId> = {
            let mut chain = vec![id];
            let mut current = id;
            while let Some(parent) = self.parent(current) {
                chain.push(parent);
                current = parent;
            }
            chain.reverse();
            chain
        };

        let mut stem = ancestry[0];
        for &next in &ancestry[1..] {
            if stem == id || self.children(stem).len() != 1 {
                break;
            }
            stem = next;
        }
        if stem == id && self.is_leaf(id) {
            stem = self.parent(id).unwrap_or(id);
        }

        let crown = self.relative_pathname(id, stem).unwrap_or_default();
        (self.pathname(stem), crown)
    }

    /// Number of nodes at or below `id`.
    pub fn count(&self, id: NodeId) -> usize {
        self.traverse_preorder(id).count()
    }

    // ------------------------------------------------------------------------
    // Internal
    // ------------------------------------------------------------------------

    fn copy_children(&self, from: NodeId, into: &mut PathTree<T>, at: NodeId) {
        for &child in self.children(from) {
            let created = into.push_node(self.name(child).to_owned(), Some(at));
            into.nodes[created.0].data = self.data(child).cloned();
            self.copy_children(child, into, created);
        }
    }

    /// Like `copy_children` but reuses nodes that already exist in `into`.
    fn merge_children(&self, from: NodeId, into: &mut PathTree<T>, at: NodeId) {
        for &child in self.children(from) {
            let target = match into.child(at, self.name(child)) {
                Some(existing) => existing,
                None => into.push_node(self.name(child).to_owned(), Some(at)),
            };
            if let Some(data) = self.data(child) {
                into.nodes[target.0].data = Some(data.clone());
            }
            self.merge_children(child, into, target);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
