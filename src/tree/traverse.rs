//! Lazy traversals over a [`PathTree`].
//!
//! All iterators yield `(depth, NodeId)` with the depth counted from the node
//! the traversal started at. They borrow the tree, so it cannot change while a
//! traversal is in flight.

use super::{NodeId, PathTree};
use std::collections::VecDeque;

/// Parent before children, children in insertion order.
pub struct PreOrder<'a, T> {
    tree: &'a PathTree<T>,
    stack: Vec<(usize, NodeId)>,
}

impl<T> Iterator for PreOrder<'_, T> {
    type Item = (usize, NodeId);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, id) = self.stack.pop()?;
        // reversed so the first child is popped first
        self.stack
            .extend(self.tree.children(id).iter().rev().map(|&c| (depth + 1, c)));
        Some((depth, id))
    }
}

/// Children before parent.
pub struct PostOrder<'a, T> {
    tree: &'a PathTree<T>,
    /// `(depth, node, children already pushed)`
    stack: Vec<(usize, NodeId, bool)>,
}

impl<T> Iterator for PostOrder<'_, T> {
    type Item = (usize, NodeId);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (depth, id, expanded) = self.stack.pop()?;
            if expanded || self.tree.is_leaf(id) {
                return Some((depth, id));
            }
            self.stack.push((depth, id, true));
            self.stack.extend(
                self.tree
                    .children(id)
                    .iter()
                    .rev()
                    .map(|&c| (depth + 1, c, false)),
            );
        }
    }
}

/// One level at a time, left to right.
pub struct LevelOrder<'a, T> {
    tree: &'a PathTree<T>,
    queue: VecDeque<(usize, NodeId)>,
}

impl<T> Iterator for LevelOrder<'_, T> {
    type Item = (usize, NodeId);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, id) = self.queue.pop_front()?;
        self.queue
            .extend(self.tree.children(id).iter().map(|&c| (depth + 1, c)));
        Some((depth, id))
    }
}

impl<T> PathTree<T> {
    pub fn traverse_preorder(&self, id: NodeId) -> PreOrder<'_, T> {
        PreOrder {
            tree: self,
            stack: vec![(0, id)],
        }
    }

    pub fn traverse_postorder(&self, id: NodeId) -> PostOrder<'_, T> {
        PostOrder {
            tree: self,
            stack: vec![(0, id, false)],
        }
    }

    pub fn traverse_levelorder(&self, id: NodeId) -> LevelOrder<'_, T> {
        LevelOrder {
            tree: self,
            queue: VecDeque::from([(0, id)]),
        }
    }
}
