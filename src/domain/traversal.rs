//! Lazy navigation iterators over a [`Tree`]. Each yields [`NodeId`]s and is
//! cheap to clone.

use crate::domain::arena::{NodeId, Tree};

/// Direct children of a node in sibling order.
pub struct Children<'a, T, V> {
    tree: &'a Tree<T, V>,
    next: Option<NodeId>,
}

impl<'a, T, V> Children<'a, T, V> {
    pub(super) fn new(tree: &'a Tree<T, V>, first: Option<NodeId>) -> Self {
        Self { tree, next: first }
    }
}

impl<T, V> Clone for Children<'_, T, V> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            next: self.next,
        }
    }
}

impl<T, V> Iterator for Children<'_, T, V> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.get(current).and_then(|data| data.next);
        Some(current)
    }
}

/// A node followed by its ancestors, nearest first.
pub struct Ancestors<'a, T, V> {
    tree: &'a Tree<T, V>,
    next: Option<NodeId>,
}

impl<'a, T, V> Ancestors<'a, T, V> {
    pub(super) fn new(tree: &'a Tree<T, V>, start: Option<NodeId>) -> Self {
        Self { tree, next: start }
    }
}

impl<T, V> Clone for Ancestors<'_, T, V> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            next: self.next,
        }
    }
}

impl<T, V> Iterator for Ancestors<'_, T, V> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.get(current).and_then(|data| data.parent);
        Some(current)
    }
}

/// Depth-first pre-order walk below a node, the node itself excluded.
pub struct Descendants<'a, T, V> {
    tree: &'a Tree<T, V>,
    start: NodeId,
    next: Option<NodeId>,
}

impl<'a, T, V> Descendants<'a, T, V> {
    pub(super) fn new(tree: &'a Tree<T, V>, start: NodeId) -> Self {
        let next = tree.get(start).and_then(|data| data.kind.first_child());
        Self { tree, start, next }
    }

    /// Next node after `current` that is not below it, bounded by `start`.
    fn advance_past(&self, current: NodeId) -> Option<NodeId> {
        let mut node = current;
        loop {
            if node == self.start {
                return None;
            }
            let data = self.tree.get(node)?;
            if let Some(sibling) = data.next {
                return Some(sibling);
            }
            node = data.parent?;
        }
    }
}

impl<T, V> Clone for Descendants<'_, T, V> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            start: self.start,
            next: self.next,
        }
    }
}

impl<T, V> Iterator for Descendants<'_, T, V> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = match self.tree.get(current).and_then(|data| data.kind.first_child()) {
            Some(child) => Some(child),
            None => self.advance_past(current),
        };
        Some(current)
    }
}
