/*
Renders arena trees as `termtree` trees for debugging and snapshot-style tests.
Each label is the node name followed by its attributes, e.g. `resource [type=articles, id=1]`.
 */
use itertools::Itertools;
use termtree::Tree as TermTree;
use tracing::instrument;

use crate::domain::arena::{NodeRef, Tree};
use crate::domain::visitor::{NodeVisitor, VisitResult};

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> TermTree<String>;
}

impl<T, V> TreeNodeConvert for Tree<T, V> {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self) -> TermTree<String> {
        let mut visitor = TreeStringVisitor { stack: Vec::new() };
        if self.accept(self.root(), &mut visitor, 0).is_err() {
            return TermTree::new("Empty tree".to_string());
        }
        visitor.finish()
    }
}

/// Collects labels in pre-order; a node is folded into its parent once a
/// node at the same or a shallower depth shows up.
struct TreeStringVisitor {
    stack: Vec<(usize, TermTree<String>)>,
}

impl TreeStringVisitor {
    fn collapse(&mut self, depth: usize) {
        while self.stack.len() > 1 && self.stack.last().is_some_and(|(d, _)| *d >= depth) {
            if let Some((_, leaf)) = self.stack.pop() {
                if let Some((_, parent)) = self.stack.last_mut() {
                    parent.push(leaf);
                }
            }
        }
    }

    fn finish(mut self) -> TermTree<String> {
        self.collapse(1);
        self.stack
            .pop()
            .map(|(_, tree)| tree)
            .unwrap_or_else(|| TermTree::new("Empty tree".to_string()))
    }
}

impl<T, V> NodeVisitor<T, V> for TreeStringVisitor {
    fn visit_node(&mut self, node: NodeRef<'_, T, V>, depth: usize) -> VisitResult {
        self.collapse(depth);
        self.stack.push((depth, TermTree::new(label(node))));
        VisitResult::Continue
    }
}

fn label<T, V>(node: NodeRef<'_, T, V>) -> String {
    let attributes = node
        .attributes()
        .map(|attribute| format!("{}={}", attribute.name(), attribute.value()))
        .join(", ");
    if attributes.is_empty() {
        node.name().to_string()
    } else {
        format!("{} [{}]", node.name(), attributes)
    }
}
