use tracing::{instrument, trace};

use crate::domain::arena::{NodeId, NodeRef, NodeShape, Tree};
use crate::domain::error::TreeResult;

/// What a visitor wants the walk to do after visiting a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisitResult {
    /// Descend into the node's children, then continue with its siblings.
    Continue,
    /// Skip the node's children and continue with its siblings.
    ContinueWithSiblingNodesOnly,
    /// Stop the whole walk.
    Done,
}

/// Depth-first visitor over a [`Tree`].
///
/// Containers and collections fall back to [`NodeVisitor::visit_node`]
/// unless the visitor overrides them.
pub trait NodeVisitor<T, V> {
    fn visit_node(&mut self, node: NodeRef<'_, T, V>, depth: usize) -> VisitResult;

    fn visit_container(&mut self, node: NodeRef<'_, T, V>, depth: usize) -> VisitResult {
        self.visit_node(node, depth)
    }

    fn visit_collection(&mut self, node: NodeRef<'_, T, V>, depth: usize) -> VisitResult {
        self.visit_node(node, depth)
    }
}

impl<T, V> Tree<T, V> {
    /// Visits `start`, its subtree on [`VisitResult::Continue`], then the
    /// siblings following `start` at the same depth.
    #[instrument(level = "trace", skip(self, visitor))]
    pub fn accept<Vis>(&self, start: NodeId, visitor: &mut Vis, depth: usize) -> TreeResult<VisitResult>
    where
        Vis: NodeVisitor<T, V> + ?Sized,
    {
        self.accept_chain(start, visitor, depth)
    }

    /// Visits `first` and each following sibling, descending on
    /// [`VisitResult::Continue`]. Returns `Done` as soon as any visit does.
    fn accept_chain<Vis>(
        &self,
        first: NodeId,
        visitor: &mut Vis,
        depth: usize,
    ) -> TreeResult<VisitResult>
    where
        Vis: NodeVisitor<T, V> + ?Sized,
    {
        let mut current = Some(first);
        while let Some(id) = current {
            let node = self.node(id)?;
            match dispatch(visitor, node, depth) {
                VisitResult::Done => {
                    trace!(%id, "visitor done");
                    return Ok(VisitResult::Done);
                }
                VisitResult::Continue => {
                    if let Some(child) = node.first_child() {
                        if self.accept_chain(child, visitor, depth + 1)? == VisitResult::Done {
                            return Ok(VisitResult::Done);
                        }
                    }
                }
                VisitResult::ContinueWithSiblingNodesOnly => {}
            }
            current = node.next();
        }
        Ok(VisitResult::Continue)
    }
}

fn dispatch<T, V, Vis>(visitor: &mut Vis, node: NodeRef<'_, T, V>, depth: usize) -> VisitResult
where
    Vis: NodeVisitor<T, V> + ?Sized,
{
    match node.shape() {
        NodeShape::Node => visitor.visit_node(node, depth),
        NodeShape::Container => visitor.visit_container(node, depth),
        NodeShape::Collection => visitor.visit_collection(node, depth),
    }
}
