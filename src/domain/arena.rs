//! Arena-backed tagged-node tree.
//!
//! All nodes and attributes live in `generational_arena` arenas owned by the
//! [`Tree`] and are referenced through [`NodeId`] / [`AttributeId`] handles.
//! Parent, sibling and root links are handles too, so navigation is O(1)
//! without reference counting. Removing a node frees its whole subtree;
//! stale handles are caught by the arena generation check.

use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use generational_arena::{Arena, Index};
use tracing::{instrument, trace};

use crate::domain::attribute::{AttributeChain, AttributeData, AttributeRef, AttributeValue};
use crate::domain::error::{TreeError, TreeResult};
use crate::domain::traversal::{Ancestors, Children, Descendants};

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one [`Tree`]. Handles carry it so they cannot cross trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreeId(u64);

impl TreeId {
    fn next() -> Self {
        Self(NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Handle to a node stored in a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub(super) tree: TreeId,
    pub(super) index: Index,
}

impl NodeId {
    pub fn tree_id(&self) -> TreeId {
        self.tree
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (slot, generation) = self.index.into_raw_parts();
        write!(f, "node#{}:{}.{}", self.tree.0, slot, generation)
    }
}

/// Handle to an attribute stored in a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeId {
    pub(super) tree: TreeId,
    pub(super) index: Index,
}

impl fmt::Display for AttributeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (slot, generation) = self.index.into_raw_parts();
        write!(f, "attribute#{}:{}.{}", self.tree.0, slot, generation)
    }
}

/// How many children a node may own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeShape {
    /// Plain node, no children.
    Node,
    /// Owns at most one child.
    Container,
    /// Owns an ordered sequence of children.
    Collection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum NodeKind {
    Leaf,
    Container {
        child: Option<NodeId>,
    },
    Collection {
        first_child: Option<NodeId>,
        last_child: Option<NodeId>,
    },
}

impl NodeKind {
    fn new(shape: NodeShape) -> Self {
        match shape {
            NodeShape::Node => Self::Leaf,
            NodeShape::Container => Self::Container { child: None },
            NodeShape::Collection => Self::Collection {
                first_child: None,
                last_child: None,
            },
        }
    }

    pub(super) fn shape(&self) -> NodeShape {
        match self {
            Self::Leaf => NodeShape::Node,
            Self::Container { .. } => NodeShape::Container,
            Self::Collection { .. } => NodeShape::Collection,
        }
    }

    pub(super) fn first_child(&self) -> Option<NodeId> {
        match self {
            Self::Leaf => None,
            Self::Container { child } => *child,
            Self::Collection { first_child, .. } => *first_child,
        }
    }

    pub(super) fn last_child(&self) -> Option<NodeId> {
        match self {
            Self::Leaf => None,
            Self::Container { child } => *child,
            Self::Collection { last_child, .. } => *last_child,
        }
    }
}

/// Storage for a single node in the arena.
#[derive(Debug)]
pub(super) struct NodeData<T, V> {
    pub(super) node_type: T,
    pub(super) name: String,
    pub(super) value: V,
    pub(super) kind: NodeKind,
    pub(super) root: Option<NodeId>,
    pub(super) parent: Option<NodeId>,
    pub(super) previous: Option<NodeId>,
    pub(super) next: Option<NodeId>,
    pub(super) first_attribute: Option<AttributeId>,
    pub(super) last_attribute: Option<AttributeId>,
}

impl<T, V> NodeData<T, V> {
    fn new(node_type: T, name: String, shape: NodeShape, value: V) -> Self {
        Self {
            node_type,
            name,
            value,
            kind: NodeKind::new(shape),
            root: None,
            parent: None,
            previous: None,
            next: None,
            first_attribute: None,
            last_attribute: None,
        }
    }

    /// A node counts as inserted as soon as any tree link is set.
    fn is_attached(&self) -> bool {
        self.root.is_some() || self.parent.is_some() || self.previous.is_some() || self.next.is_some()
    }
}

/// A tree of tagged nodes.
///
/// `T` is the node-type tag, `V` the payload every node carries. The tree
/// exclusively owns its nodes and attributes; callers hold handles and read
/// through [`NodeRef`] views. All mutation goes through `&mut Tree` and
/// validates before it touches a link, so a failed call changes nothing.
#[derive(Debug)]
pub struct Tree<T, V> {
    id: TreeId,
    nodes: Arena<NodeData<T, V>>,
    pub(super) attributes: Arena<AttributeData>,
    root: NodeId,
}

impl<T, V> Tree<T, V> {
    /// Creates a tree whose root node references itself as `root`.
    pub fn new(node_type: T, name: impl Into<String>, shape: NodeShape, value: V) -> Self {
        let id = TreeId::next();
        let mut nodes = Arena::new();
        let index = nodes.insert(NodeData::new(node_type, name.into(), shape, value));
        let root = NodeId { tree: id, index };
        if let Some(data) = nodes.get_mut(index) {
            data.root = Some(root);
        }
        Self {
            id,
            nodes,
            attributes: Arena::new(),
            root,
        }
    }

    pub fn id(&self) -> TreeId {
        self.id
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, the root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Allocates a free-standing node. It joins the tree through [`Tree::add`]
    /// or [`Tree::replace`].
    #[instrument(level = "trace", skip_all)]
    pub fn create_node(
        &mut self,
        node_type: T,
        name: impl Into<String>,
        shape: NodeShape,
        value: V,
    ) -> NodeId {
        let index = self
            .nodes
            .insert(NodeData::new(node_type, name.into(), shape, value));
        NodeId {
            tree: self.id,
            index,
        }
    }

    /// Returns a read-only view of a node.
    pub fn node(&self, id: NodeId) -> TreeResult<NodeRef<'_, T, V>> {
        let data = self.data(id)?;
        Ok(NodeRef {
            tree: self,
            id,
            data,
        })
    }

    pub fn children(&self, id: NodeId) -> Children<'_, T, V> {
        Children::new(self, self.get(id).and_then(|data| data.kind.first_child()))
    }

    /// The node itself followed by its ancestors up to the topmost node.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_, T, V> {
        Ancestors::new(self, self.get(id).map(|_| id))
    }

    /// All nodes below `id` in document order, `id` itself excluded.
    ///
    /// The iterator is lazy and `Clone`; calling this again restarts the walk.
    pub fn descendant_nodes(&self, id: NodeId) -> Descendants<'_, T, V> {
        Descendants::new(self, id)
    }

    // --- Mutation ---

    /// Attaches a free-standing node under `container`.
    ///
    /// Single-child containers only accept a node into an empty slot; use
    /// [`Tree::replace`] to swap the child. Collections append to the tail.
    #[instrument(level = "trace", skip(self))]
    pub fn add(&mut self, container: NodeId, node: NodeId) -> TreeResult<()> {
        let (kind, root) = {
            let data = self.data(container)?;
            (data.kind, data.root)
        };
        self.check_attachable(container, node)?;

        match kind {
            NodeKind::Leaf => return Err(TreeError::NotAContainer(container)),
            NodeKind::Container { child: Some(_) } => {
                return Err(TreeError::ChildSlotOccupied(container))
            }
            NodeKind::Container { child: None } => {
                self.link(node, container, root, None, None);
                if let Some(data) = self.get_mut(container) {
                    data.kind = NodeKind::Container { child: Some(node) };
                }
            }
            NodeKind::Collection {
                first_child,
                last_child,
            } => {
                self.link(node, container, root, last_child, None);
                if let Some(last) = last_child {
                    if let Some(data) = self.get_mut(last) {
                        data.next = Some(node);
                    }
                }
                if let Some(data) = self.get_mut(container) {
                    data.kind = NodeKind::Collection {
                        first_child: first_child.or(Some(node)),
                        last_child: Some(node),
                    };
                }
            }
        }

        trace!(%container, %node, "attached node");
        Ok(())
    }

    /// Attaches several free-standing nodes in order.
    ///
    /// The whole batch is validated first; on error nothing is attached.
    #[instrument(level = "trace", skip(self, nodes))]
    pub fn add_many<I>(&mut self, container: NodeId, nodes: I) -> TreeResult<()>
    where
        I: IntoIterator<Item = NodeId>,
    {
        let nodes: Vec<NodeId> = nodes.into_iter().collect();
        let kind = self.data(container)?.kind;

        match kind {
            NodeKind::Leaf => return Err(TreeError::NotAContainer(container)),
            NodeKind::Container { child } => {
                if nodes.len() > 1 || (child.is_some() && !nodes.is_empty()) {
                    return Err(TreeError::ChildSlotOccupied(container));
                }
            }
            NodeKind::Collection { .. } => {}
        }

        let mut seen = HashSet::with_capacity(nodes.len());
        for &node in &nodes {
            self.check_attachable(container, node)?;
            if !seen.insert(node) {
                return Err(TreeError::DuplicateInBatch(node));
            }
        }

        for node in nodes {
            self.add(container, node)?;
        }
        Ok(())
    }

    /// Removes `old` from `container` and discards it with its whole subtree.
    #[instrument(level = "trace", skip(self))]
    pub fn remove(&mut self, container: NodeId, old: NodeId) -> TreeResult<()> {
        let kind = self.data(container)?.kind;
        let (previous, next) = self.check_child(container, kind, old)?;

        match kind {
            NodeKind::Leaf => {}
            NodeKind::Container { .. } => {
                if let Some(data) = self.get_mut(container) {
                    data.kind = NodeKind::Container { child: None };
                }
            }
            NodeKind::Collection {
                first_child,
                last_child,
            } => {
                if let Some(prev) = previous {
                    if let Some(data) = self.get_mut(prev) {
                        data.next = next;
                    }
                }
                if let Some(following) = next {
                    if let Some(data) = self.get_mut(following) {
                        data.previous = previous;
                    }
                }
                if let Some(data) = self.get_mut(container) {
                    data.kind = NodeKind::Collection {
                        first_child: if first_child == Some(old) { next } else { first_child },
                        last_child: if last_child == Some(old) { previous } else { last_child },
                    };
                }
            }
        }

        self.discard_subtree(old);
        Ok(())
    }

    /// Puts the free-standing `new` in the position of `old`, then discards
    /// `old` with its subtree. `new` inherits root, parent and siblings.
    #[instrument(level = "trace", skip(self))]
    pub fn replace(&mut self, container: NodeId, old: NodeId, new: NodeId) -> TreeResult<()> {
        let kind = self.data(container)?.kind;
        let (previous, next) = self.check_child(container, kind, old)?;
        self.check_attachable(container, new)?;

        let root = self.data(old)?.root;
        self.link(new, container, root, previous, next);

        match kind {
            NodeKind::Leaf => {}
            NodeKind::Container { .. } => {
                if let Some(data) = self.get_mut(container) {
                    data.kind = NodeKind::Container { child: Some(new) };
                }
            }
            NodeKind::Collection {
                first_child,
                last_child,
            } => {
                if let Some(prev) = previous {
                    if let Some(data) = self.get_mut(prev) {
                        data.next = Some(new);
                    }
                }
                if let Some(following) = next {
                    if let Some(data) = self.get_mut(following) {
                        data.previous = Some(new);
                    }
                }
                if let Some(data) = self.get_mut(container) {
                    data.kind = NodeKind::Collection {
                        first_child: if first_child == Some(old) { Some(new) } else { first_child },
                        last_child: if last_child == Some(old) { Some(new) } else { last_child },
                    };
                }
            }
        }

        self.discard_subtree(old);
        Ok(())
    }

    // --- Attributes ---

    /// Allocates a free-standing attribute.
    pub fn create_attribute<A: AttributeValue>(
        &mut self,
        name: impl Into<String>,
        value: A,
    ) -> TreeResult<AttributeId> {
        let name = name.into();
        if name.is_empty() {
            return Err(TreeError::EmptyAttributeName);
        }
        let index = self.attributes.insert(AttributeData::new(name, Box::new(value)));
        Ok(AttributeId {
            tree: self.id,
            index,
        })
    }

    /// Appends a free-standing attribute to the attribute chain of `node`.
    #[instrument(level = "trace", skip(self))]
    pub fn add_attribute(&mut self, node: NodeId, attribute: AttributeId) -> TreeResult<()> {
        let last = self.data(node)?.last_attribute;
        if attribute.tree != self.id {
            return Err(TreeError::ForeignAttribute(attribute));
        }
        let data = self
            .attributes
            .get(attribute.index)
            .ok_or(TreeError::UnknownAttribute(attribute))?;
        if data.is_attached() {
            return Err(TreeError::AttributeAlreadyAttached(attribute));
        }

        if let Some(data) = self.attributes.get_mut(attribute.index) {
            data.owner = Some(node);
            data.previous = last;
        }
        if let Some(previous) = last {
            if let Some(data) = self.attributes.get_mut(previous.index) {
                data.next = Some(attribute);
            }
        }
        if let Some(data) = self.get_mut(node) {
            if data.first_attribute.is_none() {
                data.first_attribute = Some(attribute);
            }
            data.last_attribute = Some(attribute);
        }
        Ok(())
    }

    /// Creates an attribute and appends it to `node` in one step.
    pub fn attach_attribute<A: AttributeValue>(
        &mut self,
        node: NodeId,
        name: impl Into<String>,
        value: A,
    ) -> TreeResult<AttributeId> {
        self.data(node)?;
        let attribute = self.create_attribute(name, value)?;
        self.add_attribute(node, attribute)?;
        Ok(attribute)
    }

    pub fn attribute(&self, id: AttributeId) -> TreeResult<AttributeRef<'_>> {
        if id.tree != self.id {
            return Err(TreeError::ForeignAttribute(id));
        }
        self.attributes
            .get(id.index)
            .map(|data| AttributeRef::new(id, data))
            .ok_or(TreeError::UnknownAttribute(id))
    }

    pub fn attribute_name(&self, id: AttributeId) -> TreeResult<&str> {
        Ok(self.attribute(id)?.name())
    }

    /// The attribute value as `A`, `None` if it holds another type.
    pub fn attribute_value<A: Any>(&self, id: AttributeId) -> TreeResult<Option<&A>> {
        Ok(self.attribute(id)?.downcast::<A>())
    }

    /// Attributes of `node` in append order.
    pub fn attributes(&self, node: NodeId) -> AttributeChain<'_> {
        AttributeChain::new(
            &self.attributes,
            self.get(node).and_then(|data| data.first_attribute),
        )
    }

    /// Attributes of `node` called `name`, in append order.
    pub fn attributes_named<'a>(
        &'a self,
        node: NodeId,
        name: &'a str,
    ) -> impl Iterator<Item = AttributeRef<'a>> + Clone + 'a {
        self.attributes(node)
            .filter(move |attribute| attribute.name() == name)
    }

    // --- Internals ---

    pub(super) fn get(&self, id: NodeId) -> Option<&NodeData<T, V>> {
        if id.tree != self.id {
            return None;
        }
        self.nodes.get(id.index)
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeData<T, V>> {
        if id.tree != self.id {
            return None;
        }
        self.nodes.get_mut(id.index)
    }

    fn data(&self, id: NodeId) -> TreeResult<&NodeData<T, V>> {
        if id.tree != self.id {
            return Err(TreeError::ForeignNode(id));
        }
        self.nodes.get(id.index).ok_or(TreeError::UnknownNode(id))
    }

    fn check_attachable(&self, container: NodeId, node: NodeId) -> TreeResult<()> {
        if self.data(node)?.is_attached() {
            return Err(TreeError::NodeAlreadyAttached(node));
        }
        // A free-standing node may be the top of the subtree holding `container`.
        if self.ancestors(container).any(|ancestor| ancestor == node) {
            return Err(TreeError::CycleDetected(node));
        }
        Ok(())
    }

    /// Checks that `node` is a current child of `container` and returns its
    /// sibling links.
    fn check_child(
        &self,
        container: NodeId,
        kind: NodeKind,
        node: NodeId,
    ) -> TreeResult<(Option<NodeId>, Option<NodeId>)> {
        let data = self.data(node)?;
        let is_child = match kind {
            NodeKind::Leaf => return Err(TreeError::NotAContainer(container)),
            NodeKind::Container { child } => child == Some(node),
            NodeKind::Collection { .. } => data.parent == Some(container),
        };
        if !is_child {
            return Err(TreeError::NotAChild { container, node });
        }
        Ok((data.previous, data.next))
    }

    fn link(
        &mut self,
        node: NodeId,
        parent: NodeId,
        root: Option<NodeId>,
        previous: Option<NodeId>,
        next: Option<NodeId>,
    ) {
        if let Some(data) = self.get_mut(node) {
            data.parent = Some(parent);
            data.previous = previous;
            data.next = next;
        }
        // Subtrees may be assembled bottom-up before they join the root.
        let mut subtree = vec![node];
        subtree.extend(self.descendant_nodes(node));
        for id in subtree {
            if let Some(data) = self.get_mut(id) {
                data.root = root;
            }
        }
    }

    fn discard_subtree(&mut self, node: NodeId) {
        let mut doomed = vec![node];
        doomed.extend(self.descendant_nodes(node));
        for id in doomed {
            if let Some(data) = self.nodes.remove(id.index) {
                let mut attribute = data.first_attribute;
                while let Some(current) = attribute {
                    attribute = self
                        .attributes
                        .remove(current.index)
                        .and_then(|removed| removed.next);
                }
            }
        }
        trace!(%node, "discarded subtree");
    }
}

/// Read-only view of one node.
pub struct NodeRef<'a, T, V> {
    tree: &'a Tree<T, V>,
    id: NodeId,
    data: &'a NodeData<T, V>,
}

impl<T, V> Clone for NodeRef<'_, T, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, V> Copy for NodeRef<'_, T, V> {}

impl<T: fmt::Debug, V> fmt::Debug for NodeRef<'_, T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("node_type", &self.data.node_type)
            .field("name", &self.data.name)
            .finish()
    }
}

impl<'a, T: 'a, V: 'a> NodeRef<'a, T, V> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'a Tree<T, V> {
        self.tree
    }

    pub fn name(&self) -> &'a str {
        &self.data.name
    }

    pub fn value(&self) -> &'a V {
        &self.data.value
    }

    pub fn shape(&self) -> NodeShape {
        self.data.kind.shape()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.data.root
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.data.parent
    }

    pub fn previous(&self) -> Option<NodeId> {
        self.data.previous
    }

    pub fn next(&self) -> Option<NodeId> {
        self.data.next
    }

    pub fn first_child(&self) -> Option<NodeId> {
        self.data.kind.first_child()
    }

    pub fn last_child(&self) -> Option<NodeId> {
        self.data.kind.last_child()
    }

    pub fn is_attached(&self) -> bool {
        self.data.is_attached()
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a, T, V>> + Clone + 'a {
        let tree = self.tree;
        tree.children(self.id).filter_map(move |id| tree.node(id).ok())
    }

    pub fn attributes(&self) -> AttributeChain<'a> {
        AttributeChain::new(&self.tree.attributes, self.data.first_attribute)
    }

    pub fn attributes_named(&self, name: &'a str) -> impl Iterator<Item = AttributeRef<'a>> + Clone + 'a {
        self.attributes()
            .filter(move |attribute| attribute.name() == name)
    }
}

impl<T: Copy, V> NodeRef<'_, T, V> {
    pub fn node_type(&self) -> T {
        self.data.node_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Tag {
        Root,
        Item,
        Slot,
    }

    fn tree() -> Tree<Tag, u32> {
        Tree::new(Tag::Root, "root", NodeShape::Collection, 0)
    }

    #[test]
    fn given_new_tree_when_inspecting_root_then_root_references_itself() {
        let tree = tree();
        let root = tree.node(tree.root()).unwrap();
        assert_eq!(root.root(), Some(tree.root()));
        assert_eq!(root.parent(), None);
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn given_collection_when_adding_then_links_siblings() {
        let mut tree = tree();
        let root = tree.root();
        let a = tree.create_node(Tag::Item, "a", NodeShape::Node, 1);
        let b = tree.create_node(Tag::Item, "b", NodeShape::Node, 2);
        let c = tree.create_node(Tag::Item, "c", NodeShape::Node, 3);
        tree.add_many(root, [a, b, c]).unwrap();

        let root_ref = tree.node(root).unwrap();
        assert_eq!(root_ref.first_child(), Some(a));
        assert_eq!(root_ref.last_child(), Some(c));
        assert_eq!(tree.node(a).unwrap().next(), Some(b));
        assert_eq!(tree.node(c).unwrap().previous(), Some(b));
        assert_eq!(tree.node(b).unwrap().parent(), Some(root));
        assert_eq!(tree.node(b).unwrap().root(), Some(root));
    }

    #[test]
    fn given_attached_node_when_adding_again_then_fails() {
        let mut tree = tree();
        let root = tree.root();
        let a = tree.create_node(Tag::Item, "a", NodeShape::Node, 1);
        tree.add(root, a).unwrap();

        assert_eq!(tree.add(root, a), Err(TreeError::NodeAlreadyAttached(a)));
    }

    #[test]
    fn given_root_when_adding_under_itself_then_fails() {
        let mut tree = tree();
        let root = tree.root();
        assert_eq!(tree.add(root, root), Err(TreeError::NodeAlreadyAttached(root)));
    }

    #[test]
    fn given_free_standing_subtree_when_adding_its_top_below_itself_then_detects_cycle() {
        let mut tree = tree();
        let top = tree.create_node(Tag::Item, "top", NodeShape::Collection, 1);
        let inner = tree.create_node(Tag::Item, "inner", NodeShape::Collection, 2);
        tree.add(top, inner).unwrap();

        assert_eq!(tree.add(inner, top), Err(TreeError::CycleDetected(top)));
    }

    #[test]
    fn given_subtree_built_bottom_up_when_attaching_then_root_propagates() {
        let mut tree = tree();
        let root = tree.root();
        let top = tree.create_node(Tag::Item, "top", NodeShape::Collection, 1);
        let leaf = tree.create_node(Tag::Item, "leaf", NodeShape::Node, 2);
        tree.add(top, leaf).unwrap();
        assert_eq!(tree.node(leaf).unwrap().root(), None);

        tree.add(root, top).unwrap();

        assert_eq!(tree.node(leaf).unwrap().root(), Some(root));
    }

    #[test]
    fn given_occupied_container_when_adding_then_fails_and_keeps_child() {
        let mut tree = tree();
        let root = tree.root();
        let slot = tree.create_node(Tag::Slot, "slot", NodeShape::Container, 0);
        tree.add(root, slot).unwrap();
        let first = tree.create_node(Tag::Item, "first", NodeShape::Node, 1);
        let second = tree.create_node(Tag::Item, "second", NodeShape::Node, 2);
        tree.add(slot, first).unwrap();

        assert_eq!(tree.add(slot, second), Err(TreeError::ChildSlotOccupied(slot)));
        assert_eq!(tree.node(slot).unwrap().first_child(), Some(first));
        assert!(!tree.node(second).unwrap().is_attached());
    }

    #[test]
    fn given_leaf_when_adding_then_not_a_container() {
        let mut tree = tree();
        let leaf = tree.create_node(Tag::Item, "leaf", NodeShape::Node, 0);
        let other = tree.create_node(Tag::Item, "other", NodeShape::Node, 0);
        assert_eq!(tree.add(leaf, other), Err(TreeError::NotAContainer(leaf)));
    }

    #[test]
    fn given_batch_with_duplicate_when_adding_many_then_nothing_attached() {
        let mut tree = tree();
        let root = tree.root();
        let a = tree.create_node(Tag::Item, "a", NodeShape::Node, 1);

        assert_eq!(tree.add_many(root, [a, a]), Err(TreeError::DuplicateInBatch(a)));
        assert_eq!(tree.node(root).unwrap().first_child(), None);
        assert!(!tree.node(a).unwrap().is_attached());
    }

    #[test]
    fn given_container_child_when_replacing_then_new_inherits_links() {
        let mut tree = tree();
        let root = tree.root();
        let slot = tree.create_node(Tag::Slot, "slot", NodeShape::Container, 0);
        tree.add(root, slot).unwrap();
        let old = tree.create_node(Tag::Item, "old", NodeShape::Node, 1);
        tree.add(slot, old).unwrap();
        let new = tree.create_node(Tag::Item, "new", NodeShape::Node, 2);

        tree.replace(slot, old, new).unwrap();

        let new_ref = tree.node(new).unwrap();
        assert_eq!(new_ref.parent(), Some(slot));
        assert_eq!(new_ref.root(), Some(root));
        assert_eq!(tree.node(slot).unwrap().first_child(), Some(new));
        assert_eq!(tree.node(old).err(), Some(TreeError::UnknownNode(old)));
    }

    #[test]
    fn given_container_when_removing_other_node_then_not_a_child() {
        let mut tree = tree();
        let root = tree.root();
        let slot = tree.create_node(Tag::Slot, "slot", NodeShape::Container, 0);
        tree.add(root, slot).unwrap();
        let stranger = tree.create_node(Tag::Item, "stranger", NodeShape::Node, 0);

        assert_eq!(
            tree.remove(slot, stranger),
            Err(TreeError::NotAChild {
                container: slot,
                node: stranger
            })
        );
    }

    #[test]
    fn given_removed_subtree_when_looking_up_descendant_then_unknown() {
        let mut tree = tree();
        let root = tree.root();
        let parent = tree.create_node(Tag::Item, "parent", NodeShape::Collection, 0);
        let child = tree.create_node(Tag::Item, "child", NodeShape::Node, 0);
        tree.add(root, parent).unwrap();
        tree.add(parent, child).unwrap();
        tree.attach_attribute(child, "k", "v").unwrap();

        tree.remove(root, parent).unwrap();

        assert!(!tree.contains(child));
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.attributes.len(), 0);
    }

    #[test]
    fn given_other_tree_handle_when_adding_then_foreign_node() {
        let mut first = tree();
        let mut second = tree();
        let foreign = second.create_node(Tag::Item, "x", NodeShape::Node, 0);
        let root = first.root();

        assert_eq!(first.add(root, foreign), Err(TreeError::ForeignNode(foreign)));
        assert!(second.add(second.root(), foreign).is_ok());
    }

    #[test]
    fn given_empty_name_when_creating_attribute_then_fails() {
        let mut tree = tree();
        assert_eq!(
            tree.create_attribute("", 1u32).err(),
            Some(TreeError::EmptyAttributeName)
        );
    }

    #[test]
    fn given_attached_attribute_when_adding_to_other_node_then_fails() {
        let mut tree = tree();
        let root = tree.root();
        let other = tree.create_node(Tag::Item, "other", NodeShape::Node, 0);
        let attribute = tree.attach_attribute(root, "k", "v").unwrap();

        assert_eq!(
            tree.add_attribute(other, attribute),
            Err(TreeError::AttributeAlreadyAttached(attribute))
        );
        assert_eq!(tree.attributes(other).count(), 0);
    }
}
