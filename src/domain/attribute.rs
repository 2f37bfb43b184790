use std::any::Any;
use std::fmt;

use generational_arena::Arena;

use crate::domain::arena::{AttributeId, NodeId};

/// Value stored in a node attribute.
///
/// Any `'static` displayable type qualifies; readers get the concrete type
/// back through [`AttributeRef::downcast`].
pub trait AttributeValue: Any + fmt::Display {
    fn as_any(&self) -> &dyn Any;
}

impl<A: Any + fmt::Display> AttributeValue for A {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) struct AttributeData {
    pub(super) name: String,
    pub(super) value: Box<dyn AttributeValue>,
    pub(super) owner: Option<NodeId>,
    pub(super) previous: Option<AttributeId>,
    pub(super) next: Option<AttributeId>,
}

impl AttributeData {
    pub(super) fn new(name: String, value: Box<dyn AttributeValue>) -> Self {
        Self {
            name,
            value,
            owner: None,
            previous: None,
            next: None,
        }
    }

    pub(super) fn is_attached(&self) -> bool {
        self.owner.is_some() || self.previous.is_some() || self.next.is_some()
    }
}

impl fmt::Debug for AttributeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeData")
            .field("name", &self.name)
            .field("value", &self.value.to_string())
            .field("owner", &self.owner)
            .finish()
    }
}

/// Read-only view of an attribute.
#[derive(Clone, Copy)]
pub struct AttributeRef<'a> {
    id: AttributeId,
    data: &'a AttributeData,
}

impl<'a> AttributeRef<'a> {
    pub(super) fn new(id: AttributeId, data: &'a AttributeData) -> Self {
        Self { id, data }
    }

    pub fn id(&self) -> AttributeId {
        self.id
    }

    pub fn name(&self) -> &'a str {
        &self.data.name
    }

    pub fn value(&self) -> &'a dyn AttributeValue {
        &*self.data.value
    }

    /// The value as `A`, if that is what was stored.
    pub fn downcast<A: Any>(&self) -> Option<&'a A> {
        (*self.data.value).as_any().downcast_ref::<A>()
    }

    pub fn render(&self) -> String {
        self.data.value.to_string()
    }

    pub fn owner(&self) -> Option<NodeId> {
        self.data.owner
    }
}

impl fmt::Debug for AttributeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.data.name, self.data.value)
    }
}

/// Iterator over the attribute chain of one node.
pub struct AttributeChain<'a> {
    attributes: &'a Arena<AttributeData>,
    next: Option<AttributeId>,
}

impl<'a> AttributeChain<'a> {
    pub(super) fn new(attributes: &'a Arena<AttributeData>, first: Option<AttributeId>) -> Self {
        Self {
            attributes,
            next: first,
        }
    }
}

impl Clone for AttributeChain<'_> {
    fn clone(&self) -> Self {
        Self {
            attributes: self.attributes,
            next: self.next,
        }
    }
}

impl<'a> Iterator for AttributeChain<'a> {
    type Item = AttributeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let data = self.attributes.get(id.index)?;
        self.next = data.next;
        Some(AttributeRef::new(id, data))
    }
}
